use std::path::PathBuf;

use anyhow::{Context, Result};

use soccer_analytics::analysis::Analytics;
use soccer_analytics::bundle::global_bundle;
use soccer_analytics::config::{AppConfig, arg_value};
use soccer_analytics::dataset::{InMemoryStore, SqliteStore, load_dump};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let mut config = AppConfig::from_env()?;
    config.apply_args(&args)?;

    let home = arg_value(&args, "--home").context("missing --home <team long name>")?;
    let away = arg_value(&args, "--away").context("missing --away <team long name>")?;
    let bundle = global_bundle(&config.model_path)?;

    let prediction = if let Some(dump_path) = arg_value(&args, "--dataset") {
        let store = InMemoryStore::from_dump(load_dump(&PathBuf::from(dump_path))?);
        Analytics::new(&store).predict(bundle, &home, &away)?
    } else {
        let store = SqliteStore::open(&config.db_path)?;
        Analytics::new(&store).predict(bundle, &home, &away)?
    };

    let json = serde_json::to_string_pretty(&prediction).context("serialize prediction")?;
    println!("{json}");
    Ok(())
}
