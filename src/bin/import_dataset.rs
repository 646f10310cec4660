use std::path::PathBuf;

use anyhow::{Context, Result};

use soccer_analytics::config::{AppConfig, arg_value};
use soccer_analytics::dataset::{SqliteStore, load_dump};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let mut config = AppConfig::from_env()?;
    config.apply_args(&args)?;

    let dump_path = arg_value(&args, "--dataset")
        .map(PathBuf::from)
        .context("missing --dataset <dump.json>")?;
    let dump = load_dump(&dump_path)?;

    let mut store = SqliteStore::open(&config.db_path)?;
    let summary = store.import_dump(&dump)?;

    println!("Import complete");
    println!("DB: {}", config.db_path.display());
    println!("Matches upserted: {}", summary.matches);
    println!("Lineup entries: {}", summary.lineup_entries);
    println!("Teams upserted: {}", summary.teams);
    println!("Attribute snapshots: {}", summary.attribute_snapshots);
    Ok(())
}
