use std::path::PathBuf;

use anyhow::Result;

use soccer_analytics::analysis::Analytics;
use soccer_analytics::bundle::{ModelBundle, save_bundle};
use soccer_analytics::config::{AppConfig, arg_value, has_flag};
use soccer_analytics::dataset::{InMemoryStore, MatchStore, SqliteStore, TeamStore, load_dump};
use soccer_analytics::features::TrainingTable;
use soccer_analytics::training::{TrainingConfig, TrainingOutcome, train_and_select};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let mut config = AppConfig::from_env()?;
    config.apply_args(&args)?;
    let with_form = !has_flag(&args, "--no-form");

    let table = if let Some(dump_path) = arg_value(&args, "--dataset") {
        let store = InMemoryStore::from_dump(load_dump(&PathBuf::from(dump_path))?);
        build_table(&store, with_form)?
    } else {
        let store = SqliteStore::open(&config.db_path)?;
        build_table(&store, with_form)?
    };
    println!(
        "Examples: {} ({} matches skipped without attributes)",
        table.len(),
        table.skipped
    );

    let training = TrainingConfig {
        test_fraction: config.test_fraction,
        seed: config.seed,
        ..TrainingConfig::default()
    };
    let outcome = train_and_select(&table, &training)?;
    print_report(&outcome);

    let bundle = ModelBundle::from_training(outcome);
    save_bundle(&bundle, &config.model_path)?;
    println!("Model: {}", config.model_path.display());
    Ok(())
}

fn build_table<S: MatchStore + TeamStore>(store: &S, with_form: bool) -> Result<TrainingTable> {
    Ok(Analytics::new(store).training_table(with_form)?)
}

fn print_report(outcome: &TrainingOutcome) {
    println!(
        "Train/test: {}/{}",
        outcome.train_samples, outcome.test_samples
    );
    for candidate in &outcome.candidates {
        println!(
            "{:<20} accuracy {:.4}",
            candidate.model_name, candidate.evaluation.accuracy
        );
    }
    println!("Selected: {}", outcome.model_name());

    println!();
    println!("{:<10} {:>9} {:>9} {:>9} {:>8}", "class", "precision", "recall", "f1", "support");
    for class in &outcome.evaluation.per_class {
        println!(
            "{:<10} {:>9.3} {:>9.3} {:>9.3} {:>8}",
            class.label, class.precision, class.recall, class.f1, class.support
        );
    }

    println!();
    println!("Confusion (rows true, cols predicted: away, draw, home)");
    for row in &outcome.evaluation.confusion {
        println!("  {:>6} {:>6} {:>6}", row[0], row[1], row[2]);
    }

    println!();
    println!("Feature importances");
    for item in outcome.importances.iter().take(10) {
        println!("  {:<28} {:.4}", item.feature, item.importance);
    }
}
