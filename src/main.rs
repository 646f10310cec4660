use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use serde::Serialize;

use soccer_analytics::analysis::Analytics;
use soccer_analytics::appearances::DEFAULT_APPEARANCE_LIMIT;
use soccer_analytics::config::{AppConfig, arg_value};
use soccer_analytics::dataset::{InMemoryStore, MatchStore, SqliteStore, TeamStore, load_dump};

const USAGE: &str = "usage: soccer_analytics <command> [flags]

commands:
  summary                                   dataset counts, leagues and seasons
  standings    --league L --season S        points table with top scorer and best defence
  home-away    --league L --season S        home/away splits
  scoring      --league L --season S        attack and defence rankings
  players      --league L --season S [--limit N]
  form         --team T --league L --season S [--window N]
  league-form  --league L --season S [--window N]
  head-to-head --team1 A --team2 B [--league L]
  correlation  --league L --season S        rating gap vs result

flags:
  --db PATH         SQLite match store (default: SOCCER_DB_PATH or the cache dir)
  --dataset PATH    read a JSON dump instead of the SQLite store";

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let Some(command) = args.first().cloned() else {
        println!("{USAGE}");
        return Ok(());
    };
    if command == "--help" || command == "-h" {
        println!("{USAGE}");
        return Ok(());
    }

    let mut config = AppConfig::from_env()?;
    config.apply_args(&args)?;

    if let Some(dump_path) = arg_value(&args, "--dataset") {
        let dump = load_dump(&PathBuf::from(dump_path))?;
        let store = InMemoryStore::from_dump(dump);
        run(&command, &args, &config, &store)
    } else {
        let store = SqliteStore::open(&config.db_path)?;
        run(&command, &args, &config, &store)
    }
}

fn required(args: &[String], flag: &str) -> Result<String> {
    arg_value(args, flag).with_context(|| format!("missing {flag}\n\n{USAGE}"))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("serialize result")?;
    println!("{json}");
    Ok(())
}

fn run<S: MatchStore + TeamStore>(
    command: &str,
    args: &[String],
    config: &AppConfig,
    store: &S,
) -> Result<()> {
    let analytics = Analytics::new(store);
    match command {
        "summary" => print_json(&analytics.dataset_summary()?),
        "standings" => {
            let (league, season) = (required(args, "--league")?, required(args, "--season")?);
            print_json(&analytics.team_standings(&league, &season)?)
        }
        "home-away" => {
            let (league, season) = (required(args, "--league")?, required(args, "--season")?);
            print_json(&analytics.home_away(&league, &season)?)
        }
        "scoring" => {
            let (league, season) = (required(args, "--league")?, required(args, "--season")?);
            print_json(&analytics.scoring_profile(&league, &season)?)
        }
        "players" => {
            let (league, season) = (required(args, "--league")?, required(args, "--season")?);
            let limit = match arg_value(args, "--limit") {
                Some(raw) => raw.parse().with_context(|| format!("bad --limit {raw:?}"))?,
                None => DEFAULT_APPEARANCE_LIMIT,
            };
            print_json(&analytics.player_appearances(&league, &season, limit)?)
        }
        "form" => {
            let team = required(args, "--team")?;
            let (league, season) = (required(args, "--league")?, required(args, "--season")?);
            print_json(&analytics.team_form(&team, &league, &season, config.form_window)?)
        }
        "league-form" => {
            let (league, season) = (required(args, "--league")?, required(args, "--season")?);
            print_json(&analytics.league_form(&league, &season, config.form_window)?)
        }
        "head-to-head" => {
            let (team1, team2) = (required(args, "--team1")?, required(args, "--team2")?);
            let league = arg_value(args, "--league");
            print_json(&analytics.head_to_head(&team1, &team2, league.as_deref())?)
        }
        "correlation" => {
            let (league, season) = (required(args, "--league")?, required(args, "--season")?);
            print_json(&analytics.rating_correlation(&league, &season)?)
        }
        other => Err(anyhow!("unknown command {other:?}\n\n{USAGE}")),
    }
}
