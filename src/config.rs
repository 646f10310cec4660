use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::form::DEFAULT_FORM_WINDOW;
use crate::training::{DEFAULT_SEED, DEFAULT_TEST_FRACTION};

const CACHE_DIR: &str = "soccer_analytics";
const DEFAULT_MODEL_PATH: &str = "data/model/outcome_model.json";

/// Settings shared by the binaries. Command-line flags override these.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub model_path: PathBuf,
    pub form_window: usize,
    pub test_fraction: f64,
    pub seed: u64,
}

impl AppConfig {
    /// Reads `.env.local` then `.env` (first value wins), then the `SOCCER_*` variables.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::from_filename(".env.local");
        let _ = dotenvy::from_filename(".env");

        let db_path = match env_trimmed("SOCCER_DB_PATH") {
            Some(raw) => PathBuf::from(raw),
            None => app_cache_dir()
                .map(|dir| dir.join("soccer.sqlite"))
                .context("no SOCCER_DB_PATH and no cache directory (HOME unset)")?,
        };
        let model_path = env_trimmed("SOCCER_MODEL_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH));

        Ok(Self {
            db_path,
            model_path,
            form_window: parse_env("SOCCER_FORM_WINDOW")?.unwrap_or(DEFAULT_FORM_WINDOW),
            test_fraction: parse_env("SOCCER_TEST_FRACTION")?.unwrap_or(DEFAULT_TEST_FRACTION),
            seed: parse_env("SOCCER_SEED")?.unwrap_or(DEFAULT_SEED),
        })
    }

    /// Applies `--db`, `--model`, `--window`, `--test-fraction` and `--seed`.
    pub fn apply_args(&mut self, args: &[String]) -> Result<()> {
        if let Some(v) = arg_value(args, "--db") {
            self.db_path = PathBuf::from(v);
        }
        if let Some(v) = arg_value(args, "--model") {
            self.model_path = PathBuf::from(v);
        }
        if let Some(v) = arg_value(args, "--window") {
            self.form_window = v.parse().with_context(|| format!("bad --window {v:?}"))?;
        }
        if let Some(v) = arg_value(args, "--test-fraction") {
            self.test_fraction = v
                .parse()
                .with_context(|| format!("bad --test-fraction {v:?}"))?;
        }
        if let Some(v) = arg_value(args, "--seed") {
            self.seed = v.parse().with_context(|| format!("bad --seed {v:?}"))?;
        }
        Ok(())
    }
}

fn env_trimmed(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Result<Option<T>>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    env_trimmed(key)
        .map(|raw| raw.parse::<T>().with_context(|| format!("parse {key}={raw:?}")))
        .transpose()
}

/// `$XDG_CACHE_HOME/soccer_analytics`, falling back to `~/.cache/soccer_analytics`.
pub fn app_cache_dir() -> Option<PathBuf> {
    if let Some(base) = env_trimmed("XDG_CACHE_HOME") {
        return Some(PathBuf::from(base).join(CACHE_DIR));
    }
    let home = env_trimmed("HOME")?;
    Some(PathBuf::from(home).join(".cache").join(CACHE_DIR))
}

/// Value of `--flag=value` or `--flag value`.
pub fn arg_value(args: &[String], flag: &str) -> Option<String> {
    let prefix = format!("{flag}=");
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if let Some(v) = arg.strip_prefix(&prefix) {
            return Some(v.trim().to_string());
        }
        if arg == flag {
            return iter.next().map(|v| v.trim().to_string());
        }
    }
    None
}

pub fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}
