use crate::history::DEFAULT_EXPECTED_PER_WEEK;
use std::{env, path::PathBuf};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_WINDOW_DAYS: i64 = 90;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_path: PathBuf,
    pub window_days: i64,
    pub expected_per_week: u32,
}

impl Config {
    /// Reads `PORT`, `APP_DATA_PATH`, `WINDOW_DAYS` and `EXPECTED_PER_WEEK`.
    /// Missing or unparsable values keep their defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: parse_var("PORT").unwrap_or(defaults.port),
            data_path: env::var("APP_DATA_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_path),
            window_days: parse_var("WINDOW_DAYS")
                .filter(|days: &i64| *days > 0)
                .unwrap_or(defaults.window_days),
            expected_per_week: parse_var("EXPECTED_PER_WEEK")
                .unwrap_or(defaults.expected_per_week),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            data_path: PathBuf::from("data/attendance.json"),
            window_days: DEFAULT_WINDOW_DAYS,
            expected_per_week: DEFAULT_EXPECTED_PER_WEEK,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|value| value.trim().parse::<T>().ok())
}
