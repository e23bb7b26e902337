//! Process configuration read from the environment (optionally via `.env`).

use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::blockchain::{DEFAULT_DIFFICULTY, MAX_HASH_DIFFICULTY};
use crate::ledger::DEFAULT_TOP_UP_AMOUNT;
use crate::storage::MAX_STORED_AMOUNT;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}")]
    Invalid { key: &'static str, value: String },
    #[error("{key} must be at most {max}, got {value}")]
    OutOfRange {
        key: &'static str,
        value: u64,
        max: u64,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// `:memory:` selects a throwaway in-memory database.
    pub database_path: String,
    pub genesis_difficulty: u32,
    pub top_up_amount: u64,
    /// Highest difficulty the REST layer lets a caller request.
    pub max_difficulty: u32,
    pub mining_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            database_path: "ledger.db".to_string(),
            genesis_difficulty: DEFAULT_DIFFICULTY,
            top_up_amount: DEFAULT_TOP_UP_AMOUNT,
            max_difficulty: 6,
            mining_timeout: Duration::from_secs(30),
        }
    }
}

impl Config {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Missing keys fall back
    /// to defaults; present but unparsable keys are errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let config = Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse(&lookup, "PORT", defaults.port)?,
            database_path: lookup("DATABASE_PATH").unwrap_or(defaults.database_path),
            genesis_difficulty: parse(&lookup, "GENESIS_DIFFICULTY", defaults.genesis_difficulty)?,
            top_up_amount: parse(&lookup, "TOP_UP_AMOUNT", defaults.top_up_amount)?,
            max_difficulty: parse(&lookup, "MAX_DIFFICULTY", defaults.max_difficulty)?,
            mining_timeout: Duration::from_secs(parse(
                &lookup,
                "MINING_TIMEOUT_SECS",
                defaults.mining_timeout.as_secs(),
            )?),
        };

        for (key, value) in [
            ("GENESIS_DIFFICULTY", config.genesis_difficulty),
            ("MAX_DIFFICULTY", config.max_difficulty),
        ] {
            if value > MAX_HASH_DIFFICULTY {
                return Err(ConfigError::OutOfRange {
                    key,
                    value: value.into(),
                    max: MAX_HASH_DIFFICULTY.into(),
                });
            }
        }

        // Balances are stored as SQLite INTEGER (signed 64-bit).
        if config.top_up_amount > MAX_STORED_AMOUNT {
            return Err(ConfigError::OutOfRange {
                key: "TOP_UP_AMOUNT",
                value: config.top_up_amount,
                max: MAX_STORED_AMOUNT,
            });
        }

        Ok(config)
    }
}

fn parse<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let cfg = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.genesis_difficulty, 4);
        assert_eq!(cfg.top_up_amount, 1000);
    }

    #[test]
    fn values_override_defaults() {
        let cfg = Config::from_lookup(lookup_from(&[
            ("HOST", "0.0.0.0"),
            ("PORT", "9000"),
            ("DATABASE_PATH", ":memory:"),
            ("TOP_UP_AMOUNT", " 250 "),
            ("MINING_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.database_path, ":memory:");
        assert_eq!(cfg.top_up_amount, 250);
        assert_eq!(cfg.mining_timeout, Duration::from_secs(5));
    }

    #[test]
    fn unparsable_value_is_an_error() {
        let err = Config::from_lookup(lookup_from(&[("PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "PORT", .. }));
    }

    #[test]
    fn difficulty_beyond_hash_length_is_rejected() {
        let err = Config::from_lookup(lookup_from(&[("MAX_DIFFICULTY", "65")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::OutOfRange { key: "MAX_DIFFICULTY", value: 65, .. }
        ));
    }

    #[test]
    fn top_up_beyond_storable_range_is_rejected() {
        let too_big = (i64::MAX as u64 + 1).to_string();
        let err = Config::from_lookup(lookup_from(&[("TOP_UP_AMOUNT", &too_big)])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::OutOfRange { key: "TOP_UP_AMOUNT", max, .. } if max == i64::MAX as u64
        ));

        let max = i64::MAX.to_string();
        let cfg = Config::from_lookup(lookup_from(&[("TOP_UP_AMOUNT", &max)])).unwrap();
        assert_eq!(cfg.top_up_amount, i64::MAX as u64);
    }
}
