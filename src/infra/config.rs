//! Centralized configuration (environment variables + defaults).

use std::path::PathBuf;
use thiserror::Error;

/// Pool size used when `DB_MAX_CONNECTIONS` is unset.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// Which backing store a process talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreKind {
    Memory,
    Postgres { database_url: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub kind: StoreKind,
    pub max_connections: u32,
    /// JSON class definitions to load at startup.
    pub schema_path: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            kind: StoreKind::Memory,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            schema_path: None,
        }
    }
}

impl StoreConfig {
    /// Reads `BO_STORE`, `DATABASE_URL`, `DB_MAX_CONNECTIONS` and
    /// `BO_SCHEMA_PATH`, after loading a `.env` file if one exists.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let kind = match lookup("BO_STORE").as_deref().map(str::trim) {
            None | Some("") | Some("memory") => StoreKind::Memory,
            Some("postgres") => StoreKind::Postgres {
                database_url: lookup("DATABASE_URL")
                    .filter(|v| !v.is_empty())
                    .ok_or(ConfigError::Missing("DATABASE_URL"))?,
            },
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "BO_STORE",
                    value: other.to_string(),
                })
            }
        };

        let max_connections = match lookup("DB_MAX_CONNECTIONS") {
            None => DEFAULT_MAX_CONNECTIONS,
            Some(v) => v
                .parse::<u32>()
                .map_err(|_| ConfigError::Invalid {
                    name: "DB_MAX_CONNECTIONS",
                    value: v.clone(),
                })?
                .max(1),
        };

        Ok(Self {
            kind,
            max_connections,
            schema_path: lookup("BO_SCHEMA_PATH")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_to_memory_store() {
        let config = StoreConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, StoreConfig::default());
    }

    #[test]
    fn postgres_requires_database_url() {
        let err = StoreConfig::from_lookup(lookup(&[("BO_STORE", "postgres")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("DATABASE_URL")));

        let config = StoreConfig::from_lookup(lookup(&[
            ("BO_STORE", "postgres"),
            ("DATABASE_URL", "postgres://localhost/bo"),
            ("DB_MAX_CONNECTIONS", "12"),
        ]))
        .unwrap();
        assert_eq!(config.max_connections, 12);
        assert!(matches!(config.kind, StoreKind::Postgres { .. }));
    }

    #[test]
    fn rejects_unknown_store_and_bad_pool_size() {
        assert!(StoreConfig::from_lookup(lookup(&[("BO_STORE", "mysql")])).is_err());
        assert!(StoreConfig::from_lookup(lookup(&[("DB_MAX_CONNECTIONS", "many")])).is_err());
    }
}
