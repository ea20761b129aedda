//! Application configuration
//!
//! Resolution order: built-in defaults, then an optional TOML file, then
//! `REMINDER_*` environment variables.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{ExError, ExErrorKind, ReminderError, Result};
use crate::logging_facility::Profile;

pub const ENV_DB_PATH: &str = "REMINDER_DB_PATH";
pub const ENV_DB_POOL_SIZE: &str = "REMINDER_DB_POOL_SIZE";
pub const ENV_LIST_DEFAULT_LIMIT: &str = "REMINDER_LIST_DEFAULT_LIMIT";
pub const ENV_LIST_MAX_LIMIT: &str = "REMINDER_LIST_MAX_LIMIT";
pub const ENV_LOG_PROFILE: &str = "REMINDER_LOG_PROFILE";

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub list: ListConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    /// Upper bound on open connections
    pub pool_size: usize,
    /// How long a call may wait for a free connection
    pub acquire_timeout_ms: u64,
    /// SQLite busy handler timeout per connection
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(".reminder/reminder.db"),
            pool_size: 4,
            acquire_timeout_ms: 5_000,
            busy_timeout_ms: 2_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ListConfig {
    /// Page size used when a caller does not pass one
    pub default_limit: i64,
    /// Requested page sizes above this are clamped
    pub max_limit: i64,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            default_limit: 20,
            max_limit: 1_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub profile: Profile,
}

impl AppConfig {
    /// Parse a TOML document; missing sections and keys keep their defaults
    ///
    /// # Errors
    ///
    /// `Config` when the document is not valid TOML or has unknown keys, or
    /// when the resulting values fail validation.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(raw).map_err(|e| {
            ExError::new(ExErrorKind::Config)
                .with_op("parse_config")
                .with_message(e.to_string())
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` when given (the file must exist), then apply the
    /// process environment
    ///
    /// # Errors
    ///
    /// `Config` for unreadable files, parse failures, and invalid values.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|e| {
                    ExError::new(ExErrorKind::Config)
                        .with_op("load_config")
                        .with_entity_id(path.display().to_string())
                        .with_message(e.to_string())
                })?;
                Self::from_toml_str(&raw)?
            }
            None => Self::default(),
        };
        config.apply_env(std::env::vars())?;
        Ok(config)
    }

    /// Overlay `REMINDER_*` variables; unrelated variables are ignored
    ///
    /// # Errors
    ///
    /// `Config` when a recognised variable has an unparsable value.
    pub fn apply_env<I>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            match key.as_str() {
                ENV_DB_PATH => self.database.path = PathBuf::from(value),
                ENV_DB_POOL_SIZE => self.database.pool_size = parse_env(&key, &value)?,
                ENV_LIST_DEFAULT_LIMIT => self.list.default_limit = parse_env(&key, &value)?,
                ENV_LIST_MAX_LIMIT => self.list.max_limit = parse_env(&key, &value)?,
                ENV_LOG_PROFILE => self.logging.profile = value.parse()?,
                _ => {}
            }
        }
        self.validate()
    }

    /// # Errors
    ///
    /// `Config` naming the first offending key.
    pub fn validate(&self) -> Result<()> {
        if self.database.pool_size == 0 {
            return Err(invalid("database.pool_size", "must be at least 1"));
        }
        if self.list.default_limit <= 0 {
            return Err(invalid("list.default_limit", "must be positive"));
        }
        if self.list.max_limit < self.list.default_limit {
            return Err(invalid("list.max_limit", "must not be below list.default_limit"));
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| invalid(key, &e.to_string()))
}

fn invalid(key: &str, reason: &str) -> ExError {
    ReminderError::InvalidConfig {
        key: key.to_string(),
        reason: reason.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.list.default_limit, 20);
        assert_eq!(config.database.pool_size, 4);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [database]
            path = "/tmp/r.db"

            [logging]
            profile = "production"
            "#,
        )
        .unwrap();
        assert_eq!(config.database.path, PathBuf::from("/tmp/r.db"));
        assert_eq!(config.database.pool_size, 4);
        assert_eq!(config.logging.profile, Profile::Production);
        assert_eq!(config.list, ListConfig::default());
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let err = AppConfig::from_toml_str("[database]\nhost = \"x\"\n").unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::Config);
    }

    #[test]
    fn test_env_overrides_file_values() {
        let mut config = AppConfig::default();
        config
            .apply_env(vars(&[
                (ENV_DB_POOL_SIZE, "8"),
                (ENV_LIST_DEFAULT_LIMIT, "5"),
                (ENV_LOG_PROFILE, "test"),
                ("PATH", "/usr/bin"),
            ]))
            .unwrap();
        assert_eq!(config.database.pool_size, 8);
        assert_eq!(config.list.default_limit, 5);
        assert_eq!(config.logging.profile, Profile::Test);
    }

    #[test]
    fn test_unparsable_env_value_names_the_key() {
        let mut config = AppConfig::default();
        let err = config
            .apply_env(vars(&[(ENV_DB_POOL_SIZE, "many")]))
            .unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::Config);
        assert_eq!(err.entity_id(), Some(ENV_DB_POOL_SIZE));
    }

    #[test]
    fn test_max_limit_below_default_is_invalid() {
        let err = AppConfig::from_toml_str("[list]\ndefault_limit = 50\nmax_limit = 10\n")
            .unwrap_err();
        assert_eq!(err.entity_id(), Some("list.max_limit"));
    }

    #[test]
    fn test_load_reads_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reminder.toml");
        std::fs::write(&path, "[list]\ndefault_limit = 7\n").unwrap();
        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.list.default_limit, 7);
    }

    #[test]
    fn test_load_missing_file_is_config_error() {
        let err = AppConfig::load(Some(Path::new("/nonexistent/reminder.toml"))).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::Config);
    }
}
