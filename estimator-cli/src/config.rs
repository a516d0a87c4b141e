//! Optional `estimator.toml` configuration.
//!
//! ```toml
//! locale = "es"
//! log_level = "info"
//! log_file = "estimator.log"
//! store_timeout_secs = 10
//!
//! [database]
//! backend = "sqlite"
//! connection_string = "sqlite:estimator.db?mode=rwc"
//! ```
//!
//! Every key is optional. Command-line flags win over file values.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use estimator_core::Locale;
use estimator_core::db::DbConfig;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

pub const CONFIG_ENV: &str = "ESTIMATOR_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "estimator.toml";
pub const DEFAULT_DATABASE_URL: &str = "sqlite:estimator.db?mode=rwc";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub locale: Locale,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
    pub store_timeout_secs: u64,
    pub database: DbConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            locale: Locale::Es,
            log_level: "info".to_string(),
            log_file: None,
            store_timeout_secs: 10,
            database: DbConfig {
                backend: "sqlite".to_string(),
                connection_string: DEFAULT_DATABASE_URL.to_string(),
            },
        }
    }
}

/// Values given on the command line; `None` keeps the file value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub backend: Option<String>,
    pub db: Option<String>,
    pub locale: Option<Locale>,
    pub log_level: Option<String>,
}

impl AppConfig {
    pub fn parse(
        text: &str,
        path: &Path,
    ) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reads `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(text) => {
                debug!(path = %path.display(), "loaded config file");
                Self::parse(&text, path)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn with_overrides(
        mut self,
        overrides: Overrides,
    ) -> Self {
        if let Some(backend) = overrides.backend {
            self.database.backend = backend;
        }
        if let Some(db) = overrides.db {
            self.database.connection_string = db;
        }
        if let Some(locale) = overrides.locale {
            self.locale = locale;
        }
        if let Some(level) = overrides.log_level {
            self.log_level = level;
        }
        self
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn parse(text: &str) -> Result<AppConfig, ConfigError> {
        AppConfig::parse(text, Path::new("estimator.toml"))
    }

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(parse("").unwrap(), AppConfig::default());
    }

    #[test]
    fn full_file_is_read() {
        let config = parse(
            r#"
            locale = "en"
            log_level = "debug"
            log_file = "logs/estimator.log"
            store_timeout_secs = 3

            [database]
            backend = "memory"
            connection_string = ""
            "#,
        )
        .unwrap();

        assert_eq!(config.locale, Locale::En);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.log_file, Some(PathBuf::from("logs/estimator.log")));
        assert_eq!(config.store_timeout(), Duration::from_secs(3));
        assert_eq!(config.database.backend, "memory");
    }

    #[test]
    fn unknown_locale_is_a_parse_error() {
        let result = parse(r#"locale = "fr""#);

        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn unknown_key_is_a_parse_error() {
        assert!(parse("colour = true").is_err());
    }

    #[test]
    fn missing_file_gives_defaults() {
        let config = AppConfig::load(Path::new("/nonexistent/estimator.toml")).unwrap();

        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn overrides_win_over_file_values() {
        let config = parse("locale = \"en\"\n[database]\nbackend = \"sqlite\"\n")
            .unwrap()
            .with_overrides(Overrides {
                backend: Some("memory".to_string()),
                db: None,
                locale: Some(Locale::Es),
                log_level: Some("warn".to_string()),
            });

        assert_eq!(config.locale, Locale::Es);
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.database.backend, "memory");
    }

    #[test]
    fn zero_timeout_is_clamped() {
        let config = parse("store_timeout_secs = 0").unwrap();

        assert_eq!(config.store_timeout(), Duration::from_secs(1));
    }
}
