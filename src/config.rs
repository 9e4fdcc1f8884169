//! Configuration file loading
//!
//! ```yaml
//! database: /srv/idr/metadata.db
//! log: info
//! pretty: false
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// SQLite metadata database; defaults to the user data directory
    pub database: Option<PathBuf>,
    /// Log filter used when RUST_LOG is unset
    pub log: String,
    /// Pretty-print JSON responses
    pub pretty: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: None,
            log: "warn".to_string(),
            pretty: true,
        }
    }
}

impl Config {
    pub fn from_yaml(text: &str) -> ConfigResult<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text)
    }

    /// Configured database path, or the default one
    pub fn database_path(&self) -> PathBuf {
        self.database.clone().unwrap_or_else(default_db_path)
    }
}

/// Default database path (~/.local/share/idr-graphql/metadata.db)
pub fn default_db_path() -> PathBuf {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"));
    data_dir.join("idr-graphql").join("metadata.db")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_when_empty() {
        let config = Config::from_yaml("{}").unwrap();
        assert_eq!(config, Config::default());
        assert!(config.database_path().ends_with("idr-graphql/metadata.db"));
    }

    #[test]
    fn test_partial_override() {
        let config = Config::from_yaml("database: /tmp/x.db\npretty: false\n").unwrap();
        assert_eq!(config.database_path(), PathBuf::from("/tmp/x.db"));
        assert!(!config.pretty);
        assert_eq!(config.log, "warn");
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = Config::from_yaml("databse: /tmp/x.db\n").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "log: debug").unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.log, "debug");
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load("/nonexistent/idr-graphql.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
