//! Configuration loading and typed config structures for the move relay.
//!
//! The configuration lives in `moverelay-config.yaml` (or the file named
//! by `MOVERELAY_CONFIG`). Every field has a default, so an absent file
//! or an empty document yields a working file-backed relay on port 8080.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use moverelay_store::{FileLogStore, LogStore, MemoryLogStore, StoreError};
use serde::Deserialize;

use crate::server::ServerConfig;

/// Config file read when `MOVERELAY_CONFIG` is unset.
pub const DEFAULT_CONFIG_PATH: &str = "moverelay-config.yaml";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// An environment override holds an unusable value.
    #[error("invalid value for {var}: '{value}': {source}")]
    InvalidOverride {
        /// The environment variable name.
        var: &'static str,
        /// The rejected value.
        value: String,
        /// Why the value did not parse.
        source: std::num::ParseIntError,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level relay configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RelayConfig {
    /// Listener settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Ledger storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl RelayConfig {
    /// Load configuration the way the server binary does.
    ///
    /// Reads the file named by `MOVERELAY_CONFIG`, falling back to
    /// [`DEFAULT_CONFIG_PATH`]; a missing default file means defaults.
    /// Environment overrides are applied last.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a named file is unreadable, the YAML is
    /// invalid, or an override is malformed.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var("MOVERELAY_CONFIG") {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => {
                let path = Path::new(DEFAULT_CONFIG_PATH);
                if path.exists() {
                    Self::from_file(path)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_overrides(|var| std::env::var(var).ok())?;
        Ok(config)
    }

    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Apply overrides from an environment-like lookup:
    ///
    /// - `MOVERELAY_HOST` overrides `server.host`
    /// - `MOVERELAY_PORT` overrides `server.port`
    /// - `MOVERELAY_DATA_DIR` sets `storage.ledger_dir` to `<dir>/ledgers`
    ///   and `storage.snapshot_dir` to `<dir>/snapshots`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOverride`] if the port does not parse.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(host) = lookup("MOVERELAY_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("MOVERELAY_PORT") {
            self.server.port = port
                .trim()
                .parse::<u16>()
                .map_err(|source| ConfigError::InvalidOverride {
                    var: "MOVERELAY_PORT",
                    value: port.clone(),
                    source,
                })?;
        }
        if let Some(dir) = lookup("MOVERELAY_DATA_DIR") {
            let dir = PathBuf::from(dir);
            self.storage.ledger_dir = dir.join("ledgers");
            self.storage.snapshot_dir = dir.join("snapshots");
        }
        Ok(())
    }
}

/// Which [`LogStore`] implementation backs the relay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// One JSON file per username on local disk.
    #[default]
    File,
    /// Process memory; everything is lost on exit.
    Memory,
}

/// Ledger storage configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StorageConfig {
    /// Backend selection.
    #[serde(default)]
    pub backend: StorageBackend,

    /// Directory of live ledger files (file backend).
    #[serde(default = "default_ledger_dir")]
    pub ledger_dir: PathBuf,

    /// Directory of snapshot copies (file backend).
    #[serde(default = "default_snapshot_dir")]
    pub snapshot_dir: PathBuf,
}

impl StorageConfig {
    /// Construct the configured store.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the file backend cannot create its
    /// directories.
    pub fn open_store(&self) -> Result<Arc<dyn LogStore>, StoreError> {
        match self.backend {
            StorageBackend::File => Ok(Arc::new(FileLogStore::open(
                &self.ledger_dir,
                &self.snapshot_dir,
            )?)),
            StorageBackend::Memory => Ok(Arc::new(MemoryLogStore::new())),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            ledger_dir: default_ledger_dir(),
            snapshot_dir: default_snapshot_dir(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_ledger_dir() -> PathBuf {
    PathBuf::from("data/ledgers")
}

fn default_snapshot_dir() -> PathBuf {
    PathBuf::from("data/snapshots")
}

fn default_log_level() -> String {
    "info".to_owned()
}
