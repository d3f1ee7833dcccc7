//! Gateway configuration.
//!
//! Loaded once at process start from a TOML file and then passed explicitly to
//! every component that needs it. Every section has defaults, so an absent
//! file is a valid configuration.
//!
//! ```toml
//! [server]
//! bind = "127.0.0.1:8000"
//! cors_origins = ["*"]
//!
//! [catalog]
//! sqlite_path = "data/dbq-catalog.sqlite"
//!
//! [upstream]
//! connect_timeout_secs = 10
//! statement_timeout_secs = 30
//!
//! [logging]
//! filter = "info"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs};
use thiserror::Error;

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "DBQ_CONFIG";
/// Overrides `server.bind`.
pub const BIND_ENV: &str = "DBQ_BIND";
/// Overrides `catalog.sqlite_path`.
pub const SQLITE_PATH_ENV: &str = "DBQ_SQLITE_PATH";

const DEFAULT_CONFIG_FILE: &str = "dbq.toml";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub upstream: UpstreamLimits,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address, e.g. "127.0.0.1:8000"
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Allowed CORS origins. `"*"` allows any origin.
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

fn default_bind() -> String {
    "127.0.0.1:8000".to_string()
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            cors_origins: default_cors_origins(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Path to the SQLite file holding connections and table metadata.
    #[serde(default = "default_sqlite_path")]
    pub sqlite_path: String,
}

fn default_sqlite_path() -> String {
    "data/dbq-catalog.sqlite".to_string()
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            sqlite_path: default_sqlite_path(),
        }
    }
}

/// Bounds applied to every upstream connection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct UpstreamLimits {
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Per-statement deadline for introspection and user queries.
    #[serde(default = "default_statement_timeout")]
    pub statement_timeout_secs: u64,
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_statement_timeout() -> u64 {
    30
}

impl Default for UpstreamLimits {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout(),
            statement_timeout_secs: default_statement_timeout(),
        }
    }
}

impl UpstreamLimits {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn statement_timeout(&self) -> Duration {
        Duration::from_secs(self.statement_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

impl GatewayConfig {
    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, `DBQ_CONFIG` is consulted and
    /// then `./dbq.toml`; if neither names an existing file the defaults are
    /// used. Environment overrides are applied last.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut cfg = match explicit {
            Some(path) => Self::from_file(path)?,
            None => {
                let path = env::var(CONFIG_PATH_ENV)
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));
                if path.exists() {
                    Self::from_file(&path)?
                } else {
                    Self::default()
                }
            }
        };
        cfg.apply_overrides(|key| env::var(key).ok());
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    /// Apply `DBQ_*` overrides using the given lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bind) = lookup(BIND_ENV).filter(|v| !v.trim().is_empty()) {
            self.server.bind = bind;
        }
        if let Some(path) = lookup(SQLITE_PATH_ENV).filter(|v| !v.trim().is_empty()) {
            self.catalog.sqlite_path = path;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.catalog.sqlite_path.trim().is_empty() {
            return Err(ConfigError::Invalid("catalog.sqlite_path is empty".into()));
        }
        if self.upstream.statement_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "upstream.statement_timeout_secs must be positive".into(),
            ));
        }
        if self.upstream.connect_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "upstream.connect_timeout_secs must be positive".into(),
            ));
        }
        Ok(())
    }
}
