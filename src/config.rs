use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::calendar::DayLocale;
use crate::persistence::{JsonDirStateStore, MemoryStateStore, PersistenceError, StateStore};

const ENV_PREFIX: &str = "COURSE_PLANNER_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
    #[error(transparent)]
    Backend(#[from] PersistenceError),
}

/// Where state is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Memory,
    #[default]
    Json,
    Sqlite,
}

impl std::str::FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(BackendKind::Memory),
            "json" | "file" => Ok(BackendKind::Json),
            "sqlite" => Ok(BackendKind::Sqlite),
            other => Err(format!("unknown backend '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub backend: BackendKind,
    pub data_dir: PathBuf,
    pub sqlite_path: Option<PathBuf>,
    pub user_id: String,
    pub locale: DayLocale,
    pub http_addr: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Json,
            data_dir: PathBuf::from("data"),
            sqlite_path: None,
            user_id: "local".to_string(),
            locale: DayLocale::Turkish,
            http_addr: "127.0.0.1:3000".to_string(),
        }
    }
}

impl AppConfig {
    /// Defaults overridden by `COURSE_PLANNER_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_overrides(|key| env::var(format!("{ENV_PREFIX}{key}")).ok())
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply overrides from a key lookup (`BACKEND`, `DATA_DIR`, ...).
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("BACKEND") {
            self.backend = value
                .parse()
                .map_err(|message| ConfigError::Invalid { key: "BACKEND", message })?;
        }
        if let Some(value) = lookup("DATA_DIR") {
            self.data_dir = PathBuf::from(value);
        }
        if let Some(value) = lookup("SQLITE_PATH") {
            self.sqlite_path = Some(PathBuf::from(value));
        }
        if let Some(value) = lookup("USER_ID") {
            self.user_id = value;
        }
        if let Some(value) = lookup("LOCALE") {
            self.locale = value
                .parse()
                .map_err(|message| ConfigError::Invalid { key: "LOCALE", message })?;
        }
        if let Some(value) = lookup("HTTP_ADDR") {
            self.http_addr = value;
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.user_id.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "USER_ID",
                message: "must not be empty".into(),
            });
        }
        self.socket_addr()?;
        if self.backend == BackendKind::Sqlite && !cfg!(feature = "sqlite") {
            return Err(ConfigError::Invalid {
                key: "BACKEND",
                message: "sqlite backend requires the `sqlite` feature".into(),
            });
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.http_addr.parse::<SocketAddr>().map_err(|err| ConfigError::Invalid {
            key: "HTTP_ADDR",
            message: err.to_string(),
        })
    }

    pub fn sqlite_path(&self) -> PathBuf {
        self.sqlite_path
            .clone()
            .unwrap_or_else(|| self.data_dir.join("course_planner.sqlite3"))
    }

    pub fn open_backend(&self) -> Result<Box<dyn StateStore>, ConfigError> {
        self.validate()?;
        let backend: Box<dyn StateStore> = match self.backend {
            BackendKind::Memory => Box::new(MemoryStateStore::new()),
            BackendKind::Json => Box::new(JsonDirStateStore::new(&self.data_dir)?),
            #[cfg(feature = "sqlite")]
            BackendKind::Sqlite => {
                let path = self.sqlite_path();
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent).map_err(PersistenceError::from)?;
                }
                Box::new(crate::persistence::sqlite::SqliteStateStore::new(
                    path,
                    self.user_id.clone(),
                )?)
            }
            #[cfg(not(feature = "sqlite"))]
            BackendKind::Sqlite => {
                return Err(ConfigError::Invalid {
                    key: "BACKEND",
                    message: "sqlite backend requires the `sqlite` feature".into(),
                });
            }
        };
        Ok(backend)
    }
}
