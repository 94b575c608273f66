use serde_json::{Error as SerdeJsonError, Value};
use std::io;
use thiserror::Error;

use crate::{CourseDayConfig, Schedule};

/// Key the schedule is stored under.
pub const SCHEDULE_KEY: &str = "my_smart_schedule_v1";
/// Key the course day config is stored under.
pub const DAY_CONFIG_KEY: &str = "my_smart_schedule_days_v1";

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("serialization error: {0}")]
    Serialization(#[from] SerdeJsonError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[cfg(feature = "sqlite")]
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid data: {0}")]
    InvalidData(String),
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Persisted state as read back from a backend, before normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawState {
    pub schedule: Option<Value>,
    pub day_config: Option<Value>,
}

/// Whole-state storage backend. Every save overwrites the full structure.
pub trait StateStore: Send + Sync {
    fn save_schedule(&self, schedule: &Schedule) -> PersistenceResult<()>;
    fn save_day_config(&self, config: &CourseDayConfig) -> PersistenceResult<()>;

    /// Write both structures. Backends that can do so atomically override this.
    fn save_state(&self, schedule: &Schedule, config: &CourseDayConfig) -> PersistenceResult<()> {
        self.save_schedule(schedule)?;
        self.save_day_config(config)
    }

    /// `None` when nothing has ever been stored.
    fn load_state(&self) -> PersistenceResult<Option<RawState>>;

    fn clear(&self) -> PersistenceResult<()>;
}

pub mod file;
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use file::{
    JsonDirStateStore, load_schedule_from_csv, load_schedule_from_json, save_schedule_to_csv,
    save_schedule_to_json,
};
pub use memory::MemoryStateStore;
