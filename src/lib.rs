pub mod backup;
pub mod calendar;
pub mod config;
pub mod course;
pub mod day_config;
pub mod error;
#[cfg(feature = "http_api")]
pub mod http_api;
pub mod ingest;
pub mod logging;
pub mod persistence;
pub mod schedule;
pub mod store;
pub mod view;

pub use backup::{BackupPayload, ImportedBackup, backup_file_name, parse_backup, read_backup, write_backup};
pub use calendar::DayLocale;
pub use config::{AppConfig, BackendKind, ConfigError};
pub use course::{Course, DayEntry};
pub use day_config::CourseDayConfig;
pub use error::{ScheduleError, ScheduleResult};
#[cfg(feature = "sqlite")]
pub use persistence::sqlite::SqliteStateStore;
pub use persistence::{
    JsonDirStateStore, MemoryStateStore, PersistenceError, RawState, StateStore,
    load_schedule_from_csv, load_schedule_from_json, save_schedule_to_csv, save_schedule_to_json,
};
pub use schedule::{MergeSummary, Schedule};
pub use store::ScheduleStore;
pub use view::{DayView, ViewItem};
