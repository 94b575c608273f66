use thiserror::Error;

use crate::persistence::PersistenceError;

/// Errors surfaced by `ScheduleStore` operations.
#[derive(Debug, Error)]
pub enum ScheduleError {
    /// Incoming payload did not have a recognised shape. Nothing was mutated.
    #[error("input format error: {0}")]
    InputFormat(String),

    /// The backend rejected a write. In-memory state was left as it was.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl ScheduleError {
    pub fn input_format(message: impl Into<String>) -> Self {
        ScheduleError::InputFormat(message.into())
    }

    pub fn is_input_format(&self) -> bool {
        matches!(self, ScheduleError::InputFormat(_))
    }
}

pub type ScheduleResult<T> = Result<T, ScheduleError>;
