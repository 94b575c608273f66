use parking_lot::Mutex;

use super::{PersistenceResult, RawState, StateStore};
use crate::{CourseDayConfig, Schedule};

/// Process-local backend. Holds the last written JSON of each structure.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    state: Mutex<RawState>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from previously persisted raw values.
    pub fn with_state(state: RawState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    /// Copy of what was last written.
    pub fn snapshot(&self) -> RawState {
        self.state.lock().clone()
    }
}

impl StateStore for MemoryStateStore {
    fn save_schedule(&self, schedule: &Schedule) -> PersistenceResult<()> {
        let value = serde_json::to_value(schedule)?;
        self.state.lock().schedule = Some(value);
        Ok(())
    }

    fn save_day_config(&self, config: &CourseDayConfig) -> PersistenceResult<()> {
        let value = serde_json::to_value(config)?;
        self.state.lock().day_config = Some(value);
        Ok(())
    }

    fn save_state(&self, schedule: &Schedule, config: &CourseDayConfig) -> PersistenceResult<()> {
        let schedule = serde_json::to_value(schedule)?;
        let config = serde_json::to_value(config)?;
        let mut state = self.state.lock();
        state.schedule = Some(schedule);
        state.day_config = Some(config);
        Ok(())
    }

    fn load_state(&self) -> PersistenceResult<Option<RawState>> {
        let state = self.state.lock();
        if state.schedule.is_none() && state.day_config.is_none() {
            return Ok(None);
        }
        Ok(Some(state.clone()))
    }

    fn clear(&self) -> PersistenceResult<()> {
        *self.state.lock() = RawState::default();
        Ok(())
    }
}
