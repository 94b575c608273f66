use chrono::NaiveDate;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::backup::ImportedBackup;
use crate::calendar::DayLocale;
use crate::day_config::CourseDayConfig;
use crate::error::ScheduleResult;
use crate::ingest;
use crate::persistence::{MemoryStateStore, StateStore};
use crate::schedule::{MergeSummary, Schedule};
use crate::view::{self, DayView};

/// The user's schedule and course visibility config, backed by a
/// `StateStore`.
///
/// Every mutation builds the new state, writes the whole structure to the
/// backend and only then replaces what is held in memory. A failed write
/// leaves the in-memory state untouched.
pub struct ScheduleStore {
    schedule: Schedule,
    day_config: CourseDayConfig,
    locale: DayLocale,
    backend: Box<dyn StateStore>,
}

impl ScheduleStore {
    /// Empty store over an in-memory backend.
    pub fn in_memory(locale: DayLocale) -> Self {
        Self {
            schedule: Schedule::new(),
            day_config: CourseDayConfig::new(),
            locale,
            backend: Box::new(MemoryStateStore::new()),
        }
    }

    /// Load whatever the backend holds. Unreadable stored data is logged and
    /// replaced by an empty structure; backend I/O errors propagate.
    pub fn open(backend: Box<dyn StateStore>, locale: DayLocale) -> ScheduleResult<Self> {
        let raw = backend.load_state()?.unwrap_or_default();

        let schedule = match raw.schedule.as_ref().map(ingest::normalize_schedule) {
            Some(Ok(schedule)) => schedule,
            Some(Err(err)) => {
                warn!(error = %err, "stored schedule is unreadable, starting empty");
                Schedule::new()
            }
            None => Schedule::new(),
        };
        let day_config = raw
            .day_config
            .as_ref()
            .map(ingest::normalize_day_config)
            .unwrap_or_default();

        info!(
            days = schedule.len(),
            courses = schedule.course_count(),
            configured = day_config.len(),
            "schedule store opened"
        );
        Ok(Self {
            schedule,
            day_config,
            locale,
            backend,
        })
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn day_config(&self) -> &CourseDayConfig {
        &self.day_config
    }

    pub fn locale(&self) -> DayLocale {
        self.locale
    }

    /// Merge an untrusted fragment, typically parser output.
    ///
    /// Fails with `InputFormat` without touching anything when the top-level
    /// value is not a list.
    pub fn merge(&mut self, incoming: &Value) -> ScheduleResult<&Schedule> {
        let fragment = ingest::normalize_schedule(incoming)?;
        self.merge_schedule(fragment)?;
        Ok(&self.schedule)
    }

    /// Merge a fragment that has already been normalized.
    pub fn merge_schedule(&mut self, fragment: Schedule) -> ScheduleResult<MergeSummary> {
        let mut merged = self.schedule.clone();
        let summary = merged.merge(fragment);
        self.backend.save_schedule(&merged)?;
        self.schedule = merged;
        info!(
            days_extended = summary.days_extended,
            days_added = summary.days_added,
            courses_added = summary.courses_added,
            "merged schedule fragment"
        );
        Ok(summary)
    }

    /// Overwrite the schedule, and the config when one is given.
    pub fn replace(
        &mut self,
        schedule: Schedule,
        config: Option<CourseDayConfig>,
    ) -> ScheduleResult<()> {
        match &config {
            Some(config) => self.backend.save_state(&schedule, config)?,
            None => self.backend.save_schedule(&schedule)?,
        }
        info!(
            days = schedule.len(),
            config_replaced = config.is_some(),
            "replaced schedule"
        );
        self.schedule = schedule;
        if let Some(config) = config {
            self.day_config = config;
        }
        Ok(())
    }

    /// Apply a parsed backup file.
    pub fn restore(&mut self, backup: ImportedBackup) -> ScheduleResult<()> {
        self.replace(backup.schedule, Some(backup.course_day_config))
    }

    /// Delete one course by position. Returns `false` when either index is
    /// stale; nothing is written in that case.
    pub fn delete_instance(&mut self, day_index: usize, course_index: usize) -> ScheduleResult<bool> {
        let mut updated = self.schedule.clone();
        let Some(removed) = updated.remove_instance(day_index, course_index) else {
            debug!(day_index, course_index, "delete ignored, index out of range");
            return Ok(false);
        };
        self.backend.save_schedule(&updated)?;
        self.schedule = updated;
        info!(day_index, course_index, course = %removed.name, "deleted course instance");
        Ok(true)
    }

    /// Delete every occurrence of a course, compared by trimmed name, along
    /// with its visibility config. Returns the number of courses removed.
    pub fn delete_course_everywhere(&mut self, course_name: &str) -> ScheduleResult<usize> {
        let mut schedule = self.schedule.clone();
        let mut config = self.day_config.clone();
        let removed = schedule.remove_course_everywhere(course_name);
        let keys_removed = config.remove_course(course_name);

        self.backend.save_state(&schedule, &config)?;
        self.schedule = schedule;
        self.day_config = config;
        info!(course = course_name.trim(), removed, keys_removed, "deleted course everywhere");
        Ok(removed)
    }

    /// Flip whether `course_name` is shown on `day`. Returns the new day list.
    pub fn toggle_day(&mut self, course_name: &str, day: &str) -> ScheduleResult<Vec<String>> {
        let mut config = self.day_config.clone();
        let days = config.toggle(course_name, day);
        self.backend.save_day_config(&config)?;
        self.day_config = config;
        info!(course = course_name.trim(), day, days = ?days, "toggled course day");
        Ok(days)
    }

    /// Overwrite the whole visibility config.
    pub fn set_day_config(&mut self, config: CourseDayConfig) -> ScheduleResult<()> {
        self.backend.save_day_config(&config)?;
        info!(configured = config.len(), "saved course day config");
        self.day_config = config;
        Ok(())
    }

    /// Drop everything, in memory and in the backend.
    pub fn clear(&mut self) -> ScheduleResult<()> {
        self.backend.clear()?;
        self.schedule = Schedule::new();
        self.day_config = CourseDayConfig::new();
        info!("cleared schedule and course day config");
        Ok(())
    }

    pub fn view_for_date(&self, date: NaiveDate) -> DayView {
        view::view_for_date(&self.schedule, &self.day_config, self.locale, date)
    }

    pub fn course_names(&self) -> Vec<String> {
        self.schedule.course_names()
    }

    /// Whether the config editor should show `day` as selected for a course.
    /// Courses without config count as selected on every day.
    pub fn is_day_selected(&self, course_name: &str, day: &str) -> bool {
        self.day_config.is_visible_on(course_name, day)
    }
}
