use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use crate::calendar::iso_date;
use crate::day_config::CourseDayConfig;
use crate::error::{ScheduleError, ScheduleResult};
use crate::ingest;
use crate::persistence::{PersistenceError, PersistenceResult};
use crate::schedule::Schedule;

pub const BACKUP_VERSION: u32 = 1;
const BACKUP_FILE_PREFIX: &str = "ders_programi_yedek_";

/// Exported backup document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupPayload {
    pub version: u32,
    pub export_date: DateTime<Utc>,
    pub schedule: Schedule,
    pub course_day_config: CourseDayConfig,
}

impl BackupPayload {
    pub fn new(schedule: &Schedule, config: &CourseDayConfig, exported_at: DateTime<Utc>) -> Self {
        Self {
            version: BACKUP_VERSION,
            export_date: exported_at,
            schedule: schedule.clone(),
            course_day_config: config.clone(),
        }
    }

    pub fn to_pretty_json(&self) -> PersistenceResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn file_name(&self) -> String {
        backup_file_name(self.export_date.date_naive())
    }
}

/// Result of reading a backup in either accepted shape.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedBackup {
    pub schedule: Schedule,
    pub course_day_config: CourseDayConfig,
}

pub fn backup_file_name(date: NaiveDate) -> String {
    format!("{BACKUP_FILE_PREFIX}{}.json", iso_date(date))
}

/// Accepts a bare schedule list (older exports) or an object with a
/// `schedule` list and optional `courseDayConfig`. The config is empty when
/// absent.
pub fn parse_backup(value: &Value) -> ScheduleResult<ImportedBackup> {
    if value.is_array() {
        return Ok(ImportedBackup {
            schedule: ingest::normalize_schedule(value)?,
            course_day_config: CourseDayConfig::new(),
        });
    }

    let schedule = value
        .as_object()
        .and_then(|obj| obj.get("schedule"))
        .filter(|schedule| schedule.is_array())
        .ok_or_else(|| {
            ScheduleError::input_format("backup must be a schedule list or contain a schedule list")
        })?;

    let course_day_config = value
        .get("courseDayConfig")
        .map(ingest::normalize_day_config)
        .unwrap_or_default();

    Ok(ImportedBackup {
        schedule: ingest::normalize_schedule(schedule)?,
        course_day_config,
    })
}

pub fn read_backup<P: AsRef<Path>>(path: P) -> ScheduleResult<ImportedBackup> {
    let text = fs::read_to_string(path).map_err(PersistenceError::from)?;
    let value: Value = serde_json::from_str(&text)
        .map_err(|err| ScheduleError::input_format(format!("backup is not valid JSON: {err}")))?;
    parse_backup(&value)
}

/// Write the payload into `dir` under its dated file name.
pub fn write_backup<P: AsRef<Path>>(dir: P, payload: &BackupPayload) -> PersistenceResult<PathBuf> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;
    let path = dir.join(payload.file_name());
    fs::write(&path, payload.to_pretty_json()?)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn file_name_uses_iso_date() {
        let date = NaiveDate::from_ymd_opt(2024, 10, 5).unwrap();
        assert_eq!(backup_file_name(date), "ders_programi_yedek_2024-10-05.json");
    }

    #[test]
    fn legacy_array_yields_empty_config() {
        let backup = parse_backup(&json!([{ "day": "Cuma", "courses": [{ "name": "Müzik" }] }])).unwrap();
        assert_eq!(backup.schedule.len(), 1);
        assert!(backup.course_day_config.is_empty());
    }

    #[test]
    fn object_without_schedule_list_is_rejected() {
        for value in [json!({ "schedule": "x" }), json!({ "version": 1 }), json!("text"), json!(null)] {
            let err = parse_backup(&value).unwrap_err();
            assert!(err.is_input_format(), "accepted {value}");
        }
    }

    #[test]
    fn payload_serializes_with_camel_case_keys() {
        let exported_at = DateTime::parse_from_rfc3339("2024-10-05T08:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let payload = BackupPayload::new(&Schedule::new(), &CourseDayConfig::new(), exported_at);
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["version"], json!(1));
        assert_eq!(value["schedule"], json!([]));
        assert_eq!(value["courseDayConfig"], json!({}));
        assert!(value["exportDate"].as_str().unwrap().starts_with("2024-10-05T08:30:00"));
        assert_eq!(payload.file_name(), "ders_programi_yedek_2024-10-05.json");
    }
}
