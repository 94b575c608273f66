//! Normalization of untrusted schedule data.
//!
//! Parser output, backup files and previously persisted state all enter the
//! crate through here. The functions below never fail on malformed members;
//! they drop or coerce them so the result satisfies the `Schedule` shape.
//! Only a non-array top level is rejected.

use serde_json::{Map, Value};
use tracing::warn;

use crate::course::{Course, DayEntry};
use crate::day_config::CourseDayConfig;
use crate::error::{ScheduleError, ScheduleResult};
use crate::schedule::Schedule;

pub fn normalize_schedule(value: &Value) -> ScheduleResult<Schedule> {
    let Some(items) = value.as_array() else {
        return Err(ScheduleError::input_format(format!(
            "expected a list of day entries, got {}",
            type_name(value)
        )));
    };

    let mut entries = Vec::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        match normalize_entry(item) {
            Some(entry) => entries.push(entry),
            None => warn!(index = idx, "skipping day entry without a day name"),
        }
    }
    Ok(Schedule::from_entries(entries))
}

pub fn normalize_day_config(value: &Value) -> CourseDayConfig {
    let Some(object) = value.as_object() else {
        if !value.is_null() {
            warn!(kind = type_name(value), "ignoring course day config that is not an object");
        }
        return CourseDayConfig::new();
    };

    object
        .iter()
        .filter_map(|(name, days)| {
            let Some(days) = days.as_array() else {
                warn!(course = %name, "dropping course day config entry that is not a list");
                return None;
            };
            let days: Vec<String> = days
                .iter()
                .filter_map(Value::as_str)
                .map(ToOwned::to_owned)
                .collect();
            Some((name.clone(), days))
        })
        .collect()
}

fn normalize_entry(item: &Value) -> Option<DayEntry> {
    let object = item.as_object()?;
    let day = object.get("day")?.as_str()?.to_string();
    let is_date = object
        .get("isDate")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    let courses = match object.get("courses").and_then(Value::as_array) {
        Some(list) => list.iter().filter_map(normalize_course).collect(),
        None => Vec::new(),
    };

    Some(DayEntry {
        day,
        is_date,
        courses,
    })
}

fn normalize_course(item: &Value) -> Option<Course> {
    let object = item.as_object()?;
    let Some(name) = object.get("name").and_then(Value::as_str) else {
        warn!("skipping course without a name");
        return None;
    };

    let topics: Vec<String> = object
        .get("topics")
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .filter_map(Value::as_str)
                .map(ToOwned::to_owned)
                .collect()
        })
        .unwrap_or_default();

    Some(Course {
        name: name.to_string(),
        time: optional_string(object, "time"),
        topics,
        note: optional_string(object, "note"),
    })
}

fn optional_string(object: &Map<String, Value>, key: &str) -> Option<String> {
    object
        .get(key)
        .and_then(Value::as_str)
        .map(ToOwned::to_owned)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rejects_non_array_top_level() {
        let err = normalize_schedule(&json!({ "day": "Monday" })).unwrap_err();
        assert!(err.is_input_format());
        assert!(err.to_string().contains("an object"));
    }

    #[test]
    fn coerces_missing_or_malformed_courses_to_empty() {
        let schedule = normalize_schedule(&json!([
            { "day": "Monday" },
            { "day": "Tuesday", "courses": "Math" },
            { "day": "2024-10-05", "isDate": true, "courses": null }
        ]))
        .unwrap();
        assert_eq!(schedule.len(), 3);
        assert!(schedule.entries().iter().all(|e| e.courses.is_empty()));
        assert!(schedule.entries()[2].is_date);
    }

    #[test]
    fn drops_unusable_entries_and_courses() {
        let schedule = normalize_schedule(&json!([
            42,
            { "courses": [] },
            { "day": "Monday", "isDate": "yes", "courses": [
                { "name": "Math", "topics": ["Algebra", 7], "time": 40, "note": "Sınav" },
                { "topics": ["orphan"] },
                "Physics"
            ]}
        ]))
        .unwrap();

        assert_eq!(schedule.len(), 1);
        let entry = &schedule.entries()[0];
        assert!(!entry.is_date);
        assert_eq!(entry.courses.len(), 1);
        assert_eq!(entry.courses[0].topics, vec!["Algebra".to_string()]);
        assert_eq!(entry.courses[0].time, None);
        assert_eq!(entry.courses[0].note.as_deref(), Some("Sınav"));
    }

    #[test]
    fn day_config_keeps_only_string_lists() {
        let config = normalize_day_config(&json!({
            "Math": ["Monday", 3, "Friday"],
            "Art": [],
            "Broken": "Monday"
        }));
        assert_eq!(config.len(), 2);
        assert_eq!(
            config.allowed_days("Math"),
            Some(&["Monday".to_string(), "Friday".to_string()][..])
        );
        assert!(!config.is_visible_on("Art", "Monday"));
        assert!(normalize_day_config(&json!(null)).is_empty());
    }
}
