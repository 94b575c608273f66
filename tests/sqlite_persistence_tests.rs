#![cfg(feature = "sqlite")]

use chrono::NaiveDate;
use course_planner::{DayLocale, ScheduleStore, SqliteStateStore, StateStore};
use serde_json::json;
use tempfile::NamedTempFile;

fn open_store(path: &std::path::Path, user: &str) -> ScheduleStore {
    let backend = SqliteStateStore::new(path, user).expect("open sqlite backend");
    ScheduleStore::open(Box::new(backend), DayLocale::Turkish).expect("open store")
}

#[test]
fn sqlite_store_round_trip_schedule_and_config() {
    let file = NamedTempFile::new().unwrap();
    {
        let mut store = open_store(file.path(), "ayse");
        store
            .merge(&json!([
                { "day": "Pazartesi", "courses": [
                    { "name": "Matematik", "time": "09:00", "topics": ["Limit"] }
                ]},
                { "day": "2024-10-05", "isDate": true, "courses": [{ "name": "Resim" }] }
            ]))
            .expect("merge");
        store.toggle_day("Matematik", "Salı").expect("toggle");
    }

    let store = open_store(file.path(), "ayse");
    assert_eq!(store.schedule().len(), 2);
    assert_eq!(
        store.course_names(),
        vec!["Matematik".to_string(), "Resim".to_string()]
    );
    assert_eq!(
        store.day_config().allowed_days("Matematik"),
        Some(&["Salı".to_string()][..])
    );

    let tuesday = NaiveDate::from_ymd_opt(2024, 10, 8).unwrap();
    assert!(store.view_for_date(tuesday).is_empty());
}

#[test]
fn sqlite_rows_are_isolated_per_user() {
    let file = NamedTempFile::new().unwrap();
    {
        let mut first = open_store(file.path(), "ayse");
        first
            .merge(&json!([{ "day": "Cuma", "courses": [{ "name": "Müzik" }] }]))
            .unwrap();
        let mut second = open_store(file.path(), "mehmet");
        second
            .merge(&json!([{ "day": "Salı", "courses": [{ "name": "Kimya" }] }]))
            .unwrap();
        second.clear().unwrap();
    }

    let first = open_store(file.path(), "ayse");
    assert_eq!(first.course_names(), vec!["Müzik".to_string()]);
    let second = open_store(file.path(), "mehmet");
    assert!(second.schedule().is_empty());
}

#[test]
fn sqlite_delete_everywhere_writes_schedule_and_config_together() {
    let file = NamedTempFile::new().unwrap();
    {
        let mut store = open_store(file.path(), "local");
        store
            .merge(&json!([
                { "day": "Pazartesi", "courses": [{ "name": "Fizik" }, { "name": "Tarih" }] },
                { "day": "Salı", "courses": [{ "name": " Fizik " }] }
            ]))
            .unwrap();
        store.toggle_day("Fizik", "Pazartesi").unwrap();
        assert_eq!(store.delete_course_everywhere("Fizik").unwrap(), 2);
    }

    let backend = SqliteStateStore::new(file.path(), "local").unwrap();
    let raw = backend.load_state().unwrap().expect("row exists");
    assert_eq!(
        raw.schedule,
        Some(json!([{ "day": "Pazartesi", "isDate": false, "courses": [{ "name": "Tarih", "topics": [] }] }]))
    );
    assert_eq!(raw.day_config, Some(json!({})));
}

#[test]
fn sqlite_missing_row_loads_as_none() {
    let backend = SqliteStateStore::in_memory("nobody").unwrap();
    assert_eq!(backend.user_id(), "nobody");
    assert!(backend.load_state().unwrap().is_none());
}

#[test]
fn sqlite_unparseable_column_opens_empty() {
    let file = NamedTempFile::new().unwrap();
    {
        let mut store = open_store(file.path(), "local");
        store.toggle_day("Kimya", "Cuma").unwrap();
        store
            .merge(&json!([{ "day": "Cuma", "courses": [{ "name": "Kimya" }] }]))
            .unwrap();
    }
    let conn = rusqlite::Connection::open(file.path()).unwrap();
    conn.execute(
        "UPDATE user_schedules SET schedule_data = '{ broken' WHERE user_id = 'local'",
        [],
    )
    .unwrap();
    drop(conn);

    let store = open_store(file.path(), "local");
    assert!(store.schedule().is_empty());
    assert!(store.is_day_selected("Kimya", "Cuma"));
    assert!(!store.is_day_selected("Kimya", "Salı"));
}
