use super::{PersistenceResult, RawState, StateStore};
use crate::{CourseDayConfig, Schedule};
use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, params};
use serde_json::Value;
use tracing::warn;

/// One row per user holding the whole schedule and config as JSON text.
pub struct SqliteStateStore {
    connection: Mutex<Connection>,
    user_id: String,
}

impl SqliteStateStore {
    pub fn new<P: AsRef<std::path::Path>>(path: P, user_id: impl Into<String>) -> PersistenceResult<Self> {
        let connection = Connection::open(path)?;
        Self::with_connection(connection, user_id)
    }

    pub fn in_memory(user_id: impl Into<String>) -> PersistenceResult<Self> {
        Self::with_connection(Connection::open_in_memory()?, user_id)
    }

    fn with_connection(connection: Connection, user_id: impl Into<String>) -> PersistenceResult<Self> {
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
            user_id: user_id.into(),
        })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    fn initialize_schema(connection: &Connection) -> PersistenceResult<()> {
        let ddl = r#"
            CREATE TABLE IF NOT EXISTS user_schedules (
                user_id TEXT PRIMARY KEY,
                schedule_data TEXT,
                config_data TEXT,
                updated_at TEXT NOT NULL
            );
        "#;
        connection.execute_batch(ddl)?;
        Ok(())
    }

    fn upsert_column(&self, column: &str, json: &str) -> PersistenceResult<()> {
        let conn = self.connection.lock();
        let sql = format!(
            "INSERT INTO user_schedules (user_id, {column}, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id) DO UPDATE SET {column} = excluded.{column}, updated_at = excluded.updated_at"
        );
        conn.execute(&sql, params![self.user_id, json, Utc::now().to_rfc3339()])?;
        Ok(())
    }
}

impl StateStore for SqliteStateStore {
    fn save_schedule(&self, schedule: &Schedule) -> PersistenceResult<()> {
        let json = serde_json::to_string(schedule)?;
        self.upsert_column("schedule_data", &json)
    }

    fn save_day_config(&self, config: &CourseDayConfig) -> PersistenceResult<()> {
        let json = serde_json::to_string(config)?;
        self.upsert_column("config_data", &json)
    }

    fn save_state(&self, schedule: &Schedule, config: &CourseDayConfig) -> PersistenceResult<()> {
        let schedule_json = serde_json::to_string(schedule)?;
        let config_json = serde_json::to_string(config)?;
        let mut conn = self.connection.lock();
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO user_schedules (user_id, schedule_data, config_data, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(user_id) DO UPDATE SET
                schedule_data = excluded.schedule_data,
                config_data = excluded.config_data,
                updated_at = excluded.updated_at",
            params![self.user_id, schedule_json, config_json, Utc::now().to_rfc3339()],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn load_state(&self) -> PersistenceResult<Option<RawState>> {
        let conn = self.connection.lock();
        let mut stmt = conn.prepare(
            "SELECT schedule_data, config_data FROM user_schedules WHERE user_id = ?1",
        )?;
        let row: Option<(Option<String>, Option<String>)> = stmt
            .query_row(params![self.user_id], |row| Ok((row.get(0)?, row.get(1)?)))
            .optional()?;

        let Some((schedule_json, config_json)) = row else {
            return Ok(None);
        };

        Ok(Some(RawState {
            schedule: parse_column("schedule_data", schedule_json),
            day_config: parse_column("config_data", config_json),
        }))
    }

    fn clear(&self) -> PersistenceResult<()> {
        let conn = self.connection.lock();
        conn.execute(
            "DELETE FROM user_schedules WHERE user_id = ?1",
            params![self.user_id],
        )?;
        Ok(())
    }
}

/// Column text that is not JSON is logged and read as missing.
fn parse_column(column: &str, json: Option<String>) -> Option<Value> {
    let text = json?;
    match serde_json::from_str(&text) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(column, error = %err, "stored column is not valid JSON, ignoring it");
            None
        }
    }
}
