use super::{DAY_CONFIG_KEY, PersistenceError, PersistenceResult, RawState, SCHEDULE_KEY, StateStore};
use crate::course::{Course, DayEntry};
use crate::ingest;
use crate::{CourseDayConfig, Schedule};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Backend that keeps each structure in `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct JsonDirStateStore {
    dir: PathBuf,
}

impl JsonDirStateStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> PersistenceResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    fn write_key<T: Serialize>(&self, key: &str, value: &T) -> PersistenceResult<()> {
        let tmp = self.write_temp(key, value)?;
        fs::rename(&tmp, self.path_for(key))?;
        Ok(())
    }

    fn write_temp<T: Serialize>(&self, key: &str, value: &T) -> PersistenceResult<PathBuf> {
        let tmp = self.dir.join(format!(".{key}.json.tmp"));
        let mut writer = BufWriter::new(File::create(&tmp)?);
        serde_json::to_writer(&mut writer, value)?;
        writer.flush()?;
        Ok(tmp)
    }

    /// Put back the bytes a key held before a failed multi-key write.
    fn restore_key(&self, key: &str, previous: Option<Vec<u8>>) -> PersistenceResult<()> {
        let target = self.path_for(key);
        match previous {
            Some(bytes) => {
                let tmp = self.dir.join(format!(".{key}.json.restore"));
                fs::write(&tmp, bytes)?;
                fs::rename(&tmp, &target)?;
            }
            None => {
                if target.exists() {
                    fs::remove_file(&target)?;
                }
            }
        }
        Ok(())
    }

    /// Parsed value of a key. Text that is not JSON is logged and read as
    /// missing; I/O errors propagate.
    fn read_key(&self, key: &str) -> PersistenceResult<Option<Value>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&path)?;
        match serde_json::from_str(&text) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                warn!(key, path = %path.display(), error = %err, "stored file is not valid JSON, ignoring it");
                Ok(None)
            }
        }
    }

    fn remove_key(&self, key: &str) -> PersistenceResult<()> {
        let path = self.path_for(key);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

impl StateStore for JsonDirStateStore {
    fn save_schedule(&self, schedule: &Schedule) -> PersistenceResult<()> {
        self.write_key(SCHEDULE_KEY, schedule)
    }

    fn save_day_config(&self, config: &CourseDayConfig) -> PersistenceResult<()> {
        self.write_key(DAY_CONFIG_KEY, config)
    }

    /// Both temp files are written before either is renamed into place. If
    /// the config rename fails the previous schedule file is put back.
    fn save_state(&self, schedule: &Schedule, config: &CourseDayConfig) -> PersistenceResult<()> {
        let schedule_tmp = self.write_temp(SCHEDULE_KEY, schedule)?;
        let config_tmp = match self.write_temp(DAY_CONFIG_KEY, config) {
            Ok(tmp) => tmp,
            Err(err) => {
                let _ = fs::remove_file(&schedule_tmp);
                return Err(err);
            }
        };

        let schedule_path = self.path_for(SCHEDULE_KEY);
        let previous = match fs::read(&schedule_path) {
            Ok(bytes) => Some(bytes),
            Err(err) if err.kind() == ErrorKind::NotFound => None,
            Err(err) => {
                let _ = fs::remove_file(&schedule_tmp);
                let _ = fs::remove_file(&config_tmp);
                return Err(err.into());
            }
        };

        if let Err(err) = fs::rename(&schedule_tmp, &schedule_path) {
            let _ = fs::remove_file(&schedule_tmp);
            let _ = fs::remove_file(&config_tmp);
            return Err(err.into());
        }
        if let Err(err) = fs::rename(&config_tmp, self.path_for(DAY_CONFIG_KEY)) {
            let _ = fs::remove_file(&config_tmp);
            if let Err(restore_err) = self.restore_key(SCHEDULE_KEY, previous) {
                warn!(error = %restore_err, "could not restore schedule after failed config write");
            }
            return Err(err.into());
        }
        Ok(())
    }

    fn load_state(&self) -> PersistenceResult<Option<RawState>> {
        let schedule = self.read_key(SCHEDULE_KEY)?;
        let day_config = self.read_key(DAY_CONFIG_KEY)?;
        if schedule.is_none() && day_config.is_none() {
            return Ok(None);
        }
        Ok(Some(RawState {
            schedule,
            day_config,
        }))
    }

    fn clear(&self) -> PersistenceResult<()> {
        self.remove_key(SCHEDULE_KEY)?;
        self.remove_key(DAY_CONFIG_KEY)
    }
}

pub fn save_schedule_to_json<P: AsRef<Path>>(
    schedule: &Schedule,
    path: P,
) -> PersistenceResult<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, schedule)?;
    Ok(())
}

/// Read a schedule file through the same normalization parser output gets.
pub fn load_schedule_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<Schedule> {
    let file = File::open(path)?;
    let value: Value = serde_json::from_reader(BufReader::new(file))?;
    ingest::normalize_schedule(&value).map_err(|err| PersistenceError::InvalidData(err.to_string()))
}

const TOPIC_SEPARATOR: &str = ";";

#[derive(Serialize, Deserialize)]
struct CourseCsvRecord {
    day: String,
    is_date: String,
    name: String,
    time: String,
    topics: String,
    note: String,
}

impl CourseCsvRecord {
    fn from_course(entry: &DayEntry, course: &Course) -> Self {
        Self {
            day: entry.day.clone(),
            is_date: entry.is_date.to_string(),
            name: course.name.clone(),
            time: course.time.clone().unwrap_or_default(),
            topics: course.topics.join(TOPIC_SEPARATOR),
            note: course.note.clone().unwrap_or_default(),
        }
    }

    fn into_entry(self) -> PersistenceResult<DayEntry> {
        let is_date = match self.is_date.trim().to_ascii_lowercase().as_str() {
            "" | "false" => false,
            "true" => true,
            other => {
                return Err(PersistenceError::InvalidData(format!(
                    "course '{}' has is_date '{other}', expected true or false",
                    self.name
                )));
            }
        };
        if self.day.trim().is_empty() {
            return Err(PersistenceError::InvalidData(format!(
                "course '{}' has an empty day",
                self.name
            )));
        }
        let topics = self
            .topics
            .split(TOPIC_SEPARATOR)
            .map(str::trim)
            .filter(|topic| !topic.is_empty())
            .map(ToOwned::to_owned)
            .collect();
        let course = Course {
            name: self.name,
            time: non_blank(self.time),
            topics,
            note: non_blank(self.note),
        };
        Ok(DayEntry {
            day: self.day,
            is_date,
            courses: vec![course],
        })
    }
}

/// One row per course; `topics` are `;`-joined.
pub fn save_schedule_to_csv<P: AsRef<Path>>(
    schedule: &Schedule,
    path: P,
) -> PersistenceResult<()> {
    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);
    for entry in schedule.entries() {
        for course in &entry.courses {
            writer.serialize(CourseCsvRecord::from_course(entry, course))?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// Rows sharing a `(day, is_date)` key are regrouped into one entry, in file order.
pub fn load_schedule_from_csv<P: AsRef<Path>>(path: P) -> PersistenceResult<Schedule> {
    let file = File::open(path)?;
    let mut reader = csv::Reader::from_reader(file);
    let mut schedule = Schedule::new();
    let mut rows = 0usize;
    for record in reader.deserialize::<CourseCsvRecord>() {
        let entry = record?.into_entry()?;
        schedule.merge(Schedule::from_entries(vec![entry]));
        rows += 1;
    }

    if rows == 0 {
        return Err(PersistenceError::InvalidData(
            "CSV file contained no courses".into(),
        ));
    }
    Ok(schedule)
}

fn non_blank(value: String) -> Option<String> {
    Some(value).filter(|v| !v.trim().is_empty())
}
