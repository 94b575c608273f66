use serde::{Deserialize, Serialize};

/// One scheduled subject occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Course {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            time: None,
            topics: Vec::new(),
            note: None,
        }
    }

    pub fn with_time(mut self, time: impl Into<String>) -> Self {
        self.time = Some(time.into());
        self
    }

    pub fn with_topics<I, S>(mut self, topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.topics = topics.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Name with surrounding whitespace removed; the join key for config lookups.
    pub fn key(&self) -> &str {
        self.name.trim()
    }
}

/// One schedule slot: a recurring weekday or a specific calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayEntry {
    pub day: String,
    #[serde(rename = "isDate", default)]
    pub is_date: bool,
    #[serde(default)]
    pub courses: Vec<Course>,
}

impl DayEntry {
    pub fn recurring(day: impl Into<String>, courses: Vec<Course>) -> Self {
        Self {
            day: day.into(),
            is_date: false,
            courses,
        }
    }

    pub fn dated(date: impl Into<String>, courses: Vec<Course>) -> Self {
        Self {
            day: date.into(),
            is_date: true,
            courses,
        }
    }

    pub fn same_slot(&self, other: &DayEntry) -> bool {
        self.is_date == other.is_date && self.day == other.day
    }
}
