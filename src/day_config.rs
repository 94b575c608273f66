use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-course weekday visibility.
///
/// A course with no entry is shown every day. A course mapped to an empty
/// list is hidden every day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CourseDayConfig {
    days: BTreeMap<String, Vec<String>>,
}

impl CourseDayConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.days.iter()
    }

    /// Overwrite the day list stored under `key` verbatim.
    pub fn insert(&mut self, key: impl Into<String>, days: Vec<String>) {
        self.days.insert(key.into(), days);
    }

    /// Allowed days for a course name.
    ///
    /// Looks up the trimmed name first. When that is missing, falls back to
    /// the raw name as given, which is how configs saved before keys were
    /// trimmed are still honoured.
    pub fn allowed_days(&self, course_name: &str) -> Option<&[String]> {
        self.days
            .get(course_name.trim())
            .or_else(|| self.days.get(course_name))
            .map(Vec::as_slice)
    }

    pub fn is_visible_on(&self, course_name: &str, weekday_name: &str) -> bool {
        match self.allowed_days(course_name) {
            None => true,
            Some(days) => days.iter().any(|d| d == weekday_name),
        }
    }

    /// Flip membership of `day` for the course and return the new list.
    ///
    /// The result is always stored under the trimmed name; a legacy untrimmed
    /// key for the same course is folded into it.
    pub fn toggle(&mut self, course_name: &str, day: &str) -> Vec<String> {
        let key = course_name.trim();
        let mut days = self
            .allowed_days(course_name)
            .map(<[String]>::to_vec)
            .unwrap_or_default();
        if key != course_name {
            self.days.remove(course_name);
        }

        if let Some(pos) = days.iter().position(|d| d == day) {
            days.remove(pos);
        } else {
            days.push(day.to_string());
        }
        self.days.insert(key.to_string(), days.clone());
        days
    }

    /// Drop every key whose trimmed form equals the trimmed target.
    pub fn remove_course(&mut self, course_name: &str) -> usize {
        let target = course_name.trim();
        let before = self.days.len();
        self.days.retain(|key, _| key.trim() != target);
        before - self.days.len()
    }
}

impl FromIterator<(String, Vec<String>)> for CourseDayConfig {
    fn from_iter<T: IntoIterator<Item = (String, Vec<String>)>>(iter: T) -> Self {
        Self {
            days: iter.into_iter().collect(),
        }
    }
}
