use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::course::{Course, DayEntry};

/// Ordered list of day entries. Serialized as a bare JSON array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schedule {
    entries: Vec<DayEntry>,
}

/// Counts reported after a merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeSummary {
    pub days_extended: usize,
    pub days_added: usize,
    pub courses_added: usize,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<DayEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[DayEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<DayEntry> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn course_count(&self) -> usize {
        self.entries.iter().map(|e| e.courses.len()).sum()
    }

    /// Position of the entry holding the same `(day, is_date)` key.
    pub fn position_of(&self, day: &str, is_date: bool) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.is_date == is_date && e.day == day)
    }

    /// First recurring entry whose weekday name matches, ignoring case.
    pub fn recurring_position(&self, weekday_name: &str) -> Option<usize> {
        let needle = weekday_name.to_lowercase();
        self.entries
            .iter()
            .position(|e| !e.is_date && e.day.to_lowercase() == needle)
    }

    /// First dated entry whose day equals the ISO date exactly.
    pub fn dated_position(&self, iso_date: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.is_date && e.day == iso_date)
    }

    /// Fold `incoming` into this schedule by `(day, is_date)` key.
    ///
    /// Matching entries get the incoming courses appended after their own;
    /// unmatched entries are appended at the end. Existing entries are never
    /// reordered and courses are never deduplicated.
    pub fn merge(&mut self, incoming: Schedule) -> MergeSummary {
        let mut summary = MergeSummary::default();
        for entry in incoming.entries {
            summary.courses_added += entry.courses.len();
            match self.position_of(&entry.day, entry.is_date) {
                Some(idx) => {
                    self.entries[idx].courses.extend(entry.courses);
                    summary.days_extended += 1;
                }
                None => {
                    self.entries.push(entry);
                    summary.days_added += 1;
                }
            }
        }
        summary
    }

    /// Remove one course by structural position. Returns the removed course,
    /// or `None` when either index is out of range.
    pub fn remove_instance(&mut self, day_index: usize, course_index: usize) -> Option<Course> {
        let entry = self.entries.get_mut(day_index)?;
        if course_index >= entry.courses.len() {
            return None;
        }
        let removed = entry.courses.remove(course_index);
        if entry.courses.is_empty() {
            self.entries.remove(day_index);
        }
        Some(removed)
    }

    /// Remove every course whose trimmed name equals the trimmed target and
    /// drop the entries left empty. Returns how many courses were removed.
    pub fn remove_course_everywhere(&mut self, course_name: &str) -> usize {
        let target = course_name.trim();
        let mut removed = 0;
        for entry in &mut self.entries {
            let before = entry.courses.len();
            entry.courses.retain(|c| c.key() != target);
            removed += before - entry.courses.len();
        }
        self.entries.retain(|e| !e.courses.is_empty());
        removed
    }

    /// Sorted, unique, trimmed course names; blank names are skipped.
    pub fn course_names(&self) -> Vec<String> {
        self.entries
            .iter()
            .flat_map(|e| e.courses.iter())
            .map(Course::key)
            .filter(|name| !name.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(ToOwned::to_owned)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monday(courses: &[&str]) -> DayEntry {
        DayEntry::recurring("Monday", courses.iter().map(|n| Course::new(*n)).collect())
    }

    #[test]
    fn merge_appends_to_matching_day() {
        let mut schedule = Schedule::from_entries(vec![monday(&["Math"])]);
        let summary = schedule.merge(Schedule::from_entries(vec![monday(&["Physics"])]));

        assert_eq!(schedule.len(), 1);
        let names: Vec<_> = schedule.entries()[0].courses.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Math", "Physics"]);
        assert_eq!(summary.days_extended, 1);
        assert_eq!(summary.days_added, 0);
    }

    #[test]
    fn merge_distinguishes_dated_from_recurring() {
        let mut schedule = Schedule::from_entries(vec![monday(&["Math"])]);
        schedule.merge(Schedule::from_entries(vec![DayEntry::dated(
            "Monday",
            vec![Course::new("Odd")],
        )]));
        assert_eq!(schedule.len(), 2);
    }

    #[test]
    fn merge_collapses_duplicate_keys_within_fragment() {
        let mut schedule = Schedule::new();
        schedule.merge(Schedule::from_entries(vec![monday(&["A"]), monday(&["B"])]));
        assert_eq!(schedule.len(), 1);
        assert_eq!(schedule.entries()[0].courses.len(), 2);
    }

    #[test]
    fn merge_appends_unmatched_entry_even_without_courses() {
        let mut schedule = Schedule::new();
        let summary = schedule.merge(Schedule::from_entries(vec![monday(&[])]));
        assert_eq!(schedule.len(), 1);
        assert!(schedule.entries()[0].courses.is_empty());
        assert_eq!(summary.days_added, 1);

        schedule.merge(Schedule::from_entries(vec![monday(&["Math"])]));
        assert_eq!(schedule.len(), 1);
        assert_eq!(schedule.course_count(), 1);
    }

    #[test]
    fn remove_instance_out_of_range_is_none() {
        let mut schedule = Schedule::from_entries(vec![monday(&["Math"])]);
        assert!(schedule.remove_instance(3, 0).is_none());
        assert!(schedule.remove_instance(0, 1).is_none());
        assert_eq!(schedule.course_count(), 1);
    }

    #[test]
    fn course_names_are_trimmed_sorted_unique() {
        let schedule = Schedule::from_entries(vec![
            monday(&["Physics", " Math", "Math ", "  "]),
            DayEntry::dated("2024-10-05", vec![Course::new("Art")]),
        ]);
        assert_eq!(schedule.course_names(), vec!["Art", "Math", "Physics"]);
    }
}
