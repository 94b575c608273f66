use chrono::NaiveDate;
use serde::Serialize;

use crate::calendar::{DayLocale, iso_date};
use crate::course::Course;
use crate::day_config::CourseDayConfig;
use crate::schedule::Schedule;

/// A course shown for a day, tagged with where it lives in the schedule so it
/// can be deleted by position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewItem {
    pub course: Course,
    pub day_index: usize,
    pub course_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayView {
    pub date: NaiveDate,
    pub weekday: String,
    pub items: Vec<ViewItem>,
}

impl DayView {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn course_names(&self) -> Vec<&str> {
        self.items.iter().map(|i| i.course.name.as_str()).collect()
    }
}

/// Courses to show on `date`: the recurring weekday entry first, then the
/// entry dated exactly `date`, filtered by the visibility config.
pub fn view_for_date(
    schedule: &Schedule,
    config: &CourseDayConfig,
    locale: DayLocale,
    date: NaiveDate,
) -> DayView {
    let weekday = locale.name_for_date(date);
    let date_key = iso_date(date);

    let sources = [
        schedule.recurring_position(weekday),
        schedule.dated_position(&date_key),
    ];

    let items = sources
        .into_iter()
        .flatten()
        .flat_map(|day_index| {
            schedule.entries()[day_index]
                .courses
                .iter()
                .enumerate()
                .map(move |(course_index, course)| (day_index, course_index, course))
        })
        .filter(|(_, _, course)| config.is_visible_on(&course.name, weekday))
        .map(|(day_index, course_index, course)| ViewItem {
            course: course.clone(),
            day_index,
            course_index,
        })
        .collect();

    DayView {
        date,
        weekday: weekday.to_string(),
        items,
    }
}
