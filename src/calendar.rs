use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Language used for weekday names in recurring day entries and in the
/// per-course visibility config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayLocale {
    #[default]
    #[serde(alias = "tr", alias = "tr-tr", alias = "tr-TR")]
    Turkish,
    #[serde(alias = "en", alias = "en-us", alias = "en-US", alias = "en-gb", alias = "en-GB")]
    English,
}

impl DayLocale {
    /// Long weekday name, e.g. `Pazartesi` or `Monday`.
    pub fn weekday_name(self, weekday: Weekday) -> &'static str {
        match self {
            DayLocale::Turkish => match weekday {
                Weekday::Mon => "Pazartesi",
                Weekday::Tue => "Salı",
                Weekday::Wed => "Çarşamba",
                Weekday::Thu => "Perşembe",
                Weekday::Fri => "Cuma",
                Weekday::Sat => "Cumartesi",
                Weekday::Sun => "Pazar",
            },
            DayLocale::English => match weekday {
                Weekday::Mon => "Monday",
                Weekday::Tue => "Tuesday",
                Weekday::Wed => "Wednesday",
                Weekday::Thu => "Thursday",
                Weekday::Fri => "Friday",
                Weekday::Sat => "Saturday",
                Weekday::Sun => "Sunday",
            },
        }
    }

    pub fn name_for_date(self, date: NaiveDate) -> &'static str {
        self.weekday_name(date.weekday())
    }

    /// Resolve a long weekday name back to a `Weekday`, ignoring case.
    pub fn parse_weekday(self, input: &str) -> Option<Weekday> {
        let needle = input.trim().to_lowercase();
        WEEK.into_iter()
            .find(|wd| self.weekday_name(*wd).to_lowercase() == needle)
    }

    /// Monday-first list of all seven names.
    pub fn week(self) -> Vec<&'static str> {
        WEEK.iter().map(|wd| self.weekday_name(*wd)).collect()
    }

    /// Monday to Friday.
    pub fn school_week(self) -> Vec<&'static str> {
        WEEK[..5].iter().map(|wd| self.weekday_name(*wd)).collect()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DayLocale::Turkish => "tr",
            DayLocale::English => "en",
        }
    }
}

impl fmt::Display for DayLocale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DayLocale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tr" | "tr-tr" | "turkish" => Ok(DayLocale::Turkish),
            "en" | "en-us" | "en-gb" | "english" => Ok(DayLocale::English),
            other => Err(format!("unknown day locale '{other}'")),
        }
    }
}

pub fn iso_date(date: NaiveDate) -> String {
    date.format(ISO_DATE_FORMAT).to_string()
}

pub fn parse_iso_date(input: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), ISO_DATE_FORMAT).ok()
}
