use std::sync::LazyLock;

use chrono::{Datelike, Local, NaiveDate};
use regex::Regex;

#[allow(clippy::unwrap_used)] // pattern is a literal
static MONTH_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-(0[1-9]|1[0-2])$").unwrap());

/// Canonical "YYYY-MM" key. Every fetch and every aggregation is scoped to
/// exactly one of these; records from two keys never meet in one model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct MonthKey {
    year: i32,
    month: u32,
}

impl MonthKey {
    pub(crate) fn current() -> MonthKey {
        let now = Local::now();
        MonthKey {
            year: now.year(),
            month: now.month(),
        }
    }

    pub(crate) fn parse(s: &str) -> Option<MonthKey> {
        if !MONTH_KEY.is_match(s.trim()) {
            return None;
        }
        let (year, month) = s.trim().split_once('-')?;
        Some(MonthKey {
            year: year.parse().ok()?,
            month: month.parse().ok()?,
        })
    }

    pub(crate) fn of(date: NaiveDate) -> MonthKey {
        MonthKey {
            year: date.year(),
            month: date.month(),
        }
    }

    pub(crate) fn prev(self) -> MonthKey {
        if self.month == 1 {
            MonthKey {
                year: self.year - 1,
                month: 12,
            }
        } else {
            MonthKey {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    pub(crate) fn next(self) -> MonthKey {
        if self.month == 12 {
            MonthKey {
                year: self.year + 1,
                month: 1,
            }
        } else {
            MonthKey {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    pub(crate) fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl std::fmt::Display for MonthKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}
