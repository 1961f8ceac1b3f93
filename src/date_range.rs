// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Sync ranges and the calendar months that cover them

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use std::fmt;

/// Inclusive range of workout start instants to sync
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncRange {
    pub begin: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl SyncRange {
    pub fn new(begin: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { begin, end }
    }

    /// Whether `instant` lies in `[begin, end]`
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.begin && instant <= self.end
    }

    /// Whether `date` lies within the date-only portion of the range
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= date_only(self.begin) && date <= date_only(self.end)
    }

    /// Calendar months covering the range, see [`month_buckets`]
    pub fn months(&self) -> Vec<MonthBucket> {
        month_buckets(self.begin, self.end)
    }
}

impl fmt::Display for SyncRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.begin.to_rfc3339(), self.end.to_rfc3339())
    }
}

/// A single calendar month, as keyed by the provider's dashboard listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MonthBucket {
    pub year: i32,
    pub month: u32,
}

impl MonthBucket {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    fn next(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }
}

impl fmt::Display for MonthBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Every calendar month from `begin`'s month through `end`'s month, inclusive
///
/// Always returns at least `begin`'s month, even when `end` precedes it.
pub fn month_buckets(begin: DateTime<Utc>, end: DateTime<Utc>) -> Vec<MonthBucket> {
    let last = MonthBucket::of(date_only(end));
    let mut current = MonthBucket::of(date_only(begin));

    let mut buckets = vec![current];
    while current < last {
        current = current.next();
        buckets.push(current);
    }
    buckets
}

/// The UTC calendar date of an instant
pub fn date_only(instant: DateTime<Utc>) -> NaiveDate {
    instant.date_naive()
}
