//! Month and work-window arithmetic in the configured timezone.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::config::SlotConfig;
use crate::dst::DstPolicy;
use crate::error::{Result, SlotError};
use crate::interval::Interval;

/// A calendar month, written `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Month {
    year: i32,
    month: u32,
}

impl Month {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(SlotError::InvalidMonth(format!("{year:04}-{month:02}")));
        }
        Ok(Self { year, month })
    }

    /// Parse `YYYY-MM`.
    pub fn parse(s: &str) -> Result<Self> {
        let invalid = || SlotError::InvalidMonth(s.to_string());
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Month::new(year, month).map_err(|_| invalid())
    }

    /// The month containing `date`.
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn next(&self) -> Month {
        if self.month == 12 {
            Month {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Month {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// Every day of the month in order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let month = self.month;
        self.first_day()
            .iter_days()
            .take_while(move |d| d.month() == month)
    }

    pub fn len_days(&self) -> usize {
        self.days().count()
    }

    /// The month as an absolute range: local midnight on the 1st up to local
    /// midnight on the 1st of the following month.
    pub fn query_range<Tz: TimeZone>(&self, tz: &Tz) -> Result<Interval> {
        let start = local_midnight(tz, self.first_day())?;
        let end = local_midnight(tz, self.next().first_day())?;
        Interval::new(start, end)
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Month {
    type Err = SlotError;

    fn from_str(s: &str) -> Result<Self> {
        Month::parse(s)
    }
}

/// Midnight can fall into a DST gap in some zones (e.g. America/Santiago);
/// shift forward rather than fail.
fn local_midnight<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> Result<chrono::DateTime<Utc>> {
    date.and_hms_opt(0, 0, 0)
        .and_then(|midnight| DstPolicy::ShiftForward.resolve(tz, midnight))
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| SlotError::InvalidMonth(format!("no local midnight on {date}")))
}

/// The absolute work window for `date`, or `None` when the configured
/// wall-clock bounds cannot be resolved under the DST policy.
pub fn work_window(date: NaiveDate, config: &SlotConfig) -> Option<Interval> {
    work_window_in(
        &config.time_zone,
        date,
        config.work_start,
        config.work_end,
        config.dst_policy,
    )
}

pub fn work_window_in<Tz: TimeZone>(
    tz: &Tz,
    date: NaiveDate,
    start: NaiveTime,
    end: NaiveTime,
    policy: DstPolicy,
) -> Option<Interval> {
    let start = policy.resolve(tz, date.and_time(start))?.with_timezone(&Utc);
    let end = policy.resolve(tz, date.and_time(end))?.with_timezone(&Utc);
    // Both bounds may collapse onto the same instant inside a DST gap.
    Interval::new(start, end).ok()
}
