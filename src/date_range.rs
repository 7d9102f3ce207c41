//! Month boundaries for the month listing query.

use chrono::{DateTime, Duration, FixedOffset, Local, LocalResult, NaiveDate, SecondsFormat, TimeZone};

use crate::error::{CalendarError, CalendarResult};

/// Inclusive time window covering one calendar month in some time zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

impl DateRange {
    /// The month in the system's local time zone.
    pub fn for_month(year: i32, month: u32) -> CalendarResult<Self> {
        Self::for_month_in(year, month, &Local)
    }

    /// First instant of the month up to one millisecond before the first
    /// instant of the next month, both in `tz`.
    pub fn for_month_in<Tz: TimeZone>(year: i32, month: u32, tz: &Tz) -> CalendarResult<Self> {
        if !(1..=12).contains(&month) {
            return Err(CalendarError::validation(format!(
                "month must be between 1 and 12, got {}",
                month
            )));
        }

        let (next_year, next_month) = if month < 12 {
            (year, month + 1)
        } else {
            let next_year = year.checked_add(1).ok_or_else(|| {
                CalendarError::validation(format!("year {} is out of range", year))
            })?;
            (next_year, 1)
        };

        let start = start_of_month(year, month, tz)?;
        let end = start_of_month(next_year, next_month, tz)? - Duration::milliseconds(1);

        Ok(DateRange { start, end })
    }

    pub fn start_rfc3339(&self) -> String {
        self.start.to_rfc3339_opts(SecondsFormat::Millis, false)
    }

    pub fn end_rfc3339(&self) -> String {
        self.end.to_rfc3339_opts(SecondsFormat::Millis, false)
    }
}

/// Midnight on the first of the month. When midnight falls in a DST gap the
/// first valid instant after it is used.
fn start_of_month<Tz: TimeZone>(year: i32, month: u32, tz: &Tz) -> CalendarResult<DateTime<FixedOffset>> {
    let date = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
        CalendarError::validation(format!("{}-{:02} is not a valid month", year, month))
    })?;

    // DST gaps are at most a few hours wide.
    for minutes in (0..=180).step_by(15) {
        let naive = date.and_hms_opt(0, 0, 0).map(|m| m + Duration::minutes(minutes));
        let Some(naive) = naive else { break };

        match tz.from_local_datetime(&naive) {
            LocalResult::Single(dt) => return Ok(dt.fixed_offset()),
            LocalResult::Ambiguous(earliest, _) => return Ok(earliest.fixed_offset()),
            LocalResult::None => continue,
        }
    }

    Err(CalendarError::validation(format!(
        "no valid local time at the start of {}-{:02}",
        year, month
    )))
}
