//! Calendar event types shared by the API client, the commands and the table renderer.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, SecondsFormat};

use crate::error::{CalendarError, CalendarResult};

/// Literal format accepted for event start/end on the command line (24-hour clock).
pub const EVENT_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Title shown for events that have no summary.
const UNTITLED: &str = "(No title)";

/// Start or end of an event: a whole day, or an instant with the offset the
/// service reported for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventTime {
    Date(NaiveDate),
    DateTime(DateTime<FixedOffset>),
}

impl fmt::Display for EventTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventTime::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            EventTime::DateTime(dt) => {
                write!(f, "{}", dt.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
        }
    }
}

/// An event as returned by the calendar service.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    pub id: String,
    pub title: String,
    pub start: EventTime,
    pub end: EventTime,
    pub time_zone: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    /// Shareable link to the event in the calendar web UI
    pub html_link: Option<String>,
}

impl EventRecord {
    pub fn title_or_placeholder(summary: Option<String>) -> String {
        match summary {
            Some(s) if !s.is_empty() => s,
            _ => UNTITLED.to_string(),
        }
    }
}

impl fmt::Display for EventRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.start, self.title)
    }
}

/// A validated event ready to be sent to the service.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    pub title: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    /// IANA time zone name the wall-clock start/end are expressed in
    pub time_zone: String,
    pub location: String,
    pub description: String,
}

impl NewEvent {
    /// Build an event from command-line input, rejecting anything the service
    /// would refuse before a request is made.
    pub fn parse(
        title: String,
        start: &str,
        end: &str,
        time_zone: String,
        location: String,
        description: String,
    ) -> CalendarResult<Self> {
        let start = parse_event_datetime(start)?;
        let end = parse_event_datetime(end)?;

        if end < start {
            return Err(CalendarError::validation(format!(
                "end ({}) is before start ({})",
                end.format(EVENT_DATETIME_FORMAT),
                start.format(EVENT_DATETIME_FORMAT)
            )));
        }

        if chrono_tz::Tz::from_str(&time_zone).is_err() {
            return Err(CalendarError::validation(format!(
                "unknown time zone '{}', expected an IANA name such as Europe/Helsinki",
                time_zone
            )));
        }

        Ok(NewEvent {
            title,
            start,
            end,
            time_zone,
            location,
            description,
        })
    }
}

/// Parse `YYYY-MM-DD HH:MM` into a wall-clock date-time.
pub fn parse_event_datetime(input: &str) -> CalendarResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(input.trim(), EVENT_DATETIME_FORMAT).map_err(|_| {
        CalendarError::validation(format!(
            "could not parse date/time \"{}\", expected format like 2022-10-10 18:00",
            input
        ))
    })
}

/// IANA name of the system time zone, `UTC` when it cannot be determined.
pub fn local_timezone_name() -> String {
    iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string())
}
