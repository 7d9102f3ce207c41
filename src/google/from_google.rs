use crate::error::{CalendarError, CalendarResult};
use crate::event::{EventRecord, EventTime};
use crate::google::types::{ApiEvent, ApiEventDateTime};

pub trait FromGoogle {
    fn from_google(event: ApiEvent) -> CalendarResult<Self>
    where
        Self: Sized;
}

impl FromGoogle for EventRecord {
    fn from_google(event: ApiEvent) -> CalendarResult<Self> {
        let start = event_time(event.start.as_ref())
            .ok_or_else(|| missing_field(&event.id, "start"))?;

        let end = event_time(event.end.as_ref())
            .ok_or_else(|| missing_field(&event.id, "end"))?;

        let time_zone = event.start.and_then(|s| s.time_zone);

        Ok(EventRecord {
            id: event.id,
            title: EventRecord::title_or_placeholder(event.summary),
            start,
            end,
            time_zone,
            location: event.location.filter(|l| !l.is_empty()),
            description: event.description.filter(|d| !d.is_empty()),
            html_link: event.html_link.filter(|l| !l.is_empty()),
        })
    }
}

/// Prefer the timed form; all-day events only carry `date`.
fn event_time(value: Option<&ApiEventDateTime>) -> Option<EventTime> {
    let value = value?;

    if let Some(dt) = value.date_time {
        Some(EventTime::DateTime(dt))
    } else {
        value.date.map(EventTime::Date)
    }
}

fn missing_field(event_id: &str, field: &str) -> CalendarError {
    CalendarError::Decode(format!("event '{}' has no {} time", event_id, field))
}

/// Whether the service reports the event as deleted.
pub fn is_cancelled(event: &ApiEvent) -> bool {
    event.status.as_deref() == Some("cancelled")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn api_event(json: serde_json::Value) -> ApiEvent {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn timed_event_keeps_service_offset() {
        let record = EventRecord::from_google(api_event(serde_json::json!({
            "id": "evt1",
            "summary": "Standup",
            "htmlLink": "https://www.google.com/calendar/event?eid=abc",
            "start": {"dateTime": "2022-10-10T18:00:00+03:00", "timeZone": "Europe/Helsinki"},
            "end": {"dateTime": "2022-10-10T18:15:00+03:00", "timeZone": "Europe/Helsinki"}
        })))
        .unwrap();

        assert_eq!(record.id, "evt1");
        assert_eq!(record.title, "Standup");
        assert_eq!(record.start.to_string(), "2022-10-10T18:00:00+03:00");
        assert_eq!(record.time_zone.as_deref(), Some("Europe/Helsinki"));
        assert!(record.html_link.is_some());
    }

    #[test]
    fn all_day_event_uses_date() {
        let record = EventRecord::from_google(api_event(serde_json::json!({
            "id": "evt2",
            "summary": "Holiday",
            "start": {"date": "2022-12-24"},
            "end": {"date": "2022-12-25"}
        })))
        .unwrap();

        assert_eq!(
            record.start,
            EventTime::Date(NaiveDate::from_ymd_opt(2022, 12, 24).unwrap())
        );
        assert_eq!(record.time_zone, None);
    }

    #[test]
    fn untitled_and_blank_fields() {
        let record = EventRecord::from_google(api_event(serde_json::json!({
            "id": "evt3",
            "location": "",
            "start": {"date": "2022-12-24"},
            "end": {"date": "2022-12-25"}
        })))
        .unwrap();

        assert_eq!(record.title, "(No title)");
        assert_eq!(record.location, None);
        assert_eq!(record.description, None);
    }

    #[test]
    fn missing_start_is_a_decode_error() {
        let err = EventRecord::from_google(api_event(serde_json::json!({
            "id": "evt4",
            "start": {},
            "end": {"date": "2022-12-25"}
        })))
        .unwrap_err();

        assert!(matches!(err, CalendarError::Decode(ref m) if m.contains("evt4")));
    }

    #[test]
    fn detects_cancelled_events() {
        assert!(is_cancelled(&api_event(serde_json::json!({"id": "x", "status": "cancelled"}))));
        assert!(!is_cancelled(&api_event(serde_json::json!({"id": "x", "status": "confirmed"}))));
        assert!(!is_cancelled(&ApiEvent::default()));
    }
}
