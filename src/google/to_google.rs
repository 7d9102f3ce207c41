use crate::event::NewEvent;
use crate::google::types::{InsertEvent, WallClockTime};

/// `events.insert` takes wall-clock times plus a zone name, no offset.
const WALL_CLOCK_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

pub fn to_google_event(event: &NewEvent) -> InsertEvent {
    InsertEvent {
        summary: event.title.clone(),
        location: event.location.clone(),
        description: event.description.clone(),
        start: WallClockTime {
            date_time: event.start.format(WALL_CLOCK_FORMAT).to_string(),
            time_zone: event.time_zone.clone(),
        },
        end: WallClockTime {
            date_time: event.end.format(WALL_CLOCK_FORMAT).to_string(),
            time_zone: event.time_zone.clone(),
        },
        attendees: Vec::new(),
    }
}
