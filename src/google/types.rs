//! Wire types for the Google Calendar v3 REST API.
//!
//! Only the fields evical reads or writes are modelled; everything else in
//! the service's JSON is ignored.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

/// An event resource as returned by `events.list`, `events.get` and `events.insert`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEvent {
    #[serde(default)]
    pub id: String,
    pub status: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub html_link: Option<String>,
    pub start: Option<ApiEventDateTime>,
    pub end: Option<ApiEventDateTime>,
}

/// `{date}` for all-day events, `{dateTime, timeZone}` for timed ones.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEventDateTime {
    pub date: Option<NaiveDate>,
    pub date_time: Option<DateTime<FixedOffset>>,
    pub time_zone: Option<String>,
}

/// One page of `events.list`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventList {
    #[serde(default)]
    pub items: Vec<ApiEvent>,
    pub next_page_token: Option<String>,
}

/// Request body for `events.insert`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertEvent {
    pub summary: String,
    pub location: String,
    pub description: String,
    pub start: WallClockTime,
    pub end: WallClockTime,
    pub attendees: Vec<serde_json::Value>,
}

/// A local date-time without offset, interpreted by the service in `time_zone`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WallClockTime {
    pub date_time: String,
    pub time_zone: String,
}

/// Google's JSON error document: `{"error": {"code": 404, "message": "Not Found"}}`.
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorDetail {
    pub message: String,
}
