//! Google Calendar v3 REST client.

use chrono::{SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use crate::config::Config;
use crate::date_range::DateRange;
use crate::error::{CalendarError, CalendarResult};
use crate::event::{EventRecord, NewEvent};
use crate::google::from_google::{FromGoogle, is_cancelled};
use crate::google::to_google::to_google_event;
use crate::google::types::{ApiErrorBody, ApiEvent, EventList};

/// Largest page `events.list` will return.
const MAX_PAGE_SIZE: usize = 2500;

/// Outcome of a confirmed delete.
#[derive(Debug, Clone, PartialEq)]
pub enum Deletion {
    Deleted(EventRecord),
    Declined(EventRecord),
}

pub struct CalendarClient {
    client: reqwest::Client,
    access_token: String,
    base_url: String,
    calendar_id: String,
}

impl CalendarClient {
    pub fn new(config: &Config, access_token: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            access_token: access_token.to_string(),
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            calendar_id: config.calendar_id.clone(),
        }
    }

    fn events_url(&self) -> String {
        format!(
            "{}/calendars/{}/events",
            self.base_url,
            urlencoding::encode(&self.calendar_id)
        )
    }

    fn event_url(&self, event_id: &str) -> String {
        format!("{}/{}", self.events_url(), urlencoding::encode(event_id))
    }

    /// The next `count` events starting from now, soonest first.
    #[instrument(skip(self), level = "info")]
    pub async fn list_upcoming(&self, count: usize) -> CalendarResult<Vec<EventRecord>> {
        if count == 0 {
            return Err(CalendarError::validation("count must be at least 1"));
        }

        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        self.list_events(vec![("timeMin", now)], Some(count)).await
    }

    /// Every event starting in the given month of the local time zone.
    #[instrument(skip(self), level = "info")]
    pub async fn list_for_month(&self, year: i32, month: u32) -> CalendarResult<Vec<EventRecord>> {
        let range = DateRange::for_month(year, month)?;
        self.list_in_range(&range).await
    }

    /// Every event starting within `range`, soonest first.
    #[instrument(skip(self), level = "info")]
    pub async fn list_in_range(&self, range: &DateRange) -> CalendarResult<Vec<EventRecord>> {
        let query = vec![
            ("timeMin", range.start_rfc3339()),
            ("timeMax", range.end_rfc3339()),
        ];
        self.list_events(query, None).await
    }

    /// Follow `nextPageToken` until `limit` records are collected or the
    /// listing ends.
    async fn list_events(
        &self,
        query: Vec<(&'static str, String)>,
        limit: Option<usize>,
    ) -> CalendarResult<Vec<EventRecord>> {
        let url = self.events_url();
        let mut records = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut params = query.clone();
            params.push(("singleEvents", "true".to_string()));
            params.push(("orderBy", "startTime".to_string()));

            if let Some(limit) = limit {
                let remaining = limit - records.len();
                params.push(("maxResults", remaining.min(MAX_PAGE_SIZE).to_string()));
            }
            if let Some(token) = page_token.take() {
                params.push(("pageToken", token));
            }

            let response = self
                .client
                .get(&url)
                .bearer_auth(&self.access_token)
                .query(&params)
                .send()
                .await?;

            let page: EventList = handle_response(response).await?;
            debug!(items = page.items.len(), "Fetched event page");

            for item in page.items {
                let id = item.id.clone();
                match EventRecord::from_google(item) {
                    Ok(record) => records.push(record),
                    Err(e) => warn!(event_id = %id, "Skipping event: {}", e),
                }
            }

            if let Some(limit) = limit
                && records.len() >= limit
            {
                records.truncate(limit);
                break;
            }

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(records)
    }

    /// Fetch one event. Deleted or unknown ids are `NotFound`.
    #[instrument(skip(self), level = "info")]
    pub async fn get_event(&self, event_id: &str) -> CalendarResult<EventRecord> {
        let response = self
            .client
            .get(self.event_url(event_id))
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        if matches!(response.status().as_u16(), 404 | 410) {
            return Err(CalendarError::NotFound(event_id.to_string()));
        }

        let event: ApiEvent = handle_response(response).await?;

        if is_cancelled(&event) {
            return Err(CalendarError::NotFound(event_id.to_string()));
        }

        EventRecord::from_google(event)
    }

    #[instrument(skip(self, event), fields(title = %event.title), level = "info")]
    pub async fn create_event(&self, event: &NewEvent) -> CalendarResult<EventRecord> {
        let response = self
            .client
            .post(self.events_url())
            .bearer_auth(&self.access_token)
            .json(&to_google_event(event))
            .send()
            .await?;

        let response = check_status(response).await?;

        // Past this point the event exists remotely.
        let may_exist = |e: CalendarError| {
            CalendarError::Decode(format!(
                "the event may have been created, but its details could not be read: {}",
                e
            ))
        };

        let created: ApiEvent = read_json(response).await.map_err(may_exist)?;

        EventRecord::from_google(created).map_err(may_exist)
    }

    #[instrument(skip(self), level = "info")]
    pub async fn delete_event(&self, event_id: &str) -> CalendarResult<()> {
        let response = self
            .client
            .delete(self.event_url(event_id))
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        // Delete returns 204 No Content on success
        check_status(response).await?;
        Ok(())
    }

    /// Look the event up, ask `confirm` about it, and delete it only on yes.
    pub async fn delete_confirmed<F>(&self, event_id: &str, confirm: F) -> CalendarResult<Deletion>
    where
        F: FnOnce(&EventRecord) -> CalendarResult<bool>,
    {
        let record = self.get_event(event_id).await?;

        if !confirm(&record)? {
            debug!(event_id, "Deletion declined");
            return Ok(Deletion::Declined(record));
        }

        self.delete_event(event_id).await?;
        Ok(Deletion::Deleted(record))
    }
}

/// Turn any non-2xx response into `Remote`, preferring Google's own message.
async fn check_status(response: reqwest::Response) -> CalendarResult<reqwest::Response> {
    let status = response.status();

    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ApiErrorBody>(&text) {
        Ok(body) => body.error.message,
        Err(_) if text.trim().is_empty() => status
            .canonical_reason()
            .unwrap_or("no response body")
            .to_string(),
        Err(_) => text,
    };

    Err(CalendarError::Remote {
        status: status.as_u16(),
        message,
    })
}

async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> CalendarResult<T> {
    let response = check_status(response).await?;
    read_json(response).await
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> CalendarResult<T> {
    let text = response.text().await?;

    serde_json::from_str(&text).map_err(|e| CalendarError::Decode(format!("JSON parse error: {}", e)))
}
