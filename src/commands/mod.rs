pub mod add_event;
pub mod delete_event;
pub mod list_month;
pub mod list_upcoming;

use anyhow::Result;

use crate::config::Config;
use crate::event::EventRecord;
use crate::google::api::CalendarClient;
use crate::google::auth::GoogleAuthorizer;
use crate::render::{EventRow, render_table};
use crate::session::CredentialStore;

/// Shown in place of a table when a listing comes back empty.
pub const NO_EVENTS: &str = "No upcoming events found.";

/// Obtain a credential (refreshing or asking for consent as needed) and build
/// an API client from it.
pub async fn connect(config: &Config) -> Result<CalendarClient> {
    let store = CredentialStore::new(
        config.token_path.clone(),
        config.scopes.clone(),
        GoogleAuthorizer::new(config.credentials_path.clone()),
    );

    let credential = store.obtain().await?;
    Ok(CalendarClient::new(config, &credential.access_token))
}

/// Table of events, or the empty-listing message.
pub fn listing(events: &[EventRecord]) -> String {
    if events.is_empty() {
        return NO_EVENTS.to_string();
    }

    let rows: Vec<EventRow> = events.iter().map(EventRow::from).collect();
    render_table(&rows)
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CalendarError;

    #[test]
    fn empty_listing_prints_message() {
        assert_eq!(listing(&[]), "No upcoming events found.");
    }

    #[tokio::test]
    async fn connect_without_client_secrets_explains_setup() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_support::offline_config(&dir);

        let err = connect(&config).await.err().unwrap();

        let err = err.downcast_ref::<CalendarError>().unwrap();
        assert!(matches!(err, CalendarError::Auth(m) if m.contains("credentials.json")));
    }
}
