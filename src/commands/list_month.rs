use anyhow::Result;
use chrono::{Datelike, Local};

use crate::config::Config;
use crate::date_range::DateRange;
use crate::google::api::CalendarClient;
use crate::utils::tui;

/// List every event in a month, defaulting to the current one.
pub async fn run(config: &Config, year: Option<i32>, month: Option<u32>) -> Result<()> {
    let today = Local::now();
    let year = year.unwrap_or_else(|| today.year());
    let month = month.unwrap_or_else(|| today.month());

    // Rejects a bad month before any credential work.
    let range = DateRange::for_month(year, month)?;

    let client = super::connect(config).await?;

    println!("Getting the events in");
    println!("from: {}", range.start_rfc3339());
    println!("  to: {}", range.end_rfc3339());
    println!("{}", fetch(&client, year, month).await?);

    Ok(())
}

async fn fetch(client: &CalendarClient, year: i32, month: u32) -> Result<String> {
    let spinner = tui::create_spinner("Fetching events...".to_string());
    let events = client.list_for_month(year, month).await;
    spinner.finish_and_clear();

    Ok(super::listing(&events?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{client_for, offline_config};
    use crate::error::CalendarError;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn lists_events_in_month() {
        let server = MockServer::start().await;
        let range = DateRange::for_month(2022, 12).unwrap();

        Mock::given(method("GET"))
            .and(path("/calendars/primary/events"))
            .and(query_param("timeMin", range.start_rfc3339().as_str()))
            .and(query_param("timeMax", range.end_rfc3339().as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [{
                    "id": "xmas",
                    "summary": "Christmas Eve",
                    "start": {"date": "2022-12-24"},
                    "end": {"date": "2022-12-25"}
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let output = fetch(&client_for(&server), 2022, 12).await.unwrap();

        assert!(output.contains("| 2022-12-24 | xmas | Christmas Eve |"));
    }

    #[tokio::test]
    async fn invalid_month_fails_before_authenticating() {
        let dir = tempfile::tempdir().unwrap();

        for month in [0, 13] {
            let err = run(&offline_config(&dir), Some(2022), Some(month))
                .await
                .unwrap_err();

            assert!(matches!(
                err.downcast_ref::<CalendarError>(),
                Some(CalendarError::Validation(_))
            ));
        }
        assert!(!dir.path().join("token.json").exists());
    }
}
