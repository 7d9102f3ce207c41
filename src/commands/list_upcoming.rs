use anyhow::Result;

use crate::config::Config;
use crate::error::CalendarError;
use crate::google::api::CalendarClient;
use crate::utils::tui;

pub async fn run(config: &Config, count: usize) -> Result<()> {
    if count == 0 {
        return Err(CalendarError::validation("number of events must be at least 1").into());
    }

    let client = super::connect(config).await?;

    println!("Getting the upcoming {} events", count);
    println!("{}", fetch(&client, count).await?);

    Ok(())
}

async fn fetch(client: &CalendarClient, count: usize) -> Result<String> {
    let spinner = tui::create_spinner("Fetching events...".to_string());
    let events = client.list_upcoming(count).await;
    spinner.finish_and_clear();

    Ok(super::listing(&events?))
}
