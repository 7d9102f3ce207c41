use anyhow::Result;
use owo_colors::OwoColorize;
use tracing::{debug, warn};

use crate::config::Config;
use crate::event::{EventRecord, NewEvent};
use crate::google::api::CalendarClient;
use crate::utils::tui;

pub async fn run(config: &Config, event: NewEvent) -> Result<()> {
    let client = super::connect(config).await?;

    let created = create(&client, &event).await?;
    println!("{}", created_message(&created).green());

    Ok(())
}

async fn create(client: &CalendarClient, event: &NewEvent) -> Result<EventRecord> {
    let spinner = tui::create_spinner("Creating event...".to_string());
    let created = client.create_event(event).await;
    spinner.finish_and_clear();

    let created = created?;
    debug!(
        id = %created.id,
        start = %created.start,
        end = %created.end,
        time_zone = ?created.time_zone,
        location = ?created.location,
        description = ?created.description,
        "Event created"
    );

    Ok(created)
}

fn created_message(created: &EventRecord) -> String {
    match &created.html_link {
        Some(link) => format!("Event created successfully: {}", link),
        None => {
            warn!(id = %created.id, "Calendar API returned no htmlLink for the created event");
            format!(
                "Event created successfully (id: {}), but the service returned no link.",
                created.id
            )
        }
    }
}
