use anyhow::Result;
use owo_colors::OwoColorize;

use crate::config::Config;
use crate::error::CalendarResult;
use crate::event::EventRecord;
use crate::google::api::{CalendarClient, Deletion};
use crate::utils::tui;

/// Delete an event after the user confirms it (skipped with `force`).
pub async fn run(config: &Config, event_id: &str, force: bool) -> Result<()> {
    let client = super::connect(config).await?;

    let spinner = tui::create_spinner("Looking up event...".to_string());
    let deletion = delete(&client, event_id, |record| {
        spinner.finish_and_clear();
        if force {
            Ok(true)
        } else {
            tui::confirm(format!("Do you want to delete this event: {}?", record))
        }
    })
    .await;
    spinner.finish_and_clear();

    match deletion? {
        Deletion::Deleted(record) => println!("{}", deleted_message(&record).green()),
        Deletion::Declined(_) => println!("{}", DECLINED.yellow()),
    }

    Ok(())
}

const DECLINED: &str = "You did not delete the event.";

async fn delete<F>(client: &CalendarClient, event_id: &str, confirm: F) -> Result<Deletion>
where
    F: FnOnce(&EventRecord) -> CalendarResult<bool>,
{
    Ok(client.delete_confirmed(event_id, confirm).await?)
}

fn deleted_message(record: &EventRecord) -> String {
    format!("Event has been deleted successfully: {}", record)
}
