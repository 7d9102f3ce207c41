use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};

use crate::error::{CalendarError, CalendarResult};

pub fn create_spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&["-", "\\", "|", "/"])
            .template("{msg} {spinner}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message);
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    spinner
}

/// Ask a yes/no question on the terminal, defaulting to no.
pub fn confirm(prompt: String) -> CalendarResult<bool> {
    Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(confirm_error)
}

/// Without a terminal dialoguer only says "not a terminal".
fn confirm_error(e: dialoguer::Error) -> CalendarError {
    let io = std::io::Error::from(e);
    CalendarError::Io(std::io::Error::new(
        io.kind(),
        format!("could not read confirmation ({}); pass --force to delete without asking", io),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_terminal_points_at_force() {
        let e = dialoguer::Error::from(std::io::Error::new(std::io::ErrorKind::NotConnected, "not a terminal"));

        let err = confirm_error(e);

        assert!(matches!(err, CalendarError::Io(ref io) if io.kind() == std::io::ErrorKind::NotConnected));
        let message = err.to_string();
        assert!(message.contains("not a terminal"));
        assert!(message.contains("--force"));
    }
}
