//! Error types for evical operations.

use thiserror::Error;

/// Errors that can occur while talking to the calendar or handling credentials.
#[derive(Error, Debug)]
pub enum CalendarError {
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Calendar API error ({status}): {message}")]
    Remote { status: u16, message: String },

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Event not found: {0}")]
    NotFound(String),

    #[error("Unexpected response from calendar API: {0}")]
    Decode(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CalendarError {
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

/// Result type alias for evical operations.
pub type CalendarResult<T> = Result<T, CalendarError>;
