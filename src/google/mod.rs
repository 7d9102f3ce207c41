//! Google Calendar: OAuth and the REST API.

pub mod api;
pub mod auth;
mod from_google;
mod to_google;
mod types;
