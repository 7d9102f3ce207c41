//! Runtime configuration.
//!
//! Defaults match a plain checkout: the OAuth client secret and the token
//! file live in the working directory. An optional `evical.toml` next to them
//! can override any field, and the global command-line flags override both.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "evical.toml";

pub const DEFAULT_CREDENTIALS_PATH: &str = "credentials.json";
pub const DEFAULT_TOKEN_PATH: &str = "token.json";

/// Google's alias for the user's main calendar
pub const DEFAULT_CALENDAR_ID: &str = "primary";

pub const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

pub const DEFAULT_SCOPES: &[&str] = &["https://www.googleapis.com/auth/calendar"];

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Operator-provided OAuth client secret (Google "Desktop app" download)
    pub credentials_path: PathBuf,
    /// Where the authorized user token is persisted
    pub token_path: PathBuf,
    pub calendar_id: String,
    pub scopes: Vec<String>,
    pub api_base_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            credentials_path: PathBuf::from(DEFAULT_CREDENTIALS_PATH),
            token_path: PathBuf::from(DEFAULT_TOKEN_PATH),
            calendar_id: DEFAULT_CALENDAR_ID.to_string(),
            scopes: DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
            api_base_url: CALENDAR_API_BASE.to_string(),
        }
    }
}

/// Fields accepted in `evical.toml`. Everything is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    credentials_path: Option<PathBuf>,
    token_path: Option<PathBuf>,
    calendar_id: Option<String>,
    scopes: Option<Vec<String>>,
}

/// Values given as global command-line flags.
#[derive(Debug, Default)]
pub struct Overrides {
    pub credentials_path: Option<PathBuf>,
    pub token_path: Option<PathBuf>,
    pub calendar_id: Option<String>,
}

impl Config {
    /// Load `evical.toml` from the working directory (if present) and apply overrides.
    pub fn load(overrides: Overrides) -> Result<Self> {
        let mut config = Self::from_file(Path::new(CONFIG_FILE))?;
        config.apply(overrides);
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    fn from_toml(contents: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(contents)?;
        let defaults = Config::default();

        let scopes = file.scopes.unwrap_or(defaults.scopes);
        if scopes.is_empty() {
            anyhow::bail!("scopes must list at least one OAuth scope");
        }

        Ok(Config {
            credentials_path: file.credentials_path.unwrap_or(defaults.credentials_path),
            token_path: file.token_path.unwrap_or(defaults.token_path),
            calendar_id: file.calendar_id.unwrap_or(defaults.calendar_id),
            scopes,
            api_base_url: defaults.api_base_url,
        })
    }

    fn apply(&mut self, overrides: Overrides) {
        if let Some(path) = overrides.credentials_path {
            self.credentials_path = path;
        }
        if let Some(path) = overrides.token_path {
            self.token_path = path;
        }
        if let Some(id) = overrides.calendar_id {
            self.calendar_id = id;
        }
    }
}
