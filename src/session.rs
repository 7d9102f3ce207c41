//! Obtains a valid OAuth credential for the Calendar API.
//!
//! The credential is persisted as JSON in the token file. It is reused while
//! valid, refreshed when expired, and recreated through the interactive
//! consent flow when there is nothing usable on disk.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{CalendarError, CalendarResult};

/// A token this close to its expiry is refreshed rather than used.
const EXPIRY_SKEW_SECS: i64 = 60;

/// An authorized user credential. The JSON layout matches the token files
/// written by Google's own client libraries, so existing files keep working.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    #[serde(rename = "token")]
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl Credential {
    pub fn from_tokens(
        access_token: String,
        refresh_token: String,
        expires_in: i64,
        scopes: &[String],
    ) -> Self {
        let expiry = if expires_in > 0 {
            Some(Utc::now() + Duration::seconds(expires_in))
        } else {
            None
        };

        Credential {
            access_token,
            refresh_token: if refresh_token.is_empty() {
                None
            } else {
                Some(refresh_token)
            },
            expiry,
            scopes: scopes.to_vec(),
        }
    }

    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expiry {
            Some(expiry) => now + Duration::seconds(EXPIRY_SKEW_SECS) >= expiry,
            None => false,
        }
    }

    fn covers(&self, scopes: &[String]) -> bool {
        scopes.iter().all(|s| self.scopes.contains(s))
    }

    fn can_refresh(&self) -> bool {
        self.refresh_token.as_deref().is_some_and(|t| !t.is_empty())
    }

    fn is_valid_for(&self, scopes: &[String], now: DateTime<Utc>) -> bool {
        !self.access_token.is_empty() && !self.is_expired(now) && self.covers(scopes)
    }
}

/// Talks to the OAuth server on behalf of the store.
pub trait Authorizer {
    /// Run the interactive consent flow and return a fresh credential.
    fn authorize(&self, scopes: &[String]) -> impl Future<Output = CalendarResult<Credential>>;

    /// Exchange the refresh token of `credential` for a new access token.
    fn refresh(&self, credential: &Credential) -> impl Future<Output = CalendarResult<Credential>>;
}

pub struct CredentialStore<A> {
    token_path: PathBuf,
    scopes: Vec<String>,
    authorizer: A,
}

impl<A: Authorizer> CredentialStore<A> {
    pub fn new(token_path: impl Into<PathBuf>, scopes: Vec<String>, authorizer: A) -> Self {
        CredentialStore {
            token_path: token_path.into(),
            scopes,
            authorizer,
        }
    }

    /// Return a credential that is valid right now, refreshing or running
    /// the consent flow (and persisting the result) as needed.
    pub async fn obtain(&self) -> CalendarResult<Credential> {
        if let Some(credential) = self.load()? {
            if credential.is_valid_for(&self.scopes, Utc::now()) {
                debug!(path = %self.token_path.display(), "Using stored token");
                return Ok(credential);
            }

            if credential.can_refresh() && credential.covers(&self.scopes) {
                info!("Access token expired, refreshing");
                let mut refreshed = self.authorizer.refresh(&credential).await?;

                // Google typically doesn't return a new refresh_token on refresh
                if !refreshed.can_refresh() {
                    refreshed.refresh_token = credential.refresh_token.clone();
                }
                if refreshed.scopes.is_empty() {
                    refreshed.scopes = credential.scopes.clone();
                }

                self.save(&refreshed)?;
                return Ok(refreshed);
            }

            info!("Stored token cannot be refreshed, asking for consent again");
        }

        let credential = self.authorizer.authorize(&self.scopes).await?;
        self.save(&credential)?;
        Ok(credential)
    }

    /// Read the persisted credential, `None` when no token file exists yet.
    pub fn load(&self) -> CalendarResult<Option<Credential>> {
        let path = &self.token_path;

        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(path).map_err(|e| {
            CalendarError::auth(format!("Failed to read token from {}: {}", path.display(), e))
        })?;

        let credential = serde_json::from_str(&contents).map_err(|e| {
            CalendarError::auth(format!(
                "Failed to parse token from {}: {}. Delete the file to sign in again.",
                path.display(),
                e
            ))
        })?;

        Ok(Some(credential))
    }

    /// Write the credential next to the token file and rename it into place.
    pub fn save(&self, credential: &Credential) -> CalendarResult<()> {
        let path = &self.token_path;
        let write_err = |e: std::io::Error| {
            CalendarError::auth(format!("Failed to write token to {}: {}", path.display(), e))
        };

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir).map_err(write_err)?;

        let contents = serde_json::to_string_pretty(credential)
            .map_err(|e| CalendarError::auth(format!("Failed to serialize token: {}", e)))?;

        // NamedTempFile is created owner-only (0600) on unix.
        let mut file = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
        file.write_all(contents.as_bytes()).map_err(write_err)?;
        file.as_file().sync_all().map_err(write_err)?;
        file.persist(path).map_err(|e| write_err(e.error))?;

        debug!(path = %path.display(), "Saved token");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    const SCOPE: &str = "https://www.googleapis.com/auth/calendar";

    fn scopes() -> Vec<String> {
        vec![SCOPE.to_string()]
    }

    fn credential(token: &str, refresh: Option<&str>, expires_in: i64) -> Credential {
        Credential {
            access_token: token.to_string(),
            refresh_token: refresh.map(str::to_string),
            expiry: Some(Utc::now() + Duration::seconds(expires_in)),
            scopes: scopes(),
        }
    }

    #[derive(Default)]
    struct StubAuthorizer {
        authorize_calls: Cell<u32>,
        refresh_calls: Cell<u32>,
        fail_refresh: bool,
    }

    impl Authorizer for StubAuthorizer {
        async fn authorize(&self, scopes: &[String]) -> CalendarResult<Credential> {
            self.authorize_calls.set(self.authorize_calls.get() + 1);
            let mut c = credential("consented", Some("consent-refresh"), 3600);
            c.scopes = scopes.to_vec();
            Ok(c)
        }

        async fn refresh(&self, _credential: &Credential) -> CalendarResult<Credential> {
            self.refresh_calls.set(self.refresh_calls.get() + 1);
            if self.fail_refresh {
                return Err(CalendarError::auth("invalid_grant: Token has been revoked"));
            }
            Ok(Credential {
                access_token: "refreshed".to_string(),
                refresh_token: None,
                expiry: Some(Utc::now() + Duration::seconds(3600)),
                scopes: Vec::new(),
            })
        }
    }

    fn store_in(dir: &tempfile::TempDir, authorizer: StubAuthorizer) -> CredentialStore<StubAuthorizer> {
        CredentialStore::new(dir.path().join("token.json"), scopes(), authorizer)
    }

    #[tokio::test]
    async fn persisted_token_round_trips_without_network() {
        let dir = tempfile::tempdir().unwrap();
        let saved = credential("access-1", Some("refresh-1"), 3600);
        store_in(&dir, StubAuthorizer::default()).save(&saved).unwrap();

        let store = store_in(&dir, StubAuthorizer::default());
        let loaded = store.obtain().await.unwrap();

        assert_eq!(loaded.access_token, "access-1");
        assert_eq!(loaded.refresh_token.as_deref(), Some("refresh-1"));
        assert_eq!(store.authorizer.authorize_calls.get(), 0);
        assert_eq!(store.authorizer.refresh_calls.get(), 0);
    }

    #[tokio::test]
    async fn missing_token_runs_consent_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir, StubAuthorizer::default());

        let obtained = store.obtain().await.unwrap();

        assert_eq!(obtained.access_token, "consented");
        assert_eq!(store.authorizer.authorize_calls.get(), 1);
        assert_eq!(store.load().unwrap(), Some(obtained));
    }

    #[tokio::test]
    async fn expired_token_is_refreshed_and_keeps_refresh_token() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir, StubAuthorizer::default());
        store.save(&credential("stale", Some("refresh-1"), -10)).unwrap();

        let obtained = store.obtain().await.unwrap();

        assert_eq!(obtained.access_token, "refreshed");
        assert_eq!(obtained.refresh_token.as_deref(), Some("refresh-1"));
        assert_eq!(obtained.scopes, scopes());
        assert_eq!(store.authorizer.refresh_calls.get(), 1);
        assert_eq!(store.authorizer.authorize_calls.get(), 0);
        assert_eq!(store.load().unwrap().unwrap().access_token, "refreshed");
    }

    #[tokio::test]
    async fn token_about_to_expire_is_refreshed() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir, StubAuthorizer::default());
        store.save(&credential("nearly", Some("refresh-1"), 30)).unwrap();

        store.obtain().await.unwrap();

        assert_eq!(store.authorizer.refresh_calls.get(), 1);
    }

    #[tokio::test]
    async fn expired_token_without_refresh_token_runs_consent() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir, StubAuthorizer::default());
        store.save(&credential("stale", None, -10)).unwrap();

        let obtained = store.obtain().await.unwrap();

        assert_eq!(obtained.access_token, "consented");
        assert_eq!(store.authorizer.refresh_calls.get(), 0);
        assert_eq!(store.authorizer.authorize_calls.get(), 1);
    }

    #[tokio::test]
    async fn narrower_scopes_run_consent() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir, StubAuthorizer::default());
        let mut readonly = credential("ro", Some("refresh-1"), 3600);
        readonly.scopes = vec!["https://www.googleapis.com/auth/calendar.readonly".to_string()];
        store.save(&readonly).unwrap();

        let obtained = store.obtain().await.unwrap();

        assert_eq!(obtained.access_token, "consented");
        assert_eq!(obtained.scopes, scopes());
        assert_eq!(store.authorizer.refresh_calls.get(), 0);
    }

    #[tokio::test]
    async fn refresh_failure_is_an_auth_error() {
        let dir = tempfile::tempdir().unwrap();
        let authorizer = StubAuthorizer {
            fail_refresh: true,
            ..Default::default()
        };
        let store = store_in(&dir, authorizer);
        store.save(&credential("stale", Some("revoked"), -10)).unwrap();

        let err = store.obtain().await.unwrap_err();

        assert!(matches!(err, CalendarError::Auth(ref m) if m.contains("revoked")));
        assert_eq!(store.authorizer.authorize_calls.get(), 0);
        assert_eq!(store.load().unwrap().unwrap().access_token, "stale");
    }

    #[tokio::test]
    async fn corrupt_token_file_is_an_auth_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("token.json"), "{not json").unwrap();
        let store = store_in(&dir, StubAuthorizer::default());

        let err = store.obtain().await.unwrap_err();

        assert!(matches!(err, CalendarError::Auth(ref m) if m.contains("token.json")));
        assert_eq!(store.authorizer.authorize_calls.get(), 0);
    }

    #[test]
    fn reads_token_files_from_google_client_libraries() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("token.json"),
            r#"{"token": "ya29.abc", "refresh_token": "1//xyz",
                "token_uri": "https://oauth2.googleapis.com/token",
                "client_id": "id.apps.googleusercontent.com", "client_secret": "secret",
                "scopes": ["https://www.googleapis.com/auth/calendar"],
                "expiry": "2099-10-10T18:00:00.123456Z"}"#,
        )
        .unwrap();

        let loaded = store_in(&dir, StubAuthorizer::default()).load().unwrap().unwrap();

        assert_eq!(loaded.access_token, "ya29.abc");
        assert_eq!(loaded.refresh_token.as_deref(), Some("1//xyz"));
        assert!(loaded.is_valid_for(&scopes(), Utc::now()));
    }

    #[test]
    fn save_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(
            dir.path().join("nested").join("token.json"),
            scopes(),
            StubAuthorizer::default(),
        );

        store.save(&credential("a", None, 3600)).unwrap();

        assert!(dir.path().join("nested").join("token.json").exists());
    }

    #[test]
    fn from_tokens_treats_empty_refresh_token_as_missing() {
        let c = Credential::from_tokens("a".into(), String::new(), 3599, &scopes());
        assert!(!c.can_refresh());
        assert!(c.expiry.is_some());

        let c = Credential::from_tokens("a".into(), "r".into(), 0, &scopes());
        assert!(c.can_refresh());
        assert!(c.expiry.is_none());
    }
}
