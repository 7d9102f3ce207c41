//! OAuth for installed applications: loopback consent flow and token refresh.

use google_calendar::Client;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info};

use crate::error::{CalendarError, CalendarResult};
use crate::session::{Authorizer, Credential};

const SUCCESS_PAGE: &str = "<html><body>\
    <h1>Authentication successful!</h1>\
    <p>You can close this window and return to the terminal.</p>\
    </body></html>";

const FAILURE_PAGE: &str = "<html><body>\
    <h1>Authentication failed</h1>\
    <p>Return to the terminal for details.</p>\
    </body></html>";

/// The OAuth client downloaded from Google Cloud Console.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
}

/// Console downloads wrap the client in `installed` (desktop) or `web`.
#[derive(Debug, Deserialize)]
struct ClientSecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

impl ClientSecrets {
    pub fn load(path: &Path) -> CalendarResult<Self> {
        if !path.exists() {
            return Err(CalendarError::auth(format!(
                "OAuth client secrets not found at {}.\n\n\
                Create a \"Desktop app\" OAuth client at \
                https://console.cloud.google.com/apis/credentials, \
                download its JSON and save it as {}.",
                path.display(),
                path.display()
            )));
        }

        let contents = std::fs::read_to_string(path).map_err(|e| {
            CalendarError::auth(format!("Failed to read {}: {}", path.display(), e))
        })?;

        Self::from_json(&contents).map_err(|e| {
            CalendarError::auth(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    fn from_json(contents: &str) -> Result<Self, String> {
        let file: ClientSecretsFile = serde_json::from_str(contents).map_err(|e| e.to_string())?;

        file.installed
            .or(file.web)
            .ok_or_else(|| "expected an \"installed\" or \"web\" client".to_string())
    }
}

/// Authorizes against Google using the client secrets file.
pub struct GoogleAuthorizer {
    credentials_path: PathBuf,
}

impl GoogleAuthorizer {
    pub fn new(credentials_path: impl Into<PathBuf>) -> Self {
        GoogleAuthorizer {
            credentials_path: credentials_path.into(),
        }
    }
}

impl Authorizer for GoogleAuthorizer {
    async fn authorize(&self, scopes: &[String]) -> CalendarResult<Credential> {
        let secrets = ClientSecrets::load(&self.credentials_path)?;

        let (listener, port) = bind_callback_listener("127.0.0.1:0").await?;
        let redirect_uri = format!("http://localhost:{}/", port);
        debug!(%redirect_uri, "Listening for OAuth callback");

        let mut client = Client::new(
            secrets.client_id,
            secrets.client_secret,
            redirect_uri,
            String::new(),
            String::new(),
        );

        let auth_url = client.user_consent_url(scopes);

        eprintln!("\nOpen this URL in your browser to authorize evical:\n");
        eprintln!("{}\n", auth_url);

        if open::that(&auth_url).is_err() {
            eprintln!("(Could not open browser automatically, please copy the URL above)");
        }

        let (code, state) = wait_for_callback(&listener).await?;

        info!("Received authorization code, exchanging for tokens");

        let token = client
            .get_access_token(&code, &state)
            .await
            .map_err(|e| CalendarError::auth(format!("Failed to exchange authorization code: {}", e)))?;

        if token.access_token.is_empty() {
            return Err(CalendarError::auth("Google returned no access token"));
        }

        Ok(Credential::from_tokens(
            token.access_token,
            token.refresh_token,
            token.expires_in,
            scopes,
        ))
    }

    async fn refresh(&self, credential: &Credential) -> CalendarResult<Credential> {
        let secrets = ClientSecrets::load(&self.credentials_path)?;

        let client = Client::new(
            secrets.client_id,
            secrets.client_secret,
            String::new(),
            credential.access_token.clone(),
            credential.refresh_token.clone().unwrap_or_default(),
        );

        let token = client
            .refresh_access_token()
            .await
            .map_err(|e| CalendarError::auth(format!("Failed to refresh token: {}", e)))?;

        if token.access_token.is_empty() {
            return Err(CalendarError::auth("Google returned no access token on refresh"));
        }

        Ok(Credential::from_tokens(
            token.access_token,
            token.refresh_token,
            token.expires_in,
            &credential.scopes,
        ))
    }
}

/// Listen for the OAuth redirect, returning the listener and its port.
async fn bind_callback_listener(addr: &str) -> CalendarResult<(TcpListener, u16)> {
    let listen_err =
        |e: std::io::Error| CalendarError::auth(format!("Failed to listen for OAuth callback on {}: {}", addr, e));

    let listener = TcpListener::bind(addr).await.map_err(listen_err)?;
    let port = listener.local_addr().map_err(listen_err)?.port();

    Ok((listener, port))
}

/// What the browser delivered to the redirect URI.
enum Callback {
    Code { code: String, state: String },
    Denied(String),
    Unrelated,
    Malformed,
}

fn parse_callback(request_line: &str) -> Callback {
    let Some(target) = request_line.split_whitespace().nth(1) else {
        return Callback::Malformed;
    };

    let Ok(url) = url::Url::parse(&format!("http://localhost{}", target)) else {
        return Callback::Malformed;
    };

    let param = |name: &str| {
        url.query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.to_string())
    };

    if let Some(error) = param("error") {
        return Callback::Denied(error);
    }

    match param("code") {
        Some(code) => Callback::Code {
            code,
            state: param("state").unwrap_or_default(),
        },
        None => Callback::Unrelated,
    }
}

/// Serve the loopback redirect until the consent result arrives.
/// Other requests (favicons, port scanners) are answered and ignored.
async fn wait_for_callback(listener: &TcpListener) -> CalendarResult<(String, String)> {
    loop {
        let (stream, _) = listener
            .accept()
            .await
            .map_err(|e| CalendarError::auth(format!("Failed to accept OAuth callback: {}", e)))?;

        match answer_request(stream).await {
            Ok(Callback::Code { code, state }) => return Ok((code, state)),
            Ok(Callback::Denied(error)) => {
                return Err(CalendarError::auth(format!("Authorization was denied: {}", error)));
            }
            Ok(Callback::Unrelated | Callback::Malformed) => continue,
            Err(e) => debug!("Ignoring unreadable request on OAuth callback port: {}", e),
        }
    }
}

/// Read one request and reply to it.
async fn answer_request(stream: TcpStream) -> std::io::Result<Callback> {
    let mut reader = BufReader::new(stream);
    let mut request_line = String::new();
    reader.read_line(&mut request_line).await?;

    if request_line.trim().is_empty() {
        return Ok(Callback::Malformed);
    }

    // Drain headers so closing the socket doesn't reset the connection.
    let mut header = String::new();
    while reader.read_line(&mut header).await? > 0 && !header.trim().is_empty() {
        header.clear();
    }

    let callback = parse_callback(&request_line);

    let (status, body) = match &callback {
        Callback::Code { .. } => ("200 OK", SUCCESS_PAGE),
        Callback::Denied(_) => ("200 OK", FAILURE_PAGE),
        Callback::Unrelated => ("404 Not Found", ""),
        Callback::Malformed => ("400 Bad Request", ""),
    };

    let response = format!(
        "HTTP/1.1 {}\r\n\
        Content-Type: text/html\r\n\
        Content-Length: {}\r\n\
        Connection: close\r\n\
        \r\n\
        {}",
        status,
        body.len(),
        body
    );

    // The browser may already be gone; the callback still counts.
    let mut stream = reader.into_inner();
    if let Err(e) = stream.write_all(response.as_bytes()).await {
        debug!("Failed to answer OAuth callback request: {}", e);
    } else if let Err(e) = stream.flush().await {
        debug!("Failed to answer OAuth callback request: {}", e);
    }

    Ok(callback)
}
