//! Google API configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{ProviderError, ProviderResult};

/// OAuth 2.0 client credentials.
///
/// Users must register their own OAuth client in the Google Cloud Console;
/// Google does not allow shared desktop client secrets.
#[derive(Debug, Clone)]
pub struct OAuthCredentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Structure of Google's OAuth credentials JSON file.
///
/// Supports the Cloud Console layout (an `installed` or `web` section) and
/// a flat layout with `client_id`/`client_secret` at the root.
#[derive(Debug, Deserialize)]
struct CredentialsFile {
    installed: Option<NestedCredentials>,
    web: Option<NestedCredentials>,
    client_id: Option<String>,
    client_secret: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NestedCredentials {
    client_id: String,
    client_secret: String,
}

impl OAuthCredentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Loads credentials from a client-secret JSON file (`credentials.json`).
    pub fn from_file(path: impl AsRef<Path>) -> ProviderResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ProviderError::configuration(format!(
                "failed to read credentials file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&content)
    }

    /// Parses credentials from a client-secret JSON string.
    pub fn from_json(json: &str) -> ProviderResult<Self> {
        let file: CredentialsFile = serde_json::from_str(json).map_err(|e| {
            ProviderError::configuration(format!("failed to parse credentials JSON: {}", e))
        })?;

        if let Some(creds) = file.installed.or(file.web) {
            return Ok(Self::new(creds.client_id, creds.client_secret));
        }

        if let (Some(client_id), Some(client_secret)) = (file.client_id, file.client_secret) {
            return Ok(Self::new(client_id, client_secret));
        }

        Err(ProviderError::configuration(
            "credentials file must contain an 'installed'/'web' section or 'client_id'/'client_secret' at root level",
        ))
    }

    /// Checks that the credentials look like a Google OAuth client.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.client_id.is_empty() {
            return Err("client_id is required");
        }
        if !self.client_id.ends_with(".apps.googleusercontent.com") {
            return Err("client_id should end with .apps.googleusercontent.com");
        }
        if self.client_secret.is_empty() {
            return Err("client_secret is required");
        }
        Ok(())
    }
}

/// Endpoints for the Google services. Overridable for tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleEndpoints {
    /// Consent page for the authorization code flow.
    pub auth_url: String,
    /// Token exchange and refresh endpoint.
    pub token_url: String,
    /// Base for Drive and Calendar (`/drive/v3`, `/upload/drive/v3`,
    /// `/calendar/v3`).
    pub api_base: String,
    /// Base for Gmail (`/gmail/v1`).
    pub gmail_base: String,
}

impl Default for GoogleEndpoints {
    fn default() -> Self {
        Self {
            auth_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            api_base: "https://www.googleapis.com".to_string(),
            gmail_base: "https://gmail.googleapis.com".to_string(),
        }
    }
}

impl GoogleEndpoints {
    /// Points every endpoint at a single base URL.
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            auth_url: format!("{}/o/oauth2/v2/auth", base),
            token_url: format!("{}/token", base),
            api_base: base.to_string(),
            gmail_base: base.to_string(),
        }
    }
}

/// Configuration shared by the Google session and API clients.
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub credentials: OAuthCredentials,

    /// Where the token record is persisted. Defaults to `token.json` in the
    /// working directory.
    pub token_path: PathBuf,

    /// Request timeout for every HTTP call.
    pub timeout: Duration,

    pub user_agent: String,

    /// Port range for the loopback OAuth redirect.
    pub loopback_port_range: (u16, u16),

    /// Scopes requested in a single consent covering Drive, Calendar and
    /// Gmail.
    pub scopes: Vec<String>,

    pub endpoints: GoogleEndpoints,
}

impl GoogleConfig {
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    pub const DEFAULT_TOKEN_FILE: &'static str = "token.json";

    pub const DRIVE_FILE_SCOPE: &'static str = "https://www.googleapis.com/auth/drive.file";
    pub const CALENDAR_SCOPE: &'static str = "https://www.googleapis.com/auth/calendar";
    pub const GMAIL_SEND_SCOPE: &'static str = "https://www.googleapis.com/auth/gmail.send";

    pub fn new(credentials: OAuthCredentials) -> Self {
        Self {
            credentials,
            token_path: PathBuf::from(Self::DEFAULT_TOKEN_FILE),
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            user_agent: format!("driveinvite/{}", env!("CARGO_PKG_VERSION")),
            loopback_port_range: (8080, 8090),
            scopes: Self::default_scopes(),
            endpoints: GoogleEndpoints::default(),
        }
    }

    /// Drive (app-created files), Calendar and Gmail send.
    pub fn default_scopes() -> Vec<String> {
        vec![
            Self::DRIVE_FILE_SCOPE.to_string(),
            Self::CALENDAR_SCOPE.to_string(),
            Self::GMAIL_SEND_SCOPE.to_string(),
        ]
    }

    pub fn with_token_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_path = path.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_loopback_port_range(mut self, start: u16, end: u16) -> Self {
        self.loopback_port_range = (start, end);
        self
    }

    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    pub fn with_endpoints(mut self, endpoints: GoogleEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        self.credentials
            .validate()
            .map_err(|e| format!("invalid credentials: {}", e))?;

        if self.scopes.is_empty() {
            return Err("at least one OAuth scope is required".to_string());
        }

        if self.loopback_port_range.0 > self.loopback_port_range.1 {
            return Err("invalid loopback port range".to_string());
        }

        Ok(())
    }
}
