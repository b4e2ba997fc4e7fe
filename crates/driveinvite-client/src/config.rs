//! Client configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/driveinvite/config.toml` by default.
//!
//! Credential values (`client_id`, `client_secret`) support secret references:
//! - `pass::path/in/store`: resolved via `pass show`
//! - `env::VAR_NAME`: resolved from the environment
//! - plain text: used as-is

use std::path::{Path, PathBuf};
use std::time::Duration;

use driveinvite_providers::{EventNotifier, FolderSynchronizer};
use driveinvite_providers::google::{GoogleConfig, OAuthCredentials};
use serde::{Deserialize, Serialize};

/// Configuration for the driveinvite client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Google OAuth settings.
    pub google: GoogleSettings,

    /// Drive settings.
    pub drive: DriveSettings,

    /// Invitation settings.
    pub invite: InviteSettings,
}

/// Google OAuth settings.
///
/// Credentials come either from a client-secret JSON file or from inline
/// `client_id`/`client_secret` values, which support secret references.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleSettings {
    /// Path to the Google Cloud Console `credentials.json`.
    pub credentials_file: Option<PathBuf>,

    /// OAuth client ID (supports `pass::` and `env::` prefixes).
    pub client_id: Option<String>,

    /// OAuth client secret (supports `pass::` and `env::` prefixes).
    pub client_secret: Option<String>,

    /// Path to token storage.
    pub token_path: Option<PathBuf>,

    /// OAuth scopes; defaults to Drive (app files), Calendar and Gmail send.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub scopes: Vec<String>,

    /// HTTP timeout in seconds.
    pub timeout_secs: Option<u64>,
}

/// Drive settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveSettings {
    /// Folder new top-level folders are created under.
    pub parent_id: String,
}

impl Default for DriveSettings {
    fn default() -> Self {
        Self {
            parent_id: FolderSynchronizer::DEFAULT_PARENT.to_string(),
        }
    }
}

/// Invitation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InviteSettings {
    /// `From` address of the invitation email; Gmail uses the account
    /// address when unset.
    pub sender: Option<String>,

    /// Calendar the event is inserted into.
    pub calendar_id: String,
}

impl Default for InviteSettings {
    fn default() -> Self {
        Self {
            sender: None,
            calendar_id: EventNotifier::DEFAULT_CALENDAR.to_string(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from the default path.
    ///
    /// A missing file yields the defaults.
    pub fn load() -> Result<Self, String> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read config {}: {}", path.display(), e))?;
        toml::from_str(&content)
            .map_err(|e| format!("failed to parse config {}: {}", path.display(), e))
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("driveinvite")
    }
}

impl GoogleSettings {
    /// Returns true if any credential source is configured.
    pub fn has_credentials(&self) -> bool {
        self.credentials_file.is_some() || self.client_id.is_some() || self.client_secret.is_some()
    }

    /// Builds the provider configuration with the given credentials.
    pub fn to_provider_config(&self, credentials: OAuthCredentials) -> GoogleConfig {
        let mut config = GoogleConfig::new(credentials);

        if let Some(ref path) = self.token_path {
            config = config.with_token_path(path);
        }
        if !self.scopes.is_empty() {
            config = config.with_scopes(self.scopes.clone());
        }
        if let Some(secs) = self.timeout_secs {
            config = config.with_timeout(Duration::from_secs(secs));
        }

        config
    }

    /// Resolves OAuth credentials from the configured sources.
    ///
    /// `credentials_file` wins over inline values. Inline values are passed
    /// through `secret::resolve()` to expand `pass::` and `env::` references.
    pub fn resolve_credentials(&self) -> Result<OAuthCredentials, String> {
        if let Some(ref path) = self.credentials_file {
            return OAuthCredentials::from_file(path).map_err(|e| e.message().to_string());
        }

        let raw_id = self.client_id.as_deref().ok_or_else(|| {
            format!(
                "Google credentials not found. Add to {}:\n  \
                 [google]\n  \
                 credentials_file = \"credentials.json\"\n\n  \
                 Or run: driveinvite auth --credentials-file <path>",
                AppConfig::default_path().display()
            )
        })?;

        let raw_secret = self.client_secret.as_deref().ok_or_else(|| {
            "client_secret is missing from [google] section in config.toml".to_string()
        })?;

        let resolved_id = crate::secret::resolve(raw_id)
            .map_err(|e| format!("failed to resolve client_id: {}", e))?;
        let resolved_secret = crate::secret::resolve(raw_secret)
            .map_err(|e| format!("failed to resolve client_secret: {}", e))?;

        Ok(OAuthCredentials::new(resolved_id, resolved_secret))
    }
}
