//! OAuth token persistence.
//!
//! The token record is a JSON file holding the access token, refresh token,
//! expiry and granted scopes. Writes go to a temp file that is renamed over
//! the target, and the file is made owner-only on Unix.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ProviderError, ProviderResult};

/// Seconds subtracted from the reported lifetime so tokens are refreshed
/// before Google rejects them.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// A persisted OAuth token set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenInfo {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    /// Scopes granted at consent time.
    pub scopes: Vec<String>,
    pub last_refresh: DateTime<Utc>,
}

impl TokenInfo {
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        expires_in_secs: Option<i64>,
        scopes: Vec<String>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token,
            expires_at: expires_in_secs.map(expiry_from_now),
            scopes,
            last_refresh: Utc::now(),
        }
    }

    /// Returns true if the access token is expired or about to expire.
    ///
    /// Tokens without an expiry never expire.
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Utc::now() >= at)
    }

    /// Returns true if every `required` scope was granted.
    pub fn has_scopes(&self, required: &[String]) -> bool {
        required.iter().all(|scope| self.scopes.contains(scope))
    }

    /// Replaces the access token after a refresh.
    pub fn update_access_token(
        &mut self,
        access_token: impl Into<String>,
        expires_in_secs: Option<i64>,
    ) {
        self.access_token = access_token.into();
        self.expires_at = expires_in_secs.map(expiry_from_now);
        self.last_refresh = Utc::now();
    }
}

fn expiry_from_now(secs: i64) -> DateTime<Utc> {
    Utc::now() + Duration::seconds(secs) - Duration::seconds(EXPIRY_MARGIN_SECS)
}

/// File-backed token storage with an in-memory copy.
#[derive(Debug)]
pub struct TokenStorage {
    path: PathBuf,
    tokens: RwLock<Option<TokenInfo>>,
}

impl TokenStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            tokens: RwLock::new(None),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Option<TokenInfo>> {
        self.tokens.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<TokenInfo>> {
        self.tokens.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Loads tokens from disk.
    ///
    /// Returns `Ok(false)` if the file does not exist.
    pub fn load(&self) -> ProviderResult<bool> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no token file");
            return Ok(false);
        }

        let content = fs::read_to_string(&self.path).map_err(|e| {
            ProviderError::configuration(format!("failed to read token file: {}", e))
        })?;

        let tokens: TokenInfo = serde_json::from_str(&content).map_err(|e| {
            ProviderError::configuration(format!("failed to parse token file: {}", e))
        })?;

        debug!(path = %self.path.display(), "loaded tokens");
        *self.write() = Some(tokens);
        Ok(true)
    }

    /// Writes the current tokens to disk.
    pub fn save(&self) -> ProviderResult<()> {
        let content = {
            let tokens = self.read();
            let tokens = tokens
                .as_ref()
                .ok_or_else(|| ProviderError::internal("no tokens to save"))?;
            serde_json::to_string_pretty(tokens).map_err(|e| {
                ProviderError::internal(format!("failed to serialize tokens: {}", e))
            })?
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                ProviderError::configuration(format!("failed to create token directory: {}", e))
            })?;
        }

        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, &content).map_err(|e| {
            ProviderError::configuration(format!("failed to write token file: {}", e))
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = fs::set_permissions(&temp_path, fs::Permissions::from_mode(0o600));
        }

        fs::rename(&temp_path, &self.path).map_err(|e| {
            ProviderError::configuration(format!("failed to rename token file: {}", e))
        })?;

        debug!(path = %self.path.display(), "saved tokens");
        Ok(())
    }

    pub fn get(&self) -> Option<TokenInfo> {
        self.read().clone()
    }

    /// Replaces the tokens and saves them.
    pub fn set(&self, tokens: TokenInfo) -> ProviderResult<()> {
        *self.write() = Some(tokens);
        self.save()
    }

    /// Updates the access token and saves.
    pub fn update_access_token(
        &self,
        access_token: impl Into<String>,
        expires_in_secs: Option<i64>,
    ) -> ProviderResult<()> {
        {
            let mut tokens = self.write();
            let tokens = tokens
                .as_mut()
                .ok_or_else(|| ProviderError::internal("no tokens to update"))?;
            tokens.update_access_token(access_token, expires_in_secs);
        }
        self.save()
    }

    /// Clears tokens in memory and on disk.
    pub fn clear(&self) -> ProviderResult<()> {
        *self.write() = None;
        if self.path.exists() {
            fs::remove_file(&self.path).map_err(|e| {
                ProviderError::configuration(format!("failed to remove token file: {}", e))
            })?;
            info!(path = %self.path.display(), "cleared tokens");
        }
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true if the stored tokens are missing any required scope.
    pub fn needs_reauth(&self, required_scopes: &[String]) -> bool {
        match self.read().as_ref() {
            None => true,
            Some(tokens) => !tokens.has_scopes(required_scopes),
        }
    }
}
