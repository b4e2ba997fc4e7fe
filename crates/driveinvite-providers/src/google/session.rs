//! Authenticated Google session.
//!
//! A [`GoogleSession`] owns the token record and hands out access tokens to
//! the Drive, Calendar and Gmail clients, refreshing them when they expire.

use tracing::{debug, info, warn};

use crate::auth::TokenSource;
use crate::error::{ProviderError, ProviderResult};
use crate::remote::BoxFuture;

use super::config::GoogleConfig;
use super::oauth::OAuthClient;
use super::tokens::TokenStorage;

/// OAuth state shared by all Google clients.
#[derive(Debug)]
pub struct GoogleSession {
    config: GoogleConfig,
    token_storage: TokenStorage,
    oauth_client: OAuthClient,
}

impl GoogleSession {
    /// Creates a session and loads any persisted tokens.
    ///
    /// Does not start the consent flow; call [`authenticate`](Self::authenticate)
    /// for that.
    pub fn new(config: GoogleConfig) -> ProviderResult<Self> {
        config.validate().map_err(ProviderError::configuration)?;

        let token_storage = TokenStorage::new(&config.token_path);
        if let Err(e) = token_storage.load() {
            warn!(
                path = %config.token_path.display(),
                error = %e,
                "ignoring unreadable token file"
            );
        }

        let oauth_client = OAuthClient::new(
            config.credentials.clone(),
            config.endpoints.clone(),
            config.timeout,
            &config.user_agent,
        )?;

        Ok(Self {
            config,
            token_storage,
            oauth_client,
        })
    }

    pub fn config(&self) -> &GoogleConfig {
        &self.config
    }

    /// Returns true if a usable token or a refresh token is stored.
    pub fn is_authenticated(&self) -> bool {
        self.token_storage
            .get()
            .is_some_and(|t| !t.is_expired() || t.refresh_token.is_some())
    }

    /// Returns true if the stored grant does not cover the configured scopes.
    pub fn needs_reauth(&self) -> bool {
        self.token_storage.needs_reauth(&self.config.scopes)
    }

    /// Runs the interactive consent flow and persists the tokens.
    pub async fn authenticate(&self) -> ProviderResult<()> {
        info!("starting Google authentication flow");

        let tokens = self
            .oauth_client
            .authorize(&self.config.scopes, self.config.loopback_port_range)
            .await?;
        self.token_storage.set(tokens)?;

        info!(path = %self.token_storage.path().display(), "authentication successful");
        Ok(())
    }

    /// Returns a valid access token, refreshing it first if it expired.
    pub async fn ensure_authenticated(&self) -> ProviderResult<String> {
        let tokens = self.token_storage.get().ok_or_else(|| {
            ProviderError::authentication("not authenticated - run 'driveinvite auth'")
        })?;

        if !tokens.is_expired() {
            return Ok(tokens.access_token);
        }

        let refresh_token = tokens.refresh_token.as_deref().ok_or_else(|| {
            ProviderError::authentication("no refresh token - run 'driveinvite auth --force'")
        })?;

        debug!("refreshing expired access token");
        let (access_token, expires_in) = self.oauth_client.refresh_token(refresh_token).await?;
        self.token_storage
            .update_access_token(&access_token, expires_in)?;
        Ok(access_token)
    }
}

impl TokenSource for GoogleSession {
    fn access_token(&self) -> BoxFuture<'_, ProviderResult<String>> {
        Box::pin(self.ensure_authenticated())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderErrorCode;
    use crate::google::config::{GoogleEndpoints, OAuthCredentials};
    use crate::google::tokens::TokenInfo;
    use chrono::{Duration, Utc};
    use std::path::Path;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(token_path: &Path, base: &str) -> GoogleConfig {
        GoogleConfig::new(OAuthCredentials::new(
            "test-client.apps.googleusercontent.com",
            "test-secret",
        ))
        .with_token_path(token_path)
        .with_endpoints(GoogleEndpoints::with_base(base))
    }

    fn store(token_path: &Path, tokens: TokenInfo) {
        TokenStorage::new(token_path).set(tokens).unwrap();
    }

    #[test]
    fn invalid_config_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let config = config(&tmp.path().join("token.json"), "http://localhost").with_scopes(vec![]);
        let err = GoogleSession::new(config).unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::ConfigurationError);
    }

    #[tokio::test]
    async fn missing_tokens_require_auth() {
        let tmp = tempfile::tempdir().unwrap();
        let session =
            GoogleSession::new(config(&tmp.path().join("token.json"), "http://localhost")).unwrap();

        assert!(!session.is_authenticated());
        assert!(session.needs_reauth());
        let err = session.access_token().await.unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::AuthenticationFailed);
        assert!(err.message().contains("driveinvite auth"));
    }

    #[tokio::test]
    async fn valid_token_is_returned_without_refresh() {
        let tmp = tempfile::tempdir().unwrap();
        let token_path = tmp.path().join("token.json");
        store(
            &token_path,
            TokenInfo::new("live", None, Some(3600), GoogleConfig::default_scopes()),
        );

        let session = GoogleSession::new(config(&token_path, "http://localhost")).unwrap();
        assert!(session.is_authenticated());
        assert!(!session.needs_reauth());
        assert_eq!(session.access_token().await.unwrap(), "live");
    }

    #[tokio::test]
    async fn expired_token_is_refreshed_and_persisted() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "renewed",
                "expires_in": 3599
            })))
            .expect(1)
            .mount(&server)
            .await;

        let tmp = tempfile::tempdir().unwrap();
        let token_path = tmp.path().join("token.json");
        let mut tokens = TokenInfo::new("stale", Some("refresh".to_string()), Some(3600), vec![]);
        tokens.expires_at = Some(Utc::now() - Duration::minutes(5));
        store(&token_path, tokens);

        let session = GoogleSession::new(config(&token_path, &server.uri())).unwrap();
        assert_eq!(session.access_token().await.unwrap(), "renewed");
        // Cached now; the mock expects a single refresh
        assert_eq!(session.access_token().await.unwrap(), "renewed");

        let reloaded = TokenStorage::new(&token_path);
        reloaded.load().unwrap();
        assert_eq!(reloaded.get().unwrap().access_token, "renewed");
    }

    #[tokio::test]
    async fn expired_without_refresh_token_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let token_path = tmp.path().join("token.json");
        let mut tokens = TokenInfo::new("stale", None, Some(3600), vec![]);
        tokens.expires_at = Some(Utc::now() - Duration::minutes(5));
        store(&token_path, tokens);

        let session = GoogleSession::new(config(&token_path, "http://localhost")).unwrap();
        assert!(!session.is_authenticated());
        let err = session.access_token().await.unwrap_err();
        assert!(err.message().contains("--force"));
    }
}
