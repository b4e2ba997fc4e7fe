//! OAuth 2.0 authorization code flow with PKCE and a loopback redirect.
//!
//! # Flow Overview
//!
//! 1. Generate a code verifier and its SHA-256 challenge
//! 2. Bind a local HTTP listener on the first free port in the range
//! 3. Open the browser on Google's consent page
//! 4. Google redirects to `http://127.0.0.1:<port>/callback?code=..&state=..`
//! 5. Exchange the code (with the verifier) for access and refresh tokens

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng as _;
use sha2::{Digest, Sha256};
use tracing::{debug, error, info, warn};

use crate::error::{ProviderError, ProviderResult};

use super::config::{GoogleEndpoints, OAuthCredentials};
use super::http::build_http_client;
use super::tokens::TokenInfo;

/// Verifier length in bytes, before base64 encoding.
const CODE_VERIFIER_LENGTH: usize = 32;

const CALLBACK_TIMEOUT: Duration = Duration::from_secs(300);

/// OAuth client for Google.
#[derive(Debug)]
pub struct OAuthClient {
    credentials: OAuthCredentials,
    endpoints: GoogleEndpoints,
    http_client: reqwest::Client,
}

impl OAuthClient {
    /// Creates a client for the given credentials and endpoints.
    pub fn new(
        credentials: OAuthCredentials,
        endpoints: GoogleEndpoints,
        timeout: Duration,
        user_agent: &str,
    ) -> ProviderResult<Self> {
        Ok(Self {
            credentials,
            endpoints,
            http_client: build_http_client(timeout, user_agent)?,
        })
    }

    /// Runs the interactive consent flow and returns the new tokens.
    ///
    /// Blocks until the browser redirect arrives or five minutes pass.
    pub async fn authorize(
        &self,
        scopes: &[String],
        port_range: (u16, u16),
    ) -> ProviderResult<TokenInfo> {
        let pkce = PkceFlow::new();

        let (listener, port) = bind_loopback_server(port_range)?;
        let redirect_uri = format!("http://127.0.0.1:{}/callback", port);
        let auth_url = pkce.build_auth_url(
            &self.endpoints.auth_url,
            &self.credentials.client_id,
            &redirect_uri,
            scopes,
        );

        info!("starting OAuth flow, opening browser");
        debug!(url = %auth_url, "authorization URL");

        if let Err(e) = open::that(&auth_url) {
            warn!("failed to open browser: {}", e);
            eprintln!("\nPlease open this URL in your browser:\n\n{}\n", auth_url);
        }

        let (code, received_state) = wait_for_callback(listener)?;
        if received_state != pkce.state {
            return Err(ProviderError::authentication(
                "OAuth state mismatch - possible CSRF attack",
            ));
        }

        info!("received authorization code, exchanging for tokens");
        self.exchange_code(&code, &pkce.verifier, &redirect_uri, scopes)
            .await
    }

    /// Exchanges a refresh token for a new access token.
    ///
    /// Returns the access token and its lifetime in seconds.
    pub async fn refresh_token(
        &self,
        refresh_token: &str,
    ) -> ProviderResult<(String, Option<i64>)> {
        let params = [
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];

        let response = self.post_token(&params, "token refresh").await?;
        info!("refreshed access token");
        Ok((response.access_token, response.expires_in))
    }

    async fn exchange_code(
        &self,
        code: &str,
        verifier: &str,
        redirect_uri: &str,
        scopes: &[String],
    ) -> ProviderResult<TokenInfo> {
        let params = [
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("code", code),
            ("code_verifier", verifier),
            ("grant_type", "authorization_code"),
            ("redirect_uri", redirect_uri),
        ];

        let response = self.post_token(&params, "token exchange").await?;
        let granted = match response.scope {
            Some(ref scope) => scope.split_whitespace().map(String::from).collect(),
            None => scopes.to_vec(),
        };

        info!("obtained tokens");
        Ok(TokenInfo::new(
            response.access_token,
            response.refresh_token,
            response.expires_in,
            granted,
        ))
    }

    async fn post_token(
        &self,
        params: &[(&str, &str)],
        what: &str,
    ) -> ProviderResult<TokenResponse> {
        let response = self
            .http_client
            .post(&self.endpoints.token_url)
            .form(params)
            .send()
            .await
            .map_err(|e| {
                ProviderError::network(format!("{} request failed: {}", what, e))
                    .with_provider("oauth")
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            ProviderError::network(format!("failed to read response: {}", e)).with_provider("oauth")
        })?;

        if !status.is_success() {
            return Err(ProviderError::authentication(format!(
                "{} failed ({}): {}",
                what, status, body
            ))
            .with_provider("oauth"));
        }

        serde_json::from_str(&body).map_err(|e| {
            ProviderError::invalid_response(format!("invalid token response: {}", e))
                .with_provider("oauth")
        })
    }
}

/// Binds the first free port in `port_range` on 127.0.0.1.
fn bind_loopback_server(port_range: (u16, u16)) -> ProviderResult<(TcpListener, u16)> {
    for port in port_range.0..=port_range.1 {
        if let Ok(listener) = TcpListener::bind(("127.0.0.1", port)) {
            debug!(port, "bound loopback server");
            return Ok((listener, port));
        }
    }
    Err(ProviderError::configuration(format!(
        "no available port in range {}-{}",
        port_range.0, port_range.1
    )))
}

/// Waits for the redirect and returns `(code, state)`.
fn wait_for_callback(listener: TcpListener) -> ProviderResult<(String, String)> {
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    if let Some(result) = handle_callback(stream) {
                        let _ = tx.send(result);
                        return;
                    }
                }
                Err(e) => error!("failed to accept connection: {}", e),
            }
        }
    });

    match rx.recv_timeout(CALLBACK_TIMEOUT) {
        Ok(result) => result,
        Err(mpsc::RecvTimeoutError::Timeout) => {
            Err(ProviderError::authentication("OAuth callback timeout"))
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => {
            Err(ProviderError::internal("callback channel disconnected"))
        }
    }
}

fn handle_callback(mut stream: TcpStream) -> Option<ProviderResult<(String, String)>> {
    let mut request_line = String::new();
    BufReader::new(&stream).read_line(&mut request_line).ok()?;

    let result = parse_callback(&request_line)?;

    let response = if result.is_ok() {
        "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\n\r\n\
        <html><body><h1>Authorization Successful</h1>\
        <p>You can close this window and return to the terminal.</p></body></html>"
    } else {
        "HTTP/1.1 400 Bad Request\r\nContent-Type: text/html\r\n\r\n\
        <html><body><h1>Authorization Failed</h1>\
        <p>You can close this window.</p></body></html>"
    };
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();

    Some(result)
}

/// Parses `GET /callback?code=..&state=.. HTTP/1.1`.
///
/// Returns `None` for requests that are not the callback (e.g. favicon).
fn parse_callback(request_line: &str) -> Option<ProviderResult<(String, String)>> {
    let mut parts = request_line.split_whitespace();
    if parts.next() != Some("GET") {
        return None;
    }
    let target = parts.next()?;
    let query = target.strip_prefix("/callback")?;
    let query = query.strip_prefix('?').unwrap_or(query);

    let mut code = None;
    let mut state = None;
    let mut denied = None;

    for param in query.split('&') {
        let Some((key, value)) = param.split_once('=') else {
            continue;
        };
        let value = urlencoding::decode(value).map(|v| v.into_owned()).unwrap_or_default();
        match key {
            "code" => code = Some(value),
            "state" => state = Some(value),
            "error" => denied = Some(value),
            _ => {}
        }
    }

    if let Some(reason) = denied {
        return Some(Err(ProviderError::authentication(format!(
            "authorization denied: {}",
            reason
        ))));
    }

    Some(match code {
        Some(code) => Ok((code, state.unwrap_or_default())),
        None => Err(ProviderError::authentication(
            "missing authorization code in callback",
        )),
    })
}

/// PKCE state (RFC 7636).
#[derive(Debug)]
pub struct PkceFlow {
    pub verifier: String,
    /// SHA-256 of the verifier, base64url without padding.
    pub challenge: String,
    /// Random CSRF token echoed back by the redirect.
    pub state: String,
}

impl PkceFlow {
    pub fn new() -> Self {
        let verifier = random_token(CODE_VERIFIER_LENGTH);
        let challenge = Self::compute_challenge(&verifier);
        Self {
            verifier,
            challenge,
            state: random_token(16),
        }
    }

    fn compute_challenge(verifier: &str) -> String {
        URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
    }

    /// Builds the consent page URL.
    pub fn build_auth_url(
        &self,
        auth_url: &str,
        client_id: &str,
        redirect_uri: &str,
        scopes: &[String],
    ) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&\
            code_challenge={}&code_challenge_method=S256&state={}&\
            access_type=offline&prompt=consent",
            auth_url,
            urlencoding::encode(client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(&scopes.join(" ")),
            urlencoding::encode(&self.challenge),
            urlencoding::encode(&self.state),
        )
    }
}

impl Default for PkceFlow {
    fn default() -> Self {
        Self::new()
    }
}

fn random_token(len: usize) -> String {
    let mut rng = rand::rng();
    let bytes: Vec<u8> = (0..len).map(|_| rng.random()).collect();
    URL_SAFE_NO_PAD.encode(&bytes)
}

#[derive(Debug, serde::Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    /// Space-separated granted scopes.
    #[serde(default)]
    scope: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderErrorCode;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> OAuthClient {
        OAuthClient::new(
            OAuthCredentials::new("id.apps.googleusercontent.com", "secret"),
            GoogleEndpoints::with_base(&server.uri()),
            Duration::from_secs(5),
            "driveinvite-test",
        )
        .unwrap()
    }

    #[test]
    fn pkce_verifier_length() {
        // 32 bytes base64url without padding
        assert_eq!(PkceFlow::new().verifier.len(), 43);
    }

    #[test]
    fn pkce_challenge_is_deterministic() {
        assert_eq!(
            PkceFlow::compute_challenge("verifier"),
            PkceFlow::compute_challenge("verifier")
        );
    }

    #[test]
    fn pkce_state_is_random() {
        assert_ne!(PkceFlow::new().state, PkceFlow::new().state);
    }

    #[test]
    fn auth_url_format() {
        let flow = PkceFlow::new();
        let url = flow.build_auth_url(
            "https://accounts.example/auth",
            "client.apps.googleusercontent.com",
            "http://127.0.0.1:8080/callback",
            &["a".to_string(), "b".to_string()],
        );

        assert!(url.starts_with("https://accounts.example/auth?"));
        assert!(url.contains("scope=a%20b"));
        assert!(url.contains("code_challenge_method=S256"));
        assert!(url.contains("access_type=offline"));
        assert!(url.contains(&format!("state={}", urlencoding::encode(&flow.state))));
    }

    #[test]
    fn parse_callback_success() {
        let parsed = parse_callback("GET /callback?code=4%2Fabc&state=xyz HTTP/1.1\r\n")
            .unwrap()
            .unwrap();
        assert_eq!(parsed, ("4/abc".to_string(), "xyz".to_string()));
    }

    #[test]
    fn parse_callback_denied() {
        let err = parse_callback("GET /callback?error=access_denied HTTP/1.1")
            .unwrap()
            .unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::AuthenticationFailed);
        assert!(err.message().contains("access_denied"));
    }

    #[test]
    fn parse_callback_ignores_other_paths() {
        assert!(parse_callback("GET /favicon.ico HTTP/1.1").is_none());
        assert!(parse_callback("POST /callback?code=x HTTP/1.1").is_none());
    }

    #[test]
    fn loopback_bind_uses_range() {
        let (listener, port) = bind_loopback_server((0, 0)).unwrap();
        assert_eq!(port, 0);
        drop(listener);
    }

    #[tokio::test]
    async fn refresh_token_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "fresh",
                "expires_in": 3599,
                "token_type": "Bearer"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let (token, expires_in) = client(&server).refresh_token("r1").await.unwrap();
        assert_eq!(token, "fresh");
        assert_eq!(expires_in, Some(3599));
    }

    #[tokio::test]
    async fn refresh_token_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400).set_body_string("invalid_grant"))
            .mount(&server)
            .await;

        let err = client(&server).refresh_token("r1").await.unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::AuthenticationFailed);
        assert!(err.message().contains("invalid_grant"));
    }

    #[tokio::test]
    async fn exchange_code_records_granted_scopes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code_verifier=v"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "a",
                "refresh_token": "r",
                "expires_in": 3599,
                "scope": "https://www.googleapis.com/auth/drive.file https://www.googleapis.com/auth/gmail.send"
            })))
            .mount(&server)
            .await;

        let tokens = client(&server)
            .exchange_code("c", "v", "http://127.0.0.1:8080/callback", &[])
            .await
            .unwrap();

        assert_eq!(tokens.refresh_token.as_deref(), Some("r"));
        assert_eq!(tokens.scopes.len(), 2);
    }

    #[tokio::test]
    async fn invalid_token_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_string("nope"))
            .mount(&server)
            .await;

        let err = client(&server).refresh_token("r1").await.unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::InvalidResponse);
    }
}
