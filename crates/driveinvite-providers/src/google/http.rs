//! Shared HTTP plumbing for the Google API clients.

use std::time::Duration;

use reqwest::{Response, StatusCode};

use crate::error::{ProviderError, ProviderResult};

/// Builds a reqwest client with the configured timeout.
pub(crate) fn build_http_client(
    timeout: Duration,
    user_agent: &str,
) -> ProviderResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(user_agent)
        .build()
        .map_err(|e| {
            ProviderError::internal(format!("failed to create HTTP client: {}", e)).with_source(e)
        })
}

/// Maps a transport failure (no HTTP status) to a network error.
pub(crate) fn transport_error(service: &str, err: reqwest::Error) -> ProviderError {
    let message = if err.is_timeout() {
        "request timeout".to_string()
    } else if err.is_connect() {
        format!("connection failed: {}", err)
    } else {
        format!("request failed: {}", err)
    };
    ProviderError::network(message)
        .with_provider(service)
        .with_source(err)
}

/// Passes successful responses through and maps error statuses.
///
/// | status | code                 |
/// |--------|----------------------|
/// | 400    | BadRequest           |
/// | 401    | AuthenticationFailed |
/// | 403    | AuthorizationFailed  |
/// | 404    | NotFound             |
/// | 429    | RateLimited          |
/// | other  | ServerError          |
pub(crate) async fn check_status(service: &str, response: Response) -> ProviderResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after = response
        .headers()
        .get("Retry-After")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<u64>().ok());
    let body = response.text().await.unwrap_or_default();

    Err(status_error(status, &body, retry_after).with_provider(service))
}

fn status_error(status: StatusCode, body: &str, retry_after: Option<u64>) -> ProviderError {
    match status {
        StatusCode::BAD_REQUEST => ProviderError::bad_request(format!("bad request: {}", body)),
        StatusCode::UNAUTHORIZED => {
            ProviderError::authentication("access token expired or invalid")
        }
        StatusCode::FORBIDDEN => ProviderError::authorization(format!("access denied: {}", body)),
        StatusCode::NOT_FOUND => ProviderError::not_found(format!("not found: {}", body)),
        StatusCode::TOO_MANY_REQUESTS => ProviderError::rate_limited(format!(
            "rate limit exceeded{}",
            retry_after
                .map(|s| format!(", retry after {} seconds", s))
                .unwrap_or_default()
        )),
        _ => ProviderError::server(format!("API error ({}): {}", status, body)),
    }
}

/// Reads and parses a JSON response body.
pub(crate) async fn read_json<T: serde::de::DeserializeOwned>(
    service: &str,
    response: Response,
) -> ProviderResult<T> {
    let body = response.text().await.map_err(|e| transport_error(service, e))?;
    serde_json::from_str(&body).map_err(|e| {
        ProviderError::invalid_response(format!("failed to parse response: {}", e))
            .with_provider(service)
    })
}
