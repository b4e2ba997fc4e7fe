//! Gmail v1 client for sending invitations.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::auth::TokenSource;
use crate::error::ProviderResult;
use crate::message::InviteEmail;
use crate::notify::MailService;
use crate::remote::BoxFuture;

use super::config::GoogleConfig;
use super::http::{build_http_client, check_status, read_json, transport_error};

const SERVICE: &str = "gmail";

/// Gmail API client.
pub struct GmailClient {
    http_client: reqwest::Client,
    tokens: Arc<dyn TokenSource>,
    gmail_base: String,
}

#[derive(Debug, Serialize)]
struct RawMessage {
    raw: String,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    id: String,
}

/// Encodes a rendered message for the `raw` field (base64url).
pub fn encode_raw(mime: &[u8]) -> String {
    URL_SAFE.encode(mime)
}

impl GmailClient {
    pub fn new(tokens: Arc<dyn TokenSource>, config: &GoogleConfig) -> ProviderResult<Self> {
        Ok(Self {
            http_client: build_http_client(config.timeout, &config.user_agent)?,
            tokens,
            gmail_base: config.endpoints.gmail_base.trim_end_matches('/').to_string(),
        })
    }

    async fn send_impl(&self, email: &InviteEmail) -> ProviderResult<String> {
        let token = self.tokens.access_token().await?;
        let body = RawMessage {
            raw: encode_raw(&email.to_mime()?),
        };

        let response = self
            .http_client
            .post(format!("{}/gmail/v1/users/me/messages/send", self.gmail_base))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;
        let response = check_status(SERVICE, response).await?;
        let sent: SentMessage = read_json(SERVICE, response).await?;

        debug!(to = email.to(), id = %sent.id, "message sent");
        Ok(sent.id)
    }
}

impl MailService for GmailClient {
    fn send_message<'a>(
        &'a self,
        email: &'a InviteEmail,
    ) -> BoxFuture<'a, ProviderResult<String>> {
        Box::pin(self.send_impl(email))
    }
}
