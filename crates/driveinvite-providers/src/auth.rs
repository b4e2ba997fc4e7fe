//! Access-token sources.
//!
//! Every Google client asks a [`TokenSource`] for a bearer token right
//! before each request. The Google session refreshes expired tokens on
//! demand; tests use [`StaticToken`].

use crate::error::{ProviderError, ProviderResult};
use crate::remote::BoxFuture;

/// Something that can hand out a valid OAuth access token.
pub trait TokenSource: Send + Sync {
    /// Returns a non-expired access token, refreshing it if needed.
    ///
    /// # Errors
    ///
    /// Returns an authentication error when no usable credential exists.
    fn access_token(&self) -> BoxFuture<'_, ProviderResult<String>>;
}

/// A fixed access token.
#[derive(Debug, Clone)]
pub struct StaticToken(Option<String>);

impl StaticToken {
    /// A source that always returns `token`.
    pub fn new(token: impl Into<String>) -> Self {
        Self(Some(token.into()))
    }

    /// A source that always fails to authenticate.
    pub fn missing() -> Self {
        Self(None)
    }
}

impl TokenSource for StaticToken {
    fn access_token(&self) -> BoxFuture<'_, ProviderResult<String>> {
        let token = self.0.clone();
        Box::pin(async move {
            token.ok_or_else(|| ProviderError::authentication("no access token"))
        })
    }
}
