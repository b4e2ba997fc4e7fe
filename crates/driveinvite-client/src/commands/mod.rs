//! Subcommand implementations.

pub mod auth;
pub mod config;
pub mod send;
pub mod sync;

use std::sync::Arc;

use driveinvite_providers::google::GoogleSession;

use crate::config::AppConfig;
use crate::error::{ClientError, ClientResult};

/// Opens a Google session from the configured credentials.
///
/// Persisted tokens are loaded but not checked; the first API call
/// refreshes or rejects them.
pub(crate) fn open_session(config: &AppConfig) -> ClientResult<Arc<GoogleSession>> {
    let credentials = config
        .google
        .resolve_credentials()
        .map_err(ClientError::Config)?;
    let session = GoogleSession::new(config.google.to_provider_config(credentials))?;
    Ok(Arc::new(session))
}
