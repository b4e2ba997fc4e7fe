//! Google implementations: OAuth session, Drive, Calendar and Gmail.
//!
//! # Authentication Flow
//!
//! 1. The user registers an OAuth client and provides `credentials.json`
//! 2. [`GoogleSession::authenticate`] opens the browser on the consent page
//!    with a PKCE challenge and waits on a loopback redirect
//! 3. The code is exchanged for access and refresh tokens
//! 4. Tokens are persisted to `token.json` and refreshed on demand
//!
//! A single consent covers all three services.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use driveinvite_providers::google::{DriveClient, GoogleConfig, GoogleSession, OAuthCredentials};
//! use driveinvite_providers::FolderSynchronizer;
//!
//! let config = GoogleConfig::new(OAuthCredentials::from_file("credentials.json")?);
//! let session = Arc::new(GoogleSession::new(config.clone())?);
//! let drive = DriveClient::new(session, &config)?;
//! let report = FolderSynchronizer::new(&drive).sync_directory("proj").await?;
//! ```

mod calendar;
mod config;
mod drive;
mod gmail;
mod http;
mod oauth;
mod session;
mod tokens;

pub use calendar::CalendarClient;
pub use config::{GoogleConfig, GoogleEndpoints, OAuthCredentials};
pub use drive::{DriveClient, FOLDER_MIME_TYPE, escape_query_value, guess_mime_type};
pub use gmail::{GmailClient, encode_raw};
pub use oauth::{OAuthClient, PkceFlow};
pub use session::GoogleSession;
pub use tokens::{TokenInfo, TokenStorage};
