//! Client error types.

use std::fmt;

use driveinvite_providers::{NotifyError, ProviderError, SyncError};

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur in the client.
#[derive(Debug)]
pub enum ClientError {
    /// Configuration error.
    Config(String),
    /// Invalid event form input.
    Input(String),
    /// Provider error.
    Provider(ProviderError),
    /// Folder synchronization aborted.
    Sync(SyncError),
    /// Event creation or invitation failed.
    Notify(NotifyError),
    /// IO error.
    Io(std::io::Error),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {}", msg),
            Self::Input(msg) => write!(f, "invalid input: {}", msg),
            Self::Provider(err) => write!(f, "provider error: {}", err),
            Self::Sync(err) => write!(f, "sync failed: {}", err),
            Self::Notify(err) => write!(f, "{}", err),
            Self::Io(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Provider(err) => Some(err),
            Self::Sync(err) => Some(err),
            Self::Notify(err) => Some(err),
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<ProviderError> for ClientError {
    fn from(err: ProviderError) -> Self {
        Self::Provider(err)
    }
}

impl From<SyncError> for ClientError {
    fn from(err: SyncError) -> Self {
        Self::Sync(err)
    }
}

impl From<NotifyError> for ClientError {
    fn from(err: NotifyError) -> Self {
        Self::Notify(err)
    }
}
