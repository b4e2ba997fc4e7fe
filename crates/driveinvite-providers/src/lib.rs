//! Remote folder synchronization and event notification.
//!
//! This crate provides:
//!
//! - [`RemoteDirectory`] - the abstraction over a hierarchical cloud store
//! - [`FolderSynchronizer`] - find-or-create / find-or-update reconciliation
//! - [`EventNotifier`] - calendar event creation followed by an emailed invite
//! - [`ProviderError`] - error type shared by every remote call
//! - [`google`] - Drive, Calendar and Gmail implementations (feature `google`)
//!
//! # Architecture
//!
//! ```text
//!  local dir ──▶ FolderSynchronizer ──▶ dyn RemoteDirectory ──▶ DriveClient
//!                        │
//!                        ▼ folder link
//!  EventRequest ──▶ EventNotifier ──▶ dyn CalendarService ──▶ CalendarClient
//!                                 └─▶ dyn MailService     ──▶ GmailClient
//!                        ▲
//!                  dyn TokenSource ◀── GoogleSession
//! ```

pub mod auth;
pub mod error;
#[cfg(feature = "google")]
pub mod google;
pub mod message;
pub mod notify;
pub mod remote;
pub mod sync;

pub use auth::{StaticToken, TokenSource};
pub use error::{ProviderError, ProviderErrorCode, ProviderResult};
pub use message::InviteEmail;
pub use notify::{
    CalendarService, CreatedEvent, EventNotifier, MailService, NotifyError, NotifyReport,
    NotifyStage, NotifyState,
};
pub use remote::{BoxFuture, NodeKind, RemoteDirectory, RemoteNode};
pub use sync::{
    FileOutcome, FileReport, FolderSynchronizer, SyncError, SyncMapping, SyncReport, SyncStage,
};
