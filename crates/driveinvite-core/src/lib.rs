//! Core types: local entries, event requests, iCalendar invites, tracing

pub mod event;
pub mod ics;
pub mod local;
pub mod tracing;

pub use event::{EventRequest, folder_description};
pub use ics::{CalendarInvite, ics_utc};
pub use local::{EntryKind, LocalEntry, WalkError, root_entry, walk_files};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
