//! Event request types.
//!
//! This module provides the input for the notification pipeline:
//! - [`EventRequest`]: what to put on the calendar and who to invite
//!
//! An `EventRequest` is built once per invocation and discarded after the
//! calendar event and the email invitation have been attempted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A request to create a calendar event and invite one attendee.
///
/// Both timestamps are timezone-aware (UTC). The system does not check that
/// `end` is after `start`; that is the caller's responsibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRequest {
    /// Email address of the single attendee.
    pub recipient: String,
    /// The event title.
    pub summary: String,
    /// Free-form event description (typically contains the folder link).
    pub description: String,
    /// When the event starts.
    pub start: DateTime<Utc>,
    /// When the event ends.
    pub end: DateTime<Utc>,
}

impl EventRequest {
    /// Creates a new request with an empty description.
    pub fn new(
        recipient: impl Into<String>,
        summary: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        Self {
            recipient: recipient.into(),
            summary: summary.into(),
            description: String::new(),
            start,
            end,
        }
    }

    /// Builder method to set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Returns the duration of the event in minutes.
    ///
    /// Negative when the caller supplied an end before the start.
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// Returns the invitation email subject line.
    pub fn invite_subject(&self) -> String {
        format!("Invite: {}", self.summary)
    }
}

/// Builds the event description that points attendees at the shared folder.
pub fn folder_description(folder_link: Option<&str>) -> String {
    match folder_link {
        Some(link) => format!("Event description\n\nFolder link: {}", link),
        None => "Event description".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn builder_sets_description() {
        let req = EventRequest::new(
            "guest@example.com",
            "Kickoff",
            utc(2024, 3, 15, 10, 0),
            utc(2024, 3, 15, 11, 0),
        )
        .with_description("agenda");

        assert_eq!(req.recipient, "guest@example.com");
        assert_eq!(req.description, "agenda");
        assert_eq!(req.duration_minutes(), 60);
    }

    #[test]
    fn end_before_start_is_not_rejected() {
        let req = EventRequest::new(
            "guest@example.com",
            "Backwards",
            utc(2024, 3, 15, 11, 0),
            utc(2024, 3, 15, 10, 30),
        );
        assert_eq!(req.duration_minutes(), -30);
    }

    #[test]
    fn subject_prefix() {
        let req = EventRequest::new(
            "guest@example.com",
            "Review",
            utc(2024, 3, 15, 10, 0),
            utc(2024, 3, 15, 11, 0),
        );
        assert_eq!(req.invite_subject(), "Invite: Review");
    }

    #[test]
    fn description_with_and_without_link() {
        let with = folder_description(Some("https://drive.google.com/drive/folders/abc"));
        assert!(with.ends_with("Folder link: https://drive.google.com/drive/folders/abc"));
        assert_eq!(folder_description(None), "Event description");
    }

    #[test]
    fn serde_roundtrip_keeps_timestamps() {
        let req = EventRequest::new(
            "guest@example.com",
            "Sync",
            utc(2024, 3, 15, 10, 0),
            utc(2024, 3, 15, 10, 45),
        );
        let json = serde_json::to_string(&req).unwrap();
        let parsed: EventRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, req);
    }
}
