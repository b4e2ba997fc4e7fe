//! Calendar event creation and email invitations.
//!
//! [`EventNotifier`] drives a small state machine:
//!
//! ```text
//! Unauthenticated ──▶ Authenticated ──▶ EventCreated ──▶ InviteSent
//!        │                  │                 │
//!        └──────────────────┴─────────────────┴──▶ Failed(stage)
//! ```
//!
//! A failure at any stage is terminal: once event creation fails, no
//! invitation is sent.

use std::fmt;

use driveinvite_core::{CalendarInvite, EventRequest};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::auth::TokenSource;
use crate::error::{ProviderError, ProviderResult};
use crate::message::InviteEmail;
use crate::remote::BoxFuture;

/// A calendar event as returned by the calendar service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedEvent {
    pub id: String,
    /// Browser link to the event.
    pub html_link: Option<String>,
    /// iCalendar UID assigned by the service.
    pub ical_uid: Option<String>,
}

impl CreatedEvent {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            html_link: None,
            ical_uid: None,
        }
    }
}

/// A calendar that events can be inserted into.
pub trait CalendarService: Send + Sync {
    /// Inserts an event with a single attendee into `calendar_id`.
    fn insert_event<'a>(
        &'a self,
        calendar_id: &'a str,
        request: &'a EventRequest,
    ) -> BoxFuture<'a, ProviderResult<CreatedEvent>>;
}

/// A service that can send email.
pub trait MailService: Send + Sync {
    /// Sends `email` and returns the message identifier.
    fn send_message<'a>(&'a self, email: &'a InviteEmail) -> BoxFuture<'a, ProviderResult<String>>;
}

/// The step that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyStage {
    Authentication,
    EventCreation,
    InviteSend,
}

impl fmt::Display for NotifyStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stage = match self {
            Self::Authentication => "authentication",
            Self::EventCreation => "event creation",
            Self::InviteSend => "invite send",
        };
        f.write_str(stage)
    }
}

/// Where the notifier is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyState {
    Unauthenticated,
    Authenticated,
    EventCreated,
    InviteSent,
    Failed(NotifyStage),
}

/// A failed notification step.
#[derive(Debug, Error)]
#[error("{stage} failed: {source}")]
pub struct NotifyError {
    pub stage: NotifyStage,
    #[source]
    pub source: ProviderError,
}

/// Outcome of a complete notification.
#[derive(Debug, Clone)]
pub struct NotifyReport {
    pub event: CreatedEvent,
    pub message_id: String,
}

/// Creates a calendar event, then emails the attendee an invitation.
pub struct EventNotifier<'a> {
    tokens: &'a dyn TokenSource,
    calendar: &'a dyn CalendarService,
    mail: &'a dyn MailService,
    calendar_id: String,
    sender: Option<String>,
    state: NotifyState,
    event: Option<CreatedEvent>,
}

impl<'a> EventNotifier<'a> {
    /// Calendar used when none is configured.
    pub const DEFAULT_CALENDAR: &'static str = "primary";

    pub fn new(
        tokens: &'a dyn TokenSource,
        calendar: &'a dyn CalendarService,
        mail: &'a dyn MailService,
    ) -> Self {
        Self {
            tokens,
            calendar,
            mail,
            calendar_id: Self::DEFAULT_CALENDAR.to_string(),
            sender: None,
            state: NotifyState::Unauthenticated,
            event: None,
        }
    }

    /// Sets the calendar events are inserted into.
    pub fn with_calendar_id(mut self, calendar_id: impl Into<String>) -> Self {
        self.calendar_id = calendar_id.into();
        self
    }

    /// Sets the `From` address and the invite organizer.
    pub fn with_sender(mut self, sender: Option<String>) -> Self {
        self.sender = sender;
        self
    }

    pub fn state(&self) -> NotifyState {
        self.state
    }

    /// Obtains a valid access token.
    pub async fn authenticate(&mut self) -> Result<(), NotifyError> {
        self.expect_state(NotifyState::Unauthenticated, NotifyStage::Authentication)?;

        match self.tokens.access_token().await {
            Ok(_) => {
                debug!("notifier authenticated");
                self.state = NotifyState::Authenticated;
                Ok(())
            }
            Err(source) => Err(self.fail(NotifyStage::Authentication, source)),
        }
    }

    /// Inserts the event into the configured calendar.
    pub async fn create_event(
        &mut self,
        request: &EventRequest,
    ) -> Result<CreatedEvent, NotifyError> {
        self.expect_state(NotifyState::Authenticated, NotifyStage::EventCreation)?;

        match self.calendar.insert_event(&self.calendar_id, request).await {
            Ok(event) => {
                info!(
                    id = %event.id,
                    link = event.html_link.as_deref().unwrap_or("-"),
                    "event created"
                );
                self.state = NotifyState::EventCreated;
                self.event = Some(event.clone());
                Ok(event)
            }
            Err(source) => Err(self.fail(NotifyStage::EventCreation, source)),
        }
    }

    /// Emails the attendee an iCalendar invitation for the created event.
    ///
    /// Returns the message identifier.
    pub async fn send_invite(&mut self, request: &EventRequest) -> Result<String, NotifyError> {
        self.expect_state(NotifyState::EventCreated, NotifyStage::InviteSend)?;

        let mut invite = CalendarInvite::new(request);
        if let Some(uid) = self.event.as_ref().and_then(|e| e.ical_uid.as_ref()) {
            invite = invite.with_uid(uid.clone());
        }
        if let Some(ref sender) = self.sender {
            invite = invite.with_organizer(sender.clone());
        }

        let mut email = InviteEmail::new(request, &invite);
        if let Some(ref sender) = self.sender {
            email = email.with_from(sender.clone());
        }

        match self.mail.send_message(&email).await {
            Ok(message_id) => {
                info!(to = %request.recipient, message_id = %message_id, "invite sent");
                self.state = NotifyState::InviteSent;
                Ok(message_id)
            }
            Err(source) => Err(self.fail(NotifyStage::InviteSend, source)),
        }
    }

    /// Runs every step in order.
    pub async fn notify(&mut self, request: &EventRequest) -> Result<NotifyReport, NotifyError> {
        self.authenticate().await?;
        let event = self.create_event(request).await?;
        let message_id = self.send_invite(request).await?;
        Ok(NotifyReport { event, message_id })
    }

    fn expect_state(
        &mut self,
        expected: NotifyState,
        stage: NotifyStage,
    ) -> Result<(), NotifyError> {
        if self.state == expected {
            return Ok(());
        }
        let source = ProviderError::internal(format!(
            "cannot run {} in state {:?}",
            stage, self.state
        ));
        Err(NotifyError { stage, source })
    }

    fn fail(&mut self, stage: NotifyStage, source: ProviderError) -> NotifyError {
        warn!(%stage, error = %source, "notification failed");
        self.state = NotifyState::Failed(stage);
        NotifyError { stage, source }
    }
}
