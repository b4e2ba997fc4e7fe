//! Share-and-invite command.
//!
//! Synchronizes the folder, then creates a calendar event that links to it
//! and emails the attendee an invitation. Nothing is put on the calendar
//! when the folder cannot be synchronized.

use std::path::Path;

use driveinvite_core::{EventRequest, folder_description};
use driveinvite_providers::google::{CalendarClient, DriveClient, GmailClient};
use driveinvite_providers::{
    CalendarService, EventNotifier, MailService, NotifyReport, RemoteDirectory, TokenSource,
};
use tracing::info;

use crate::cli::SendArgs;
use crate::config::{AppConfig, InviteSettings};
use crate::error::ClientResult;
use crate::form::EventForm;

use super::sync::{print_report, synchronize};

/// Runs the full pipeline for the `send` command.
pub async fn run(args: SendArgs, config: &AppConfig) -> ClientResult<()> {
    // Reject an incomplete form before touching the network
    let request = EventForm::from(&args).to_request()?;

    let session = super::open_session(config)?;
    let google = session.config();
    let drive = DriveClient::new(session.clone(), google)?;
    let calendar = CalendarClient::new(session.clone(), google)?;
    let gmail = GmailClient::new(session.clone(), google)?;

    let services = Services {
        remote: &drive,
        tokens: session.as_ref(),
        calendar: &calendar,
        mail: &gmail,
    };
    let parent = args.parent.unwrap_or_else(|| config.drive.parent_id.clone());

    let report = services
        .share_and_invite(&args.folder, &parent, request, &config.invite)
        .await?;

    match report.event.html_link {
        Some(ref link) => println!("Event created: {}", link),
        None => println!("Event created ({})", report.event.id),
    }
    println!("Invitation sent (message {}).", report.message_id);
    Ok(())
}

/// The remote services one invocation talks to.
struct Services<'a> {
    remote: &'a dyn RemoteDirectory,
    tokens: &'a dyn TokenSource,
    calendar: &'a dyn CalendarService,
    mail: &'a dyn MailService,
}

impl Services<'_> {
    async fn share_and_invite(
        &self,
        folder: &Path,
        parent: &str,
        request: EventRequest,
        invite: &InviteSettings,
    ) -> ClientResult<NotifyReport> {
        let sync_report = synchronize(self.remote, folder, parent).await?;
        print_report(&sync_report);

        let request = request.with_description(folder_description(sync_report.folder_link()));
        info!(
            folder = %sync_report.folder.name,
            to = %request.recipient,
            "inviting attendee"
        );

        let mut notifier = EventNotifier::new(self.tokens, self.calendar, self.mail)
            .with_calendar_id(invite.calendar_id.clone())
            .with_sender(invite.sender.clone());
        Ok(notifier.notify(&request).await?)
    }
}
