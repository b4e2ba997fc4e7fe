//! Invitation email assembly.
//!
//! Builds the RFC 5322 message that carries an iCalendar request:
//!
//! ```text
//! multipart/mixed
//! └── multipart/alternative
//!     ├── text/plain                      (human-readable summary)
//!     └── text/calendar; method=REQUEST   (invite.ics, inline)
//! ```
//!
//! MIME structure, boundaries, header encoding and transfer encodings come
//! from `lettre`.

use std::error::Error as StdError;

use driveinvite_core::{CalendarInvite, EventRequest};
use lettre::message::header::{
    self, ContentDisposition, ContentType, Header, HeaderName, HeaderValue, Headers,
};
use lettre::message::{Mailbox, Mailboxes, MultiPart, SinglePart};

use crate::error::{ProviderError, ProviderResult};

const CALENDAR_FILENAME: &str = "invite.ics";
const CALENDAR_CONTENT_TYPE: &str = "text/calendar; method=REQUEST; charset=utf-8";
const CALENDAR_CONTENT_CLASS: &str = "urn:content-classes:calendarmessage";

/// `Content-Class` header expected by Outlook for meeting requests.
#[derive(Debug, Clone, Copy)]
struct ContentClass;

impl Header for ContentClass {
    fn name() -> HeaderName {
        HeaderName::new_from_ascii_str("Content-Class")
    }

    fn parse(_s: &str) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        Ok(Self)
    }

    fn display(&self) -> HeaderValue {
        HeaderValue::new(Self::name(), CALENDAR_CONTENT_CLASS.to_string())
    }
}

/// A rendered invitation ready to hand to a mail service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InviteEmail {
    to: String,
    from: Option<String>,
    subject: String,
    body: String,
    calendar: String,
}

impl InviteEmail {
    /// Builds the email for `request` with `invite` as its calendar part.
    pub fn new(request: &EventRequest, invite: &CalendarInvite<'_>) -> Self {
        Self {
            to: request.recipient.clone(),
            from: None,
            subject: request.invite_subject(),
            body: plain_body(request),
            calendar: invite.to_ics(),
        }
    }

    /// Sets the `From` header. Without it the mail service fills in the
    /// authenticated account.
    pub fn with_from(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }

    pub fn to(&self) -> &str {
        &self.to
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Returns the iCalendar payload.
    pub fn calendar(&self) -> &str {
        &self.calendar
    }

    /// Renders the full MIME message.
    ///
    /// Fails with `BadRequest` when an address does not parse.
    pub fn to_mime(&self) -> ProviderResult<Vec<u8>> {
        // `Message::builder()` insists on a `From` header, which stays
        // optional here, so the top-level headers are written directly in
        // front of the formatted multipart body.
        let mut headers = Headers::new();
        headers.set(header::MIME_VERSION_1_0);
        headers.set(header::To::from(Mailboxes::from(mailbox("recipient", &self.to)?)));
        if let Some(ref from) = self.from {
            headers.set(header::From::from(Mailboxes::from(mailbox("sender", from)?)));
        }
        headers.set(header::Subject::from(single_line(&self.subject)));

        let content_type = ContentType::parse(CALENDAR_CONTENT_TYPE).map_err(|e| {
            ProviderError::internal(format!("invalid calendar content type: {}", e))
        })?;
        let calendar = SinglePart::builder()
            .header(content_type)
            .header(ContentClass)
            .header(ContentDisposition::inline_with_name(CALENDAR_FILENAME))
            .body(crlf(&self.calendar));

        let body = MultiPart::mixed().multipart(
            MultiPart::alternative()
                .singlepart(SinglePart::plain(crlf(&self.body)))
                .singlepart(calendar),
        );

        let mut out = headers.to_string().into_bytes();
        out.extend_from_slice(&body.formatted());
        Ok(out)
    }
}

fn mailbox(role: &str, address: &str) -> ProviderResult<Mailbox> {
    address
        .trim()
        .parse::<Mailbox>()
        .map_err(|e| ProviderError::bad_request(format!("invalid {} '{}': {}", role, address, e)))
}

fn plain_body(request: &EventRequest) -> String {
    let mut body = format!(
        "You have been invited to: {}\nWhen: {} - {} (UTC)\n",
        request.summary,
        request.start.format("%Y-%m-%d %H:%M"),
        request.end.format("%Y-%m-%d %H:%M"),
    );
    if !request.description.is_empty() {
        body.push('\n');
        body.push_str(&request.description);
        body.push('\n');
    }
    body
}

fn single_line(value: &str) -> String {
    value.chars().filter(|c| *c != '\r' && *c != '\n').collect()
}

/// Normalizes line endings to CRLF and guarantees a trailing CRLF.
fn crlf(text: &str) -> String {
    let mut out = text.replace("\r\n", "\n").replace('\n', "\r\n");
    if !out.ends_with("\r\n") {
        out.push_str("\r\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderErrorCode;
    use chrono::{TimeZone, Utc};

    fn request() -> EventRequest {
        EventRequest::new(
            "guest@example.com",
            "Kickoff",
            Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 15, 11, 0, 0).unwrap(),
        )
        .with_description("Event description\n\nFolder link: https://drive/x")
    }

    fn render(req: &EventRequest) -> String {
        let invite = CalendarInvite::new(req).with_uid("abc-123@driveinvite");
        String::from_utf8(InviteEmail::new(req, &invite).to_mime().unwrap()).unwrap()
    }

    #[test]
    fn headers() {
        let req = request();
        let invite = CalendarInvite::new(&req).with_uid("u1");
        let email = InviteEmail::new(&req, &invite).with_from("host@example.com");
        let mime = String::from_utf8(email.to_mime().unwrap()).unwrap();

        assert_eq!(email.to(), "guest@example.com");
        assert_eq!(email.subject(), "Invite: Kickoff");
        assert!(mime.starts_with("MIME-Version: 1.0\r\n"));
        assert!(mime.contains("To: guest@example.com\r\n"));
        assert!(mime.contains("From: host@example.com\r\n"));
        assert!(mime.contains("Subject: Invite: Kickoff\r\n"));
    }

    #[test]
    fn from_header_is_optional() {
        let mime = render(&request());
        assert!(!mime.contains("From:"));
    }

    #[test]
    fn nested_multipart_layout() {
        let mime = render(&request());

        let mixed = mime.find("multipart/mixed").unwrap();
        let alt = mime.find("multipart/alternative").unwrap();
        let plain = mime.find("text/plain").unwrap();
        let cal = mime.find("text/calendar; method=REQUEST").unwrap();
        assert!(mixed < alt && alt < plain && plain < cal);
        assert!(mime.ends_with("--\r\n"));
    }

    #[test]
    fn calendar_part_headers() {
        let mime = render(&request());
        assert!(mime.contains("Content-Class: urn:content-classes:calendarmessage\r\n"));
        assert!(mime.contains("Content-Disposition: inline"));
        assert!(mime.contains("invite.ics"));
        assert!(mime.contains("METHOD:REQUEST\r\n"));
        assert!(mime.contains("UID:abc-123@driveinvite\r\n"));
    }

    #[test]
    fn body_has_crlf_and_folder_link() {
        let mime = render(&request());
        assert!(mime.contains("Folder link: https://drive/x\r\n"));
        let bare_lf = mime
            .char_indices()
            .filter(|&(i, c)| c == '\n' && (i == 0 || mime.as_bytes()[i - 1] != b'\r'))
            .count();
        assert_eq!(bare_lf, 0);
    }

    #[test]
    fn header_injection_is_rejected() {
        let mut req = request();
        req.recipient = "guest@example.com\r\nBcc: evil@example.com".to_string();
        let invite = CalendarInvite::new(&req);
        let err = InviteEmail::new(&req, &invite).to_mime().unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::BadRequest);
        assert!(err.message().contains("recipient"));
    }

    #[test]
    fn subject_line_breaks_stay_in_one_header() {
        let mut req = request();
        req.summary = "Kickoff\r\nBcc: evil@example.com".to_string();
        let mime = render(&req);
        assert!(!mime.contains("\r\nBcc:"));
    }

    #[test]
    fn non_ascii_subject_is_encoded() {
        let mut req = request();
        req.summary = "Réunion".to_string();
        let mime = render(&req);
        assert!(mime.to_ascii_lowercase().contains("=?utf-8?b?"));
        assert!(!mime.contains("Subject: Invite: Réunion"));
    }
}
