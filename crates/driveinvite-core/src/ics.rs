//! iCalendar invitation payloads.
//!
//! Builds the `VCALENDAR` text attached to invitation emails. The payload is
//! an RFC 5545 request (`METHOD:REQUEST`) with a single `VEVENT` and one
//! display alarm before the start time. Lines end with CRLF.

use chrono::{DateTime, Duration, Utc};
use icalendar::{Alarm, Calendar, Component, EventLike, Property, Trigger};

use crate::event::EventRequest;

/// PRODID written into every generated calendar.
pub const PRODID: &str = "-//driveinvite//Invitation//EN";

/// Minutes before the start at which the reminder fires.
pub const REMINDER_MINUTES: i64 = 15;

const ALARM_DESCRIPTION: &str = "This is an event reminder";

/// An invitation to render as iCalendar text.
#[derive(Debug, Clone)]
pub struct CalendarInvite<'a> {
    request: &'a EventRequest,
    uid: String,
    organizer: Option<String>,
}

impl<'a> CalendarInvite<'a> {
    /// Creates an invite for the given request with a random UID.
    pub fn new(request: &'a EventRequest) -> Self {
        Self {
            request,
            uid: format!("{}@driveinvite", uuid::Uuid::new_v4()),
            organizer: None,
        }
    }

    /// Sets the event UID (e.g. the id returned by the calendar API).
    pub fn with_uid(mut self, uid: impl Into<String>) -> Self {
        self.uid = uid.into();
        self
    }

    /// Sets the organizer email address.
    pub fn with_organizer(mut self, organizer: impl Into<String>) -> Self {
        self.organizer = Some(organizer.into());
        self
    }

    /// Returns the UID written into the `VEVENT`.
    pub fn uid(&self) -> &str {
        &self.uid
    }

    /// Renders the invitation as iCalendar text.
    pub fn to_ics(&self) -> String {
        let req = self.request;
        let mut event = icalendar::Event::new();
        event.uid(&self.uid);
        event.summary(&req.summary);
        event.description(&req.description);
        event.add_property("DTSTAMP", ics_utc(Utc::now()));
        event.add_property("DTSTART", ics_utc(req.start));
        event.add_property("DTEND", ics_utc(req.end));
        event.add_property("STATUS", "CONFIRMED");
        event.add_property("SEQUENCE", "0");

        if let Some(ref organizer) = self.organizer {
            event.append_property(Property::new("ORGANIZER", cal_address(organizer)));
        }

        let mut attendee = Property::new("ATTENDEE", cal_address(&req.recipient));
        attendee.add_parameter("ROLE", "REQ-PARTICIPANT");
        attendee.add_parameter("PARTSTAT", "NEEDS-ACTION");
        attendee.add_parameter("RSVP", "TRUE");
        event.append_multi_property(attendee);

        let trigger = Trigger::before_start(Duration::minutes(REMINDER_MINUTES));
        event.alarm(Alarm::display(ALARM_DESCRIPTION, trigger));

        let mut calendar = Calendar::new();
        calendar.push(event.done());
        normalize(&calendar.done().to_string())
    }
}

/// Formats a timestamp in iCalendar UTC basic format.
pub fn ics_utc(dt: DateTime<Utc>) -> String {
    dt.format("%Y%m%dT%H%M%SZ").to_string()
}

/// `mailto:` value for an address. Control characters are removed:
/// icalendar writes cal-address values unescaped.
fn cal_address(address: &str) -> String {
    let address: String = address.chars().filter(|c| !c.is_control()).collect();
    format!("mailto:{}", address.trim())
}

/// Rewrites the crate output into a request-method invitation.
///
/// - replaces the library PRODID with ours
/// - adds `METHOD:REQUEST` at calendar level
/// - drops `UID`/`DTSTAMP` inside `VALARM`
/// - writes the alarm trigger as `-PT<n>M` relative to the start
fn normalize(ics: &str) -> String {
    let mut out = String::with_capacity(ics.len() + 32);
    let mut in_alarm = false;

    for line in ics.lines() {
        if line.starts_with("PRODID:") {
            out.push_str("PRODID:");
            out.push_str(PRODID);
            out.push_str("\r\n");
            continue;
        }
        if line.starts_with("METHOD:") {
            continue;
        }

        match line {
            "BEGIN:VALARM" => in_alarm = true,
            "END:VALARM" => in_alarm = false,
            _ => {}
        }
        if in_alarm && (line.starts_with("UID:") || line.starts_with("DTSTAMP:")) {
            continue;
        }
        if in_alarm && line.starts_with("TRIGGER") {
            out.push_str(&format!("TRIGGER:-PT{}M\r\n", REMINDER_MINUTES));
            continue;
        }

        out.push_str(line);
        out.push_str("\r\n");

        if line == "BEGIN:VCALENDAR" {
            out.push_str("METHOD:REQUEST\r\n");
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn request() -> EventRequest {
        EventRequest::new(
            "guest@example.com",
            "Project kickoff",
            Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 15, 11, 30, 0).unwrap(),
        )
        .with_description("Bring notes")
    }

    fn alarm_section(ics: &str) -> String {
        ics.split("BEGIN:VALARM")
            .nth(1)
            .unwrap()
            .split("END:VALARM")
            .next()
            .unwrap()
            .to_string()
    }

    #[test]
    fn contains_request_method_and_event_fields() {
        let req = request();
        let ics = CalendarInvite::new(&req).with_uid("evt-1").to_ics();

        assert!(ics.starts_with("BEGIN:VCALENDAR\r\n"));
        assert!(ics.contains("METHOD:REQUEST\r\n"));
        assert!(ics.contains(&format!("PRODID:{}\r\n", PRODID)));
        assert!(ics.contains("BEGIN:VEVENT\r\n"));
        assert!(ics.contains("UID:evt-1\r\n"));
        assert!(ics.contains("SUMMARY:Project kickoff\r\n"));
        assert!(ics.contains("DESCRIPTION:Bring notes\r\n"));
        assert!(ics.contains("DTSTART:20240315T100000Z\r\n"));
        assert!(ics.contains("DTEND:20240315T113000Z\r\n"));
        assert!(ics.contains("STATUS:CONFIRMED\r\n"));
        assert!(ics.contains("SEQUENCE:0\r\n"));
        assert!(ics.trim_end().ends_with("END:VCALENDAR"));
    }

    #[test]
    fn method_appears_once() {
        let req = request();
        let ics = CalendarInvite::new(&req).to_ics();
        assert_eq!(ics.matches("METHOD:REQUEST").count(), 1);
    }

    #[test]
    fn has_single_display_alarm() {
        let req = request();
        let ics = CalendarInvite::new(&req).to_ics();

        assert_eq!(ics.matches("BEGIN:VALARM").count(), 1);
        let alarm = alarm_section(&ics);
        assert!(alarm.contains("ACTION:DISPLAY"));
        assert!(alarm.contains("\r\nTRIGGER:-PT15M\r\n"));
        assert_eq!(alarm.matches("TRIGGER").count(), 1);
        assert!(alarm.contains("DESCRIPTION:This is an event reminder"));
        assert!(!alarm.contains("UID:"));
        assert!(!alarm.contains("DTSTAMP:"));
    }

    #[test]
    fn attendee_and_organizer() {
        let req = request();
        let ics = CalendarInvite::new(&req)
            .with_organizer("host@example.com")
            .to_ics();

        // Long content lines are folded at 75 octets.
        let unfolded = ics.replace("\r\n ", "");
        assert!(unfolded.contains("ORGANIZER:mailto:host@example.com\r\n"));
        assert!(unfolded.contains("mailto:guest@example.com\r\n"));
        assert!(unfolded.contains("RSVP=TRUE"));
    }

    #[test]
    fn line_breaks_in_addresses_cannot_add_properties() {
        let mut req = request();
        req.recipient = "guest@example.com\r\nATTENDEE:mailto:evil@example.com".to_string();
        let ics = CalendarInvite::new(&req)
            .with_organizer("host@example.com\nORGANIZER:mailto:evil@example.com")
            .to_ics();

        let unfolded = ics.replace("\r\n ", "");
        assert_eq!(unfolded.matches("\r\nATTENDEE").count(), 1);
        assert_eq!(unfolded.matches("\r\nORGANIZER").count(), 1);
        assert!(!unfolded.contains("\r\nATTENDEE:mailto:evil"));
        assert!(unfolded.contains("mailto:guest@example.comATTENDEE:mailto:evil@example.com\r\n"));
    }

    #[test]
    fn every_line_ends_with_crlf() {
        let req = request();
        let ics = CalendarInvite::new(&req).to_ics();
        let bare_lf = ics
            .char_indices()
            .filter(|&(i, c)| c == '\n' && (i == 0 || ics.as_bytes()[i - 1] != b'\r'))
            .count();
        assert_eq!(bare_lf, 0);
    }

    #[test]
    fn utc_basic_format() {
        let dt = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(ics_utc(dt), "20240102T030405Z");
    }
}
