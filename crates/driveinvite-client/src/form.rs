//! Event form input.
//!
//! Dates are `DD/MM/YYYY` and times `HH:MM`, both read as UTC. Only
//! presence is checked beyond parsing: an end before the start is passed
//! through unchanged.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use driveinvite_core::EventRequest;

use crate::cli::SendArgs;
use crate::error::{ClientError, ClientResult};

const DATE_FORMAT: &str = "%d/%m/%Y";
const TIME_FORMAT: &str = "%H:%M";

/// The fields collected for one invitation.
#[derive(Debug, Clone, Default)]
pub struct EventForm {
    pub name: String,
    pub recipient: String,
    pub start_date: String,
    pub start_time: String,
    pub end_date: String,
    pub end_time: String,
}

impl From<&SendArgs> for EventForm {
    fn from(args: &SendArgs) -> Self {
        Self {
            name: args.name.clone(),
            recipient: args.to.clone(),
            start_date: args.start_date.clone(),
            start_time: args.start_time.clone(),
            end_date: args.end_date.clone(),
            end_time: args.end_time.clone(),
        }
    }
}

impl EventForm {
    /// Checks that every field is filled in and that the name and recipient,
    /// which end up in mail headers and calendar properties, hold no control
    /// characters.
    pub fn validate(&self) -> ClientResult<()> {
        let fields = [
            ("name", &self.name),
            ("recipient", &self.recipient),
            ("start date", &self.start_date),
            ("start time", &self.start_time),
            ("end date", &self.end_date),
            ("end time", &self.end_time),
        ];
        let missing: Vec<&str> = fields
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(label, _)| *label)
            .collect();

        if !missing.is_empty() {
            return Err(ClientError::Input(format!(
                "please fill in all fields (missing: {})",
                missing.join(", ")
            )));
        }

        for (label, value) in [("name", &self.name), ("recipient", &self.recipient)] {
            if value.chars().any(char::is_control) {
                return Err(ClientError::Input(format!(
                    "{} must not contain control characters",
                    label
                )));
            }
        }
        Ok(())
    }

    /// Validates the form and builds the event request.
    ///
    /// The description is left empty; it is filled in once the folder link
    /// is known.
    pub fn to_request(&self) -> ClientResult<EventRequest> {
        self.validate()?;
        let start = parse_datetime(&self.start_date, &self.start_time)?;
        let end = parse_datetime(&self.end_date, &self.end_time)?;
        Ok(EventRequest::new(
            self.recipient.trim(),
            self.name.trim(),
            start,
            end,
        ))
    }
}

/// Parses a `DD/MM/YYYY` date and an `HH:MM` time as a UTC instant.
pub fn parse_datetime(date: &str, time: &str) -> ClientResult<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(date.trim(), DATE_FORMAT).map_err(|e| {
        ClientError::Input(format!("invalid date '{}' (expected DD/MM/YYYY): {}", date, e))
    })?;
    let time = NaiveTime::parse_from_str(time.trim(), TIME_FORMAT).map_err(|e| {
        ClientError::Input(format!("invalid time '{}' (expected HH:MM): {}", time, e))
    })?;
    Ok(NaiveDateTime::new(date, time).and_utc())
}
