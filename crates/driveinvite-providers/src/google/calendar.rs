//! Google Calendar v3 client.

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use driveinvite_core::EventRequest;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::auth::TokenSource;
use crate::error::ProviderResult;
use crate::notify::{CalendarService, CreatedEvent};
use crate::remote::BoxFuture;

use super::config::GoogleConfig;
use super::http::{build_http_client, check_status, read_json, transport_error};

const SERVICE: &str = "calendar";

/// Calendar API client.
pub struct CalendarClient {
    http_client: reqwest::Client,
    tokens: Arc<dyn TokenSource>,
    api_base: String,
}

#[derive(Debug, Serialize)]
struct EventTime {
    #[serde(rename = "dateTime")]
    date_time: String,
    #[serde(rename = "timeZone")]
    time_zone: &'static str,
}

impl EventTime {
    fn utc(at: DateTime<Utc>) -> Self {
        Self {
            date_time: at.to_rfc3339_opts(SecondsFormat::Secs, true),
            time_zone: "UTC",
        }
    }
}

#[derive(Debug, Serialize)]
struct Attendee<'a> {
    email: &'a str,
}

#[derive(Debug, Serialize)]
struct EventBody<'a> {
    summary: &'a str,
    description: &'a str,
    start: EventTime,
    end: EventTime,
    attendees: [Attendee<'a>; 1],
}

impl<'a> From<&'a EventRequest> for EventBody<'a> {
    fn from(request: &'a EventRequest) -> Self {
        Self {
            summary: &request.summary,
            description: &request.description,
            start: EventTime::utc(request.start),
            end: EventTime::utc(request.end),
            attendees: [Attendee {
                email: &request.recipient,
            }],
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InsertedEvent {
    id: String,
    #[serde(default)]
    html_link: Option<String>,
    #[serde(default, rename = "iCalUID")]
    ical_uid: Option<String>,
}

impl CalendarClient {
    pub fn new(tokens: Arc<dyn TokenSource>, config: &GoogleConfig) -> ProviderResult<Self> {
        Ok(Self {
            http_client: build_http_client(config.timeout, &config.user_agent)?,
            tokens,
            api_base: config.endpoints.api_base.trim_end_matches('/').to_string(),
        })
    }

    async fn insert_event_impl(
        &self,
        calendar_id: &str,
        request: &EventRequest,
    ) -> ProviderResult<CreatedEvent> {
        let token = self.tokens.access_token().await?;
        let url = format!(
            "{}/calendar/v3/calendars/{}/events",
            self.api_base,
            urlencoding::encode(calendar_id)
        );

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(token)
            .json(&EventBody::from(request))
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;
        let response = check_status(SERVICE, response).await?;
        let inserted: InsertedEvent = read_json(SERVICE, response).await?;

        debug!(calendar_id, id = %inserted.id, "event inserted");
        Ok(CreatedEvent {
            id: inserted.id,
            html_link: inserted.html_link,
            ical_uid: inserted.ical_uid,
        })
    }
}

impl CalendarService for CalendarClient {
    fn insert_event<'a>(
        &'a self,
        calendar_id: &'a str,
        request: &'a EventRequest,
    ) -> BoxFuture<'a, ProviderResult<CreatedEvent>> {
        Box::pin(self.insert_event_impl(calendar_id, request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticToken;
    use crate::error::ProviderErrorCode;
    use crate::google::config::{GoogleEndpoints, OAuthCredentials};
    use chrono::TimeZone;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> CalendarClient {
        let config = GoogleConfig::new(OAuthCredentials::new(
            "test-client.apps.googleusercontent.com",
            "secret",
        ))
        .with_endpoints(GoogleEndpoints::with_base(&server.uri()));
        CalendarClient::new(Arc::new(StaticToken::new("t0k")), &config).unwrap()
    }

    fn request() -> EventRequest {
        EventRequest::new(
            "guest@example.com",
            "Kickoff",
            Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 15, 11, 30, 0).unwrap(),
        )
        .with_description("Event description\n\nFolder link: https://drive/F1")
    }

    #[tokio::test]
    async fn inserts_event_with_attendee() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/calendar/v3/calendars/primary/events"))
            .and(header("authorization", "Bearer t0k"))
            .and(body_json(serde_json::json!({
                "summary": "Kickoff",
                "description": "Event description\n\nFolder link: https://drive/F1",
                "start": {"dateTime": "2024-03-15T10:00:00Z", "timeZone": "UTC"},
                "end": {"dateTime": "2024-03-15T11:30:00Z", "timeZone": "UTC"},
                "attendees": [{"email": "guest@example.com"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "evt1",
                "htmlLink": "https://calendar.google.com/event?eid=evt1",
                "iCalUID": "evt1@google.com"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let event = client(&server)
            .insert_event("primary", &request())
            .await
            .unwrap();

        assert_eq!(event.id, "evt1");
        assert_eq!(event.ical_uid.as_deref(), Some("evt1@google.com"));
        assert!(event.html_link.unwrap().contains("eid=evt1"));
    }

    #[tokio::test]
    async fn calendar_id_is_encoded() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/calendar/v3/calendars/team%40example.com/events"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "e"})))
            .expect(1)
            .mount(&server)
            .await;

        let event = client(&server)
            .insert_event("team@example.com", &request())
            .await
            .unwrap();
        assert!(event.html_link.is_none());
    }

    #[tokio::test]
    async fn rate_limit_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "10"))
            .mount(&server)
            .await;

        let err = client(&server)
            .insert_event("primary", &request())
            .await
            .unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::RateLimited);
    }
}
