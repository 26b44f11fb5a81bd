use std::time::Duration;

use reqwest::header;
use reqwest::Client;
use reqwest::StatusCode;
use secrecy::ExposeSecret;
use serde::Serialize;
use serde_json::Value;

use crate::domain::ApiCredential;
use crate::domain::NewSubscriber;

/// Client for the newsletter provider's subscriber API (Buttondown).
///
/// Establishing a connection is expensive, so a single `Client` (which pools
/// connections internally) is built at startup and shared by all requests via
/// `web::Data`.
pub struct NewsletterClient {
    http_client: Client,
    base_url: String,
}

#[derive(Serialize)]
struct CreateSubscriberRequest<'a> {
    email_address: &'a str,
    tags: [&'a str; 1],
}

/// Status and body of a provider response, as received.
#[derive(Debug)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub body: UpstreamBody,
}

/// The provider usually answers with JSON, but some error paths (e.g. a
/// gateway in front of it) return plain text.
#[derive(Debug, Clone, PartialEq)]
pub enum UpstreamBody {
    /// Parsed value, plus the text exactly as received (whitespace, key order)
    Json { value: Value, text: String },
    /// Unparsable, empty, or a literal `null`
    Text(String),
}

impl UpstreamBody {
    /// A single parse attempt; on failure, the raw text is kept.
    pub fn parse(text: String) -> Self {
        match serde_json::from_str::<Value>(&text) {
            Ok(Value::Null) | Err(_) => Self::Text(text),
            Ok(value) => Self::Json { value, text },
        }
    }

    /// Body exactly as received
    pub fn text(&self) -> &str {
        match self {
            Self::Json { text, .. } | Self::Text(text) => text,
        }
    }

    /// Field of a JSON object body, if any
    pub fn field(
        &self,
        key: &str,
    ) -> Option<&Value> {
        match self {
            Self::Json { value, .. } => value.get(key).filter(|v| !v.is_null()),
            Self::Text(_) => None,
        }
    }
}

impl NewsletterClient {
    pub fn new(
        base_url: String,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        // the timeout covers the whole exchange (connect, send, read body)
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            base_url,
        })
    }

    /// `POST /v1/subscribers`. Any HTTP status is returned as `Ok`; only
    /// transport-level faults (connection, timeout, unreadable body) are
    /// `Err`.
    #[tracing::instrument(
        name = "Creating subscriber at newsletter provider",
        skip(self, credential, new_sub),
        fields(
            tag = %new_sub.tag.as_ref(),
            status = tracing::field::Empty,
        )
    )]
    pub async fn create_subscriber(
        &self,
        credential: &ApiCredential,
        new_sub: &NewSubscriber,
    ) -> Result<UpstreamResponse, reqwest::Error> {
        let url = format!("{}/v1/subscribers", self.base_url);
        let body = CreateSubscriberRequest {
            email_address: new_sub.email.as_ref(),
            tags: [new_sub.tag.as_ref()],
        };

        let resp = self
            .http_client
            .post(url)
            // the provider rejects anything other than exactly "Token <key>"
            .header(
                header::AUTHORIZATION,
                format!("Token {}", credential.expose_secret()),
            )
            .header(header::ACCEPT, "application/json")
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        tracing::Span::current().record("status", status.as_u16());

        // read as text, not `resp.json()`: error bodies are not always JSON, and
        // the text is needed verbatim for the rejection message
        let text = resp.text().await?;
        Ok(UpstreamResponse {
            status,
            body: UpstreamBody::parse(text),
        })
    }
}
