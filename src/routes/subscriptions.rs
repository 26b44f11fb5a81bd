use std::fmt::Debug;

use actix_web::dev::ServiceResponse;
use actix_web::http::Method;
use actix_web::http::StatusCode;
use actix_web::middleware::ErrorHandlerResponse;
use actix_web::web;
use actix_web::HttpRequest;
use actix_web::HttpResponse;
use actix_web::ResponseError;
use serde_json::json;
use serde_json::Value;

use super::error_chain_fmt;
use crate::classification::classify;
use crate::configuration::NewsletterApiSettings;
use crate::configuration::API_KEY_ENV_VAR;
use crate::domain::ApiCredential;
use crate::domain::SubscribeBody;
use crate::domain::SubscriptionResult;
use crate::newsletter_client::NewsletterClient;

/// Upper bound on a `/api/subscribe` body. A signup is three short strings, so
/// anything near this size is not a real form submission.
pub const MAX_BODY_BYTES: usize = 16 * 1024;

/// Per-process relay settings, resolved once at startup. The credential is
/// trimmed here, and is `None` when unset or blank.
pub struct RelayConfig {
    pub credential: Option<ApiCredential>,
    pub default_tag: String,
}

impl RelayConfig {
    pub fn from_settings(settings: &NewsletterApiSettings) -> Self {
        Self {
            credential: settings.credential(),
            default_tag: settings.default_tag.clone(),
        }
    }
}

/// Every way a subscription attempt can fail. None of these are retried.
#[derive(thiserror::Error)]
pub enum SubscribeError {
    #[error("Method not allowed")]
    MethodNotAllowed,
    // deliberately vague; details only go to the server log
    #[error("Server not configured (missing API key)")]
    ServerMisconfigured,
    #[error("Valid email required")]
    InvalidRequest(String),
    /// Body over `MAX_BODY_BYTES`; raised by actix's `Bytes` extractor, before
    /// the handler runs.
    #[error("Request body too large")]
    PayloadTooLarge,
    /// The provider refused the address for a reason other than it already
    /// being subscribed.
    #[error("{message}")]
    UpstreamRejected { message: String, raw: Value },
    /// Network failure, timeout, or unreadable response
    #[error(transparent)]
    TransportFault(#[from] anyhow::Error),
}

impl Debug for SubscribeError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for SubscribeError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::InvalidRequest(_) | Self::UpstreamRejected { .. } => StatusCode::BAD_REQUEST,
            Self::ServerMisconfigured | Self::TransportFault(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// `{"ok": false, "error": ...}`, plus `raw` for provider rejections
    fn error_response(&self) -> HttpResponse<actix_web::body::BoxBody> {
        let body = match self {
            Self::UpstreamRejected { message, raw } => json!({
                "ok": false,
                "error": message,
                "raw": raw,
            }),
            Self::TransportFault(e) => {
                let message = e.to_string();
                json!({
                    "ok": false,
                    "error": match message.is_empty() {
                        true => "Server error".to_string(),
                        false => message,
                    },
                })
            }
            e => json!({
                "ok": false,
                "error": e.to_string(),
            }),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

/// Error handler for the `/api/subscribe` resource. actix answers an oversized
/// body with a plain-text 413 of its own; swap it for our JSON error body.
///
/// Registered with `ErrorHandlers`, so the original response is dropped and
/// only the request half is kept.
pub fn payload_too_large<B>(
    res: ServiceResponse<B>
) -> actix_web::Result<ErrorHandlerResponse<B>> {
    tracing::warn!(limit = MAX_BODY_BYTES, "rejected oversized subscription body");
    // the body is actix's plain-text message; only the request half is reused
    let (req, _) = res.into_parts();
    let resp = SubscribeError::PayloadTooLarge.error_response();
    Ok(ErrorHandlerResponse::Response(
        ServiceResponse::new(req, resp).map_into_right_body(),
    ))
}

/// The whole relay, minus actix: admission checks, honeypot, one call to the
/// provider, and classification of its answer.
///
/// Checks run in this order, and each one stops the attempt:
///     1. method is `POST`
///     2. API key is configured
///     3. `email` is a non-empty string
///     4. honeypot (`company`) is empty; if not, pretend to succeed
pub async fn relay_subscription(
    method: &Method,
    body: &[u8],
    config: &RelayConfig,
    client: &NewsletterClient,
) -> Result<SubscriptionResult, SubscribeError> {
    if *method != Method::POST {
        return Err(SubscribeError::MethodNotAllowed);
    }

    let Some(credential) = config.credential.as_ref() else {
        tracing::error!(
            "{API_KEY_ENV_VAR} missing. Set it in the environment (or as \
             `newsletter_api.api_key`) and restart the server."
        );
        return Err(SubscribeError::ServerMisconfigured);
    };
    tracing::info!(api_key = %credential.redacted(), "newsletter api key loaded");

    let body = SubscribeBody::from_bytes(body);
    if let Some(email) = body.email() {
        tracing::Span::current().record("subscriber_email", email);
    }

    // read before `into_new_subscriber` consumes the body; acted on only after
    // the email check, so bots without an email still get a 400
    let is_bot = body.is_bot();
    let new_sub = body
        .into_new_subscriber(&config.default_tag)
        .map_err(SubscribeError::InvalidRequest)?;

    if is_bot {
        tracing::info!("honeypot filled in, dropping subscription");
        return Ok(SubscriptionResult::honeypot());
    }

    // exactly one attempt; a failed call is never retried
    let resp = client
        .create_subscriber(credential, &new_sub)
        .await
        .map_err(|e| SubscribeError::TransportFault(e.into()))?;

    classify(resp)
}

/// `POST /api/subscribe`
///
/// Body is JSON: `{"email": "...", "source": "...", "company": "..."}`, where
/// only `email` is required. Any other method is answered with 405.
///
/// # Request example
///
/// ```sh
///     curl -v -H 'Content-Type: application/json' \
///         --data '{"email": "john@foo.com", "source": "homepage"}' \
///         http://127.0.0.1:8000/api/subscribe
/// ```
///
/// The raw body is taken as `Bytes` instead of `web::Json`, so that malformed
/// input gets the same JSON error body as a missing email. `Content-Type` is
/// not checked; the size limit (`MAX_BODY_BYTES`) is set on the resource, see
/// `startup::run`.
#[tracing::instrument(
    name = "Relaying new subscription",
    skip(req, body, config, client),
    fields(
        method = %req.method(),
        subscriber_email = tracing::field::Empty,
    )
)]
pub async fn subscribe(
    req: HttpRequest,
    body: web::Bytes,
    config: web::Data<RelayConfig>,
    client: web::Data<NewsletterClient>,
) -> Result<HttpResponse, SubscribeError> {
    let result = relay_subscription(req.method(), &body, &config, &client)
        .await
        .map_err(|e| {
            match &e {
                SubscribeError::InvalidRequest(reason) => {
                    tracing::warn!(reason = %reason, "rejected subscription request")
                }
                e => tracing::error!(
                    error.cause_chain = ?e,
                    error.message = %e,
                    "subscription failed"
                ),
            };
            e
        })?;
    tracing::info!(already = result.already(), "subscription relayed");
    Ok(HttpResponse::Ok().json(result))
}
