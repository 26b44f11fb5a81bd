//! Mapping of provider responses onto the relay's own contract.
//!
//! The provider has no machine-readable "duplicate" code; it reports an
//! existing subscriber only through free text, in one of two shapes:
//!
//! ```json
//! {"detail": "email_address already subscribed"}
//! {"non_field_errors": ["This field already exists."]}
//! ```
//!
//! Both are matched by `is_already_subscribed`, which is the only place the
//! wording is inspected.

use serde_json::Value;

use crate::domain::SubscriptionResult;
use crate::newsletter_client::UpstreamBody;
use crate::newsletter_client::UpstreamResponse;
use crate::routes::SubscribeError;

const DUPLICATE_MARKER: &str = "already";
const FALLBACK_REJECTION: &str = "Subscription failed";

/// Text of a field used for message selection. Strings are taken as-is, other
/// values are rendered as compact JSON. `null`, `false`, `0` and `""` count as
/// absent, so the next candidate is tried.
fn as_text(v: &Value) -> Option<String> {
    match v {
        Value::Null | Value::Bool(false) => None,
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Rendering of a single `non_field_errors` entry when the list is joined;
/// only `null` becomes empty.
fn list_entry_text(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn mentions_duplicate(text: &str) -> bool { text.to_lowercase().contains(DUPLICATE_MARKER) }

pub fn is_already_subscribed(body: &UpstreamBody) -> bool {
    let in_detail = body
        .field("detail")
        .and_then(as_text)
        .is_some_and(|d| mentions_duplicate(&d));

    let in_non_field_errors = match body.field("non_field_errors") {
        Some(Value::Array(errors)) => {
            let joined = errors
                .iter()
                .map(list_entry_text)
                .collect::<Vec<_>>()
                .join(" ");
            mentions_duplicate(&joined)
        }
        _ => false,
    };

    in_detail || in_non_field_errors
}

/// First of: `detail`, `error`, the body exactly as received, a fixed fallback
pub fn rejection_message(body: &UpstreamBody) -> String {
    body.field("detail")
        .and_then(as_text)
        .or_else(|| body.field("error").and_then(as_text))
        .or_else(|| Some(body.text().to_string()).filter(|t| !t.is_empty()))
        .unwrap_or_else(|| FALLBACK_REJECTION.to_string())
}

/// Kept for diagnostics on the error path only.
pub fn raw_payload(body: &UpstreamBody) -> Value {
    match body {
        UpstreamBody::Json { value, .. } => value.clone(),
        UpstreamBody::Text(t) => Value::String(t.clone()),
    }
}

/// A duplicate is a success, even when the provider answered with an error
/// status: either way, the address is on the list.
pub fn classify(resp: UpstreamResponse) -> Result<SubscriptionResult, SubscribeError> {
    let already = is_already_subscribed(&resp.body);
    if resp.status.is_success() || already {
        return Ok(SubscriptionResult::subscribed(already));
    }
    Err(SubscribeError::UpstreamRejected {
        message: rejection_message(&resp.body),
        raw: raw_payload(&resp.body),
    })
}
