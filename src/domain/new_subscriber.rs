use serde::Deserialize;
use serde_json::Value;

use super::SubscriberEmail;
use super::SubscriptionTag;

#[derive(Debug)]
pub struct NewSubscriber {
    pub email: SubscriberEmail,
    pub tag: SubscriptionTag,
}

/// Inbound `/api/subscribe` body. Fields are kept as raw JSON so that a
/// missing or mistyped `email` can be reported by the relay itself, instead
/// of being rejected by the `Json` extractor with a framework error.
#[derive(Deserialize, Default, Debug)]
pub struct SubscribeBody {
    #[serde(default)]
    email: Value,
    #[serde(default)]
    source: Value,
    /// Honeypot; hidden from humans, so only bots fill it in.
    #[serde(default)]
    company: Value,
}

impl SubscribeBody {
    /// Anything that isn't a JSON object (including an empty or malformed
    /// body) is treated as `{}`.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        match serde_json::from_slice::<Value>(bytes) {
            Ok(v @ Value::Object(_)) => serde_json::from_value(v).unwrap_or_default(),
            _ => Self::default(),
        }
    }

    pub fn email(&self) -> Option<&str> { self.email.as_str() }

    /// `company` holds any truthy value
    pub fn is_bot(&self) -> bool {
        match &self.company {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
            Value::String(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) => true,
        }
    }

    /// `email` must be a non-empty JSON string. A `source` that is not a
    /// string is ignored.
    pub fn into_new_subscriber(
        self,
        default_tag: &str,
    ) -> Result<NewSubscriber, String> {
        let email = match self.email {
            Value::String(s) => SubscriberEmail::parse(s)?,
            other => return Err(format!("Email is not a string: {other}")),
        };
        let source = match self.source {
            Value::String(s) => Some(s),
            _ => None,
        };
        Ok(NewSubscriber {
            email,
            tag: SubscriptionTag::parse(source, default_tag),
        })
    }
}
