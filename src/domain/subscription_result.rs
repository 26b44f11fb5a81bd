use serde::Serialize;

/// Successful outcome returned to the caller. Failures are `SubscribeError`s,
/// so an `ok` result never carries an error message.
#[derive(Serialize, Debug, PartialEq)]
pub struct SubscriptionResult {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    already: Option<bool>,
}

impl SubscriptionResult {
    /// The provider accepted the address, or already had it.
    pub fn subscribed(already: bool) -> Self {
        Self {
            ok: true,
            already: Some(already),
        }
    }

    /// Looks exactly like a success, minus `already`, so that bots cannot tell
    /// they were caught.
    pub fn honeypot() -> Self {
        Self {
            ok: true,
            already: None,
        }
    }

    pub fn already(&self) -> bool { self.already.unwrap_or(false) }
}
