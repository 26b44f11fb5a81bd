#[derive(Debug, Clone)]
/// An address as submitted by a visitor. Only presence is checked here; the
/// newsletter provider is the source of truth for whether it is deliverable.
pub struct SubscriberEmail(String);

impl SubscriberEmail {
    pub fn parse(email: String) -> Result<Self, String> {
        match email.is_empty() {
            true => Err("Empty email".to_string()),
            false => Ok(Self(email)),
        }
    }
}

impl AsRef<str> for SubscriberEmail {
    fn as_ref(&self) -> &str { &self.0 }
}
