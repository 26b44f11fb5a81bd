/// Tag attached to a new subscriber, describing where the signup happened
/// (e.g. which page the form was on).
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionTag(String);

impl SubscriptionTag {
    /// Falls back to `default` when `source` is absent or empty.
    pub fn parse(
        source: Option<String>,
        default: &str,
    ) -> Self {
        match source {
            Some(s) if !s.is_empty() => Self(s),
            _ => Self(default.to_string()),
        }
    }
}

impl AsRef<str> for SubscriptionTag {
    fn as_ref(&self) -> &str { &self.0 }
}
