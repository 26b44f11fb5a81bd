use std::fmt::Display;

use secrecy::ExposeSecret;
use secrecy::Secret;

/// Provider API token. The value can only be read via `ExposeSecret`; for
/// logging, use `redacted`.
#[derive(Clone, Debug)]
pub struct ApiCredential(Secret<String>);

impl ApiCredential {
    /// Surrounding whitespace is trimmed; an empty result means the server is
    /// not configured.
    pub fn parse(raw: &Secret<String>) -> Option<Self> {
        let key = raw.expose_secret().trim();
        match key.is_empty() {
            true => None,
            false => Some(Self(Secret::new(key.to_string()))),
        }
    }

    pub fn redacted(&self) -> RedactedCredential {
        let key = self.0.expose_secret();
        RedactedCredential {
            len: key.chars().count(),
            prefix: key.chars().take(3).collect(),
        }
    }
}

impl ExposeSecret<String> for ApiCredential {
    fn expose_secret(&self) -> &String { self.0.expose_secret() }
}

/// Length and a 3 char prefix, e.g. `len=36, prefix="bd_***"`
pub struct RedactedCredential {
    len: usize,
    prefix: String,
}

impl Display for RedactedCredential {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "len={}, prefix=\"{}***\"", self.len, self.prefix)
    }
}
