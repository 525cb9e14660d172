//! Redacted, zeroize-on-drop secret strings.

use std::fmt;

use zeroize::Zeroizing;

/// A secret string such as a session token or API-key value.
///
/// The contents are wiped from memory on drop and never appear in `Debug`
/// output. Use [`expose`](Secret::expose) to read the value when it has to
/// go on the wire.
///
/// ```rust
/// use redisgate_harness::Secret;
///
/// let secret = Secret::new("rg_live_4f9c");
/// assert_eq!(secret.expose(), "rg_live_4f9c");
/// assert_eq!(format!("{:?}", secret), "Secret([REDACTED])");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(Zeroizing<String>);

impl Secret {
    /// Wraps a secret value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(Zeroizing::new(value.into()))
    }

    /// Returns the secret value.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the secret is the empty string.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret([REDACTED])")
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
