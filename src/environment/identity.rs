//! Per-environment unique identities.

use uuid::Uuid;

use crate::secret::Secret;

/// Credentials of the user an environment registers.
#[derive(Debug, Clone)]
pub struct Identity {
    /// Email address, unique per environment.
    pub email: String,
    /// Username, unique per environment.
    pub username: String,
    /// Login password.
    pub password: Secret,
}

impl Identity {
    /// Generates a fresh identity whose names start with `prefix`.
    ///
    /// ```rust
    /// use redisgate_harness::Identity;
    ///
    /// let a = Identity::generate("it");
    /// let b = Identity::generate("it");
    /// assert!(a.username.starts_with("it-"));
    /// assert_ne!(a.email, b.email);
    /// ```
    pub fn generate(prefix: &str) -> Self {
        let id = Uuid::new_v4().simple().to_string();
        Self {
            email: format!("{}-{}@example.com", prefix, id),
            username: format!("{}-{}", prefix, &id[..12]),
            password: Secret::new(format!("Pw-{}", Uuid::new_v4().simple())),
        }
    }

    /// Returns a unique resource name derived from this identity.
    pub(crate) fn resource_name(&self, kind: &str) -> String {
        format!("{}-{}", self.username, kind)
    }
}
