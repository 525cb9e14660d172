//! Authenticated sessions.

use std::fmt;

use crate::Secret;
use crate::control::UserRecord;

/// A bearer token scoped to one authenticated user.
///
/// Obtained from [`WorkflowClient::login`](crate::WorkflowClient::login).
/// The token lives only in process memory and is redacted from `Debug`.
#[derive(Clone)]
pub struct Session {
    token: Secret,
    user: Option<UserRecord>,
}

impl Session {
    /// Creates a session from a token and the user it belongs to.
    pub fn new(token: impl Into<Secret>, user: Option<UserRecord>) -> Self {
        Self {
            token: token.into(),
            user,
        }
    }

    /// Returns the bearer token.
    pub fn token(&self) -> &Secret {
        &self.token
    }

    /// Returns the user embedded in the login response, if the gateway
    /// reported one.
    pub fn user(&self) -> Option<&UserRecord> {
        self.user.as_ref()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"[REDACTED]")
            .field("user", &self.user)
            .finish()
    }
}
