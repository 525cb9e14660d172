//! Response-contract settings for the gateway's management API.
//!
//! Different gateway versions answer the same endpoint with different
//! shapes: `200` or `201`, `{success, data}` envelopes or bare objects,
//! `data.user` or a top-level `user`, and an `error` or `message` field on
//! failure. The contract decides which of those shapes the workflow client
//! accepts.

/// How strictly the `{success, data, error}` envelope is required.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnvelopePolicy {
    /// Accept enveloped and bare bodies alike.
    #[default]
    Tolerant,
    /// Reject bodies that are not wrapped in an envelope.
    Required,
}

/// The response contract the workflow client holds the gateway to.
///
/// ## Example
///
/// ```rust
/// use redisgate_harness::{ApiContract, EnvelopePolicy};
///
/// let contract = ApiContract::strict();
/// assert_eq!(contract.envelope, EnvelopePolicy::Required);
/// assert!(ApiContract::default().accepts_raw());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ApiContract {
    /// Envelope requirement for 2xx bodies.
    pub envelope: EnvelopePolicy,
}

impl ApiContract {
    /// Accepts every known response shape. This is the default.
    pub fn tolerant() -> Self {
        Self {
            envelope: EnvelopePolicy::Tolerant,
        }
    }

    /// Requires every management response to be enveloped.
    pub fn strict() -> Self {
        Self {
            envelope: EnvelopePolicy::Required,
        }
    }

    /// Returns `true` if bare (non-enveloped) bodies are accepted.
    pub fn accepts_raw(&self) -> bool {
        self.envelope == EnvelopePolicy::Tolerant
    }
}
