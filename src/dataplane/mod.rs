//! Data-plane client for the gateway's per-instance key-value endpoints.
//!
//! Every operation maps to one HTTP call against `/redis/{instance_id}`:
//!
//! | Operation | Request |
//! |-----------|---------|
//! | `ping` | `GET /redis/{id}/ping` |
//! | `set` | `GET /redis/{id}/set/{key}/{value}` |
//! | `set_with_expiry` | `GET /redis/{id}/set/{key}/{value}?EX={seconds}` |
//! | `get` | `GET /redis/{id}/get/{key}` |
//! | `delete` | `GET /redis/{id}/del/{key}` |
//! | `flush_all`, `command` | `POST /redis/{id}` with a JSON array body |
//!
//! Keys and values that cannot travel in a path segment (empty, or longer
//! than [`DataPlaneConfig::inline_value_limit`](crate::DataPlaneConfig))
//! are sent through the command body instead.
//!
//! ## Missing Keys
//!
//! A missing key is not an error: `get` returns `Ok(None)` and `delete`
//! returns `Ok(0)`.

mod client;
mod request;

pub use client::DataPlaneClient;

/// How the credential secret travels with each data-plane request.
///
/// `Authorization` headers are dropped when a request is redirected to a
/// different origin. `Query` puts the secret in `?_token=` so it survives
/// such hops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TokenTransport {
    /// `Authorization: Bearer <secret>`.
    #[default]
    Header,
    /// `?_token=<secret>`.
    Query,
}

impl std::fmt::Display for TokenTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenTransport::Header => f.write_str("header"),
            TokenTransport::Query => f.write_str("query"),
        }
    }
}
