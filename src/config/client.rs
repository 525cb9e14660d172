//! HTTP client configuration for the workflow and data-plane clients.

use std::time::Duration;

use super::ApiContract;
use crate::dataplane::TokenTransport;

/// Default inline limit for values sent in a data-plane URL path.
pub const DEFAULT_INLINE_VALUE_LIMIT: usize = 2048;

/// Configuration for the management-API workflow client.
///
/// ## Example
///
/// ```rust
/// use redisgate_harness::{ApiContract, ClientConfig};
/// use std::time::Duration;
///
/// let config = ClientConfig::builder()
///     .request_timeout(Duration::from_secs(30))
///     .contract(ApiContract::strict())
///     .build();
/// assert_eq!(config.connect_timeout, Duration::from_secs(5));
/// ```
#[derive(Debug, Clone, bon::Builder)]
pub struct ClientConfig {
    /// Timeout for a single HTTP call.
    #[builder(default = Duration::from_secs(10))]
    pub request_timeout: Duration,

    /// Timeout for establishing a connection.
    #[builder(default = Duration::from_secs(5))]
    pub connect_timeout: Duration,

    /// Response shapes the client accepts.
    #[builder(default)]
    pub contract: ApiContract,

    /// Overrides the User-Agent header.
    #[builder(into)]
    pub user_agent: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Configuration for the data-plane client.
///
/// ## Example
///
/// ```rust
/// use redisgate_harness::{DataPlaneConfig, TokenTransport};
///
/// let config = DataPlaneConfig::builder()
///     .token_transport(TokenTransport::Query)
///     .build();
/// assert_eq!(config.inline_value_limit, 2048);
/// ```
#[derive(Debug, Clone, bon::Builder)]
pub struct DataPlaneConfig {
    /// Timeout for a single HTTP call.
    #[builder(default = Duration::from_secs(10))]
    pub request_timeout: Duration,

    /// How the credential secret travels with each request.
    #[builder(default)]
    pub token_transport: TokenTransport,

    /// Largest value (in bytes) sent as a URL path segment. Larger and empty
    /// values go through the command body instead.
    #[builder(default = DEFAULT_INLINE_VALUE_LIMIT)]
    pub inline_value_limit: usize,
}

impl Default for DataPlaneConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}
