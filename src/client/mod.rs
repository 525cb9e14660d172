//! The workflow client for the gateway's management API.
//!
//! A [`WorkflowClient`] starts anonymous and becomes authenticated after a
//! successful [`login`](WorkflowClient::login). From then on its session
//! token is attached to every `/api` call. It never reverts to anonymous; a
//! new client must be constructed for that.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use redisgate_harness::prelude::*;
//!
//! let client = WorkflowClient::new("http://127.0.0.1:8080")?;
//! client.register("ada@example.com", "ada", "correct-horse-battery").await?;
//! client.login("ada@example.com", "correct-horse-battery").await?;
//!
//! let org = client.create_organization("Acme Labs", Some("integration")).await?;
//! let instance = client.create_data_instance(&org.id, "cache", 256).await?;
//! let issued = client
//!     .create_access_credential(&org.id, "ci-key", &[Scope::Read, Scope::Write])
//!     .await?;
//! ```

mod envelope;
mod health;
pub(crate) mod inner;
mod session;

pub use health::{GatewayVersion, HealthReport};
pub use session::Session;

use std::sync::Arc;
use std::time::Instant;

use reqwest::Method;

use crate::config::ClientConfig;
use crate::error::Error;
use inner::{ClientInner, Endpoint, decode};

/// A stateful client for the gateway's management API.
///
/// ## Thread Safety
///
/// `WorkflowClient` is `Clone` and thread-safe. Clones share one session:
/// logging in through any clone authenticates all of them.
///
/// ## Example
///
/// ```rust
/// use redisgate_harness::WorkflowClient;
///
/// let client = WorkflowClient::new("http://127.0.0.1:8080").unwrap();
/// assert!(!client.is_authenticated());
/// assert_eq!(client.base_url(), "http://127.0.0.1:8080");
/// ```
#[derive(Clone)]
pub struct WorkflowClient {
    inner: Arc<ClientInner>,
}

impl WorkflowClient {
    /// Creates an anonymous client with the default configuration.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self, Error> {
        Self::with_config(base_url, ClientConfig::default())
    }

    /// Creates an anonymous client with the given configuration.
    pub fn with_config(base_url: impl AsRef<str>, config: ClientConfig) -> Result<Self, Error> {
        Ok(Self {
            inner: Arc::new(ClientInner::new(base_url.as_ref(), config)?),
        })
    }

    /// Returns the gateway base URL.
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Returns the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Returns `true` once a session is attached.
    pub fn is_authenticated(&self) -> bool {
        self.inner.has_session()
    }

    /// Returns the attached session, if any.
    pub fn session(&self) -> Option<Session> {
        self.inner.session()
    }

    /// Attaches an existing session, replacing the current one.
    pub fn set_session(&self, session: Session) {
        self.inner.set_session(session);
    }

    /// Calls `GET /health` and measures the round trip.
    pub async fn health(&self) -> Result<HealthReport, Error> {
        let started = Instant::now();
        let payload = self
            .inner
            .send(Method::GET, "/health", Endpoint::Anonymous)
            .await?;
        let mut report: HealthReport = decode(payload)?;
        report.latency = started.elapsed();
        Ok(report)
    }

    /// Calls `GET /version`.
    pub async fn version(&self) -> Result<GatewayVersion, Error> {
        let payload = self
            .inner
            .send(Method::GET, "/version", Endpoint::Anonymous)
            .await?;
        decode(payload)
    }

    /// Returns a reference to the inner client.
    pub(crate) fn inner(&self) -> &ClientInner {
        &self.inner
    }
}

impl std::fmt::Debug for WorkflowClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowClient")
            .field("base_url", &self.inner.base_url)
            .field("authenticated", &self.is_authenticated())
            .finish_non_exhaustive()
    }
}
