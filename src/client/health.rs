//! Gateway health and version reports.
//!
//! ```rust,ignore
//! let health = client.health().await?;
//! assert!(health.is_healthy(), "gateway degraded: {}", health.summary());
//! ```

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Response of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    /// Overall status reported by the gateway (`"ok"` when serving).
    #[serde(default)]
    pub status: String,
    /// Status of the gateway's storage backend, if reported.
    #[serde(default)]
    pub database: Option<String>,
    /// Server-side timestamp of the check.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    /// Round-trip latency measured by the harness.
    #[serde(skip)]
    pub latency: Duration,
}

impl HealthReport {
    /// Returns `true` if the gateway and its storage report healthy.
    pub fn is_healthy(&self) -> bool {
        let serving = matches!(self.status.as_str(), "ok" | "healthy");
        let storage = self.database.as_deref().is_none_or(|db| db == "healthy");
        serving && storage
    }

    /// Returns a one-line summary.
    pub fn summary(&self) -> String {
        match &self.database {
            Some(db) => format!(
                "status={} database={} latency={}ms",
                self.status,
                db,
                self.latency.as_millis()
            ),
            None => format!("status={} latency={}ms", self.status, self.latency.as_millis()),
        }
    }
}

/// Response of `GET /version`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayVersion {
    /// Service name.
    pub name: String,
    /// Service version.
    pub version: String,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
}
