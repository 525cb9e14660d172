//! Readiness probing.
//!
//! A probe is one `GET` of the health URL with its own timeout. A slow or
//! failed probe only counts as "not ready yet"; the caller's overall
//! deadline decides when to give up.

use std::time::Duration;

use tokio::time::Instant;

use crate::error::Error;
use crate::user_agent;

/// Issues health probes against one URL.
#[derive(Debug, Clone)]
pub(crate) struct Probe {
    http: reqwest::Client,
    url: String,
}

impl Probe {
    pub(crate) fn new(url: impl Into<String>, probe_timeout: Duration) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .timeout(probe_timeout)
            .user_agent(user_agent::user_agent())
            .build()
            .map_err(|e| {
                Error::configuration(format!("failed to create probe client: {}", e)).with_source(e)
            })?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }

    pub(crate) fn url(&self) -> &str {
        &self.url
    }

    /// Returns `true` if the health endpoint answered 2xx.
    pub(crate) async fn check(&self) -> bool {
        match self.http.get(&self.url).send().await {
            Ok(response) => {
                let healthy = response.status().is_success();
                if !healthy {
                    tracing::trace!(url = %self.url, status = response.status().as_u16(), "probe not healthy");
                }
                healthy
            }
            Err(e) => {
                tracing::trace!(url = %self.url, error = %e, "probe failed");
                false
            }
        }
    }
}

/// Polls `url` until it answers 2xx or `timeout` elapses.
///
/// Used for gateways the harness did not start. Fails with
/// `StartupTimeout`.
///
/// ```rust,ignore
/// wait_for_health("http://127.0.0.1:8080/health", Duration::from_secs(1),
///     Duration::from_millis(500), Duration::from_secs(30)).await?;
/// ```
pub async fn wait_for_health(
    url: &str,
    probe_timeout: Duration,
    interval: Duration,
    timeout: Duration,
) -> Result<(), Error> {
    let probe = Probe::new(url, probe_timeout)?;
    let deadline = Instant::now() + timeout;

    loop {
        if probe.check().await {
            tracing::debug!(url, "gateway is healthy");
            return Ok(());
        }
        let now = Instant::now();
        if now >= deadline {
            return Err(Error::startup_timeout(format!(
                "{} did not become healthy within {:?}",
                url, timeout
            )));
        }
        tokio::time::sleep(interval.min(deadline - now)).await;
    }
}
