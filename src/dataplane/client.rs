//! The data-plane client.

use std::sync::Arc;

use reqwest::header::{AUTHORIZATION, HeaderValue};
use serde_json::Value;

use super::TokenTransport;
use super::request::{
    Route, expect_count, expect_optional_text, expect_text, parse_result,
};
use crate::Secret;
use crate::config::DataPlaneConfig;
use crate::control::segment;
use crate::error::Error;
use crate::user_agent;

/// A key-value client bound to one data instance and one credential.
///
/// `DataPlaneClient` is `Clone` and safe for concurrent use; clones share
/// the connection pool.
///
/// ## Example
///
/// ```rust,ignore
/// let kv = DataPlaneClient::new(gateway_url, &instance.id, issued.secret.clone())?;
///
/// assert_eq!(kv.ping().await?, "PONG");
/// kv.set("greeting", "hello").await?;
/// assert_eq!(kv.get("greeting").await?.as_deref(), Some("hello"));
/// assert_eq!(kv.delete("greeting").await?, 1);
/// assert_eq!(kv.get("greeting").await?, None);
/// ```
#[derive(Clone)]
pub struct DataPlaneClient {
    inner: Arc<DataPlaneInner>,
    transport: TokenTransport,
}

struct DataPlaneInner {
    http: reqwest::Client,
    base_url: String,
    instance_id: String,
    secret: Secret,
    config: DataPlaneConfig,
}

impl DataPlaneClient {
    /// Creates a client with the default configuration.
    pub fn new(
        base_url: impl AsRef<str>,
        instance_id: impl Into<String>,
        secret: impl Into<Secret>,
    ) -> Result<Self, Error> {
        Self::with_config(base_url, instance_id, secret, DataPlaneConfig::default())
    }

    /// Creates a client with the given configuration.
    pub fn with_config(
        base_url: impl AsRef<str>,
        instance_id: impl Into<String>,
        secret: impl Into<Secret>,
        config: DataPlaneConfig,
    ) -> Result<Self, Error> {
        let base_url = base_url.as_ref();
        url::Url::parse(base_url)?;

        let instance_id = instance_id.into();
        if instance_id.is_empty() {
            return Err(Error::configuration("data instance id is empty"));
        }

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(user_agent::user_agent())
            .build()
            .map_err(|e| {
                Error::configuration(format!("failed to create HTTP client: {}", e)).with_source(e)
            })?;

        Ok(Self {
            transport: config.token_transport,
            inner: Arc::new(DataPlaneInner {
                http,
                base_url: base_url.trim_end_matches('/').to_string(),
                instance_id,
                secret: secret.into(),
                config,
            }),
        })
    }

    /// Returns a clone that sends the secret the given way.
    #[must_use]
    pub fn with_token_transport(&self, transport: TokenTransport) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            transport,
        }
    }

    /// Returns the data instance this client is bound to.
    pub fn instance_id(&self) -> &str {
        &self.inner.instance_id
    }

    /// Returns how the secret is sent.
    pub fn token_transport(&self) -> TokenTransport {
        self.transport
    }

    /// Sends `PING`. A healthy instance answers `"PONG"`.
    pub async fn ping(&self) -> Result<String, Error> {
        let route = Route::Path {
            op: "ping",
            segments: Vec::new(),
            query: Vec::new(),
        };
        expect_text(self.execute(route).await?, "PING")
    }

    /// Stores `value` under `key`. Returns `"OK"`.
    pub async fn set(&self, key: &str, value: &str) -> Result<String, Error> {
        let route = Route::choose(
            "set",
            vec![key.to_string(), value.to_string()],
            Vec::new(),
            vec!["SET".to_string(), key.to_string(), value.to_string()],
            self.inner.config.inline_value_limit,
        );
        expect_text(self.execute(route).await?, "SET")
    }

    /// Stores `value` under `key` with a time-to-live in seconds.
    ///
    /// The gateway only honors `EX` on the path form. A key or value that has
    /// to go through the command body (empty, dot segment, or over the inline
    /// limit) is rejected with `Validation` instead of silently losing its TTL.
    pub async fn set_with_expiry(
        &self,
        key: &str,
        value: &str,
        seconds: u64,
    ) -> Result<String, Error> {
        if seconds == 0 {
            return Err(Error::validation("expiry must be at least one second"));
        }
        let route = Route::choose(
            "set",
            vec![key.to_string(), value.to_string()],
            vec![("EX", seconds.to_string())],
            vec!["SET".to_string(), key.to_string(), value.to_string()],
            self.inner.config.inline_value_limit,
        );
        if matches!(route, Route::Command(_)) {
            return Err(Error::validation(
                "expiry requires a key and value that fit in the request path",
            ));
        }
        expect_text(self.execute(route).await?, "SET")
    }

    /// Reads `key`. A missing key is `Ok(None)`.
    pub async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        let route = Route::choose(
            "get",
            vec![key.to_string()],
            Vec::new(),
            vec!["GET".to_string(), key.to_string()],
            self.inner.config.inline_value_limit,
        );
        expect_optional_text(self.execute(route).await?)
    }

    /// Deletes `key`. Returns the number of keys removed (0 or 1).
    pub async fn delete(&self, key: &str) -> Result<u64, Error> {
        let route = Route::choose(
            "del",
            vec![key.to_string()],
            Vec::new(),
            vec!["DEL".to_string(), key.to_string()],
            self.inner.config.inline_value_limit,
        );
        expect_count(self.execute(route).await?, "DEL")
    }

    /// Removes every key of the instance. Returns `"OK"`.
    pub async fn flush_all(&self) -> Result<String, Error> {
        let route = Route::Command(vec!["FLUSHALL".to_string()]);
        expect_text(self.execute(route).await?, "FLUSHALL")
    }

    /// Sends an arbitrary command through the generic endpoint and returns
    /// the raw `result`.
    ///
    /// ```rust,ignore
    /// let reply = kv.command(["SET", "k", "v"]).await?;
    /// assert_eq!(reply, serde_json::json!("OK"));
    /// ```
    pub async fn command<I, S>(&self, args: I) -> Result<Value, Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        if args.is_empty() {
            return Err(Error::validation("command is empty"));
        }
        self.execute(Route::Command(args)).await
    }

    async fn execute(&self, route: Route) -> Result<Value, Error> {
        let inner = &self.inner;
        let op = route.op_name().to_string();

        let request = match route {
            Route::Path {
                op,
                segments,
                query,
            } => {
                let mut path = format!(
                    "{}/redis/{}/{}",
                    inner.base_url,
                    segment(&inner.instance_id),
                    op
                );
                for s in &segments {
                    path.push('/');
                    path.push_str(&segment(s));
                }
                let mut url = url::Url::parse(&path)?;
                if !query.is_empty() {
                    let mut pairs = url.query_pairs_mut();
                    for (name, value) in &query {
                        pairs.append_pair(name, value);
                    }
                }
                inner.http.get(self.authorize_url(url))
            }
            Route::Command(args) => {
                let path = format!("{}/redis/{}", inner.base_url, segment(&inner.instance_id));
                let url = url::Url::parse(&path)?;
                inner.http.post(self.authorize_url(url)).json(&args)
            }
        };

        let request = match self.transport {
            TokenTransport::Header => {
                let value = HeaderValue::from_str(&format!("Bearer {}", inner.secret.expose()))
                    .map_err(|_| Error::configuration("credential secret is not a valid header value"))?;
                request.header(AUTHORIZATION, value)
            }
            TokenTransport::Query => request,
        };

        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        tracing::debug!(
            instance_id = %inner.instance_id,
            op = %op,
            status,
            transport = %self.transport,
            "data plane call"
        );

        if !(200..300).contains(&status) {
            return Err(Error::data_plane(status, body));
        }

        parse_result(&body).map_err(|e| e.with_response(status, body))
    }

    fn authorize_url(&self, mut url: url::Url) -> url::Url {
        if self.transport == TokenTransport::Query {
            url.query_pairs_mut()
                .append_pair("_token", self.inner.secret.expose());
        }
        url
    }
}

impl std::fmt::Debug for DataPlaneClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataPlaneClient")
            .field("base_url", &self.inner.base_url)
            .field("instance_id", &self.inner.instance_id)
            .field("transport", &self.transport)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}
