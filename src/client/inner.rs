//! Internal client implementation.

use parking_lot::RwLock;
use reqwest::Method;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::Session;
use super::envelope::{Envelope, error_text};
use crate::config::{ApiContract, ClientConfig};
use crate::error::{Error, ErrorKind};
use crate::user_agent;

/// Which family of management endpoint a call targets.
///
/// The family decides whether a session is required and how failure
/// statuses are classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Endpoint {
    /// `POST /auth/register`.
    Register,
    /// `POST /auth/login`.
    Login,
    /// Public endpoints such as `/health`. These answer with bare bodies
    /// under every contract.
    Anonymous,
    /// Everything under `/api`, which requires a bearer token.
    Authenticated,
}

impl Endpoint {
    fn requires_session(self) -> bool {
        self == Endpoint::Authenticated
    }

    /// Kind reported for a 2xx envelope that says `success: false`.
    fn rejection_kind(self) -> ErrorKind {
        match self {
            Endpoint::Login => ErrorKind::Authentication,
            Endpoint::Register => ErrorKind::Validation,
            Endpoint::Anonymous | Endpoint::Authenticated => ErrorKind::InvalidResponse,
        }
    }
}

pub(crate) struct ClientInner {
    /// Gateway base URL without a trailing slash.
    pub base_url: String,

    /// Client configuration.
    pub config: ClientConfig,

    /// HTTP client for management calls.
    http: reqwest::Client,

    /// Session attached to authenticated calls.
    session: RwLock<Option<Session>>,
}

impl ClientInner {
    pub(crate) fn new(base_url: &str, config: ClientConfig) -> Result<Self, Error> {
        let parsed = url::Url::parse(base_url)?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::configuration(format!(
                "gateway URL must be http or https: {}",
                base_url
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(
                config
                    .user_agent
                    .clone()
                    .unwrap_or_else(|| user_agent::user_agent().to_string()),
            )
            .build()
            .map_err(|e| {
                Error::configuration(format!("failed to create HTTP client: {}", e)).with_source(e)
            })?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            config,
            http,
            session: RwLock::new(None),
        })
    }

    /// Returns a copy of the attached session.
    pub(crate) fn session(&self) -> Option<Session> {
        self.session.read().clone()
    }

    /// Attaches a session to all subsequent authenticated calls.
    pub(crate) fn set_session(&self, session: Session) {
        *self.session.write() = Some(session);
    }

    /// Returns `true` if a session is attached.
    pub(crate) fn has_session(&self) -> bool {
        self.session.read().is_some()
    }

    /// Builds the URL for a management endpoint.
    ///
    /// The path is appended to the base URL, so a gateway mounted under a
    /// path prefix keeps it.
    fn build_url(&self, path: &str) -> Result<url::Url, Error> {
        Ok(url::Url::parse(&format!("{}{}", self.base_url, path))?)
    }

    /// Builds headers for a management request.
    fn build_headers(&self, endpoint: Endpoint) -> Result<HeaderMap, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        if endpoint.requires_session() {
            let guard = self.session.read();
            let session = guard.as_ref().ok_or_else(|| {
                Error::unauthorized("no authenticated session; call login() first")
            })?;
            let auth_value = format!("Bearer {}", session.token().expose());
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&auth_value)
                    .map_err(|_| Error::unauthorized("session token is not a valid header value"))?,
            );
        }

        Ok(headers)
    }

    /// Makes a request without a body and returns the normalized payload.
    pub(crate) async fn send(
        &self,
        method: Method,
        path: &str,
        endpoint: Endpoint,
    ) -> Result<Value, Error> {
        let headers = self.build_headers(endpoint)?;
        let url = self.build_url(path)?;
        let request = self.http.request(method.clone(), url).headers(headers);
        self.execute(request, &method, path, endpoint).await
    }

    /// Makes a request with a JSON body and returns the normalized payload.
    pub(crate) async fn send_json<B>(
        &self,
        method: Method,
        path: &str,
        endpoint: Endpoint,
        body: &B,
    ) -> Result<Value, Error>
    where
        B: Serialize + ?Sized,
    {
        let headers = self.build_headers(endpoint)?;
        let url = self.build_url(path)?;
        let request = self
            .http
            .request(method.clone(), url)
            .headers(headers)
            .json(body);
        self.execute(request, &method, path, endpoint).await
    }

    async fn execute(
        &self,
        request: reqwest::RequestBuilder,
        method: &Method,
        path: &str,
        endpoint: Endpoint,
    ) -> Result<Value, Error> {
        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        tracing::debug!(%method, path, status, "management call");

        if !(200..300).contains(&status) {
            return Err(map_status_error(endpoint, status, &body));
        }

        // No-content answers carry nothing to envelope
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }

        let contract = match endpoint {
            Endpoint::Anonymous => ApiContract::tolerant(),
            _ => self.config.contract,
        };

        Envelope::parse(&body)
            .and_then(|envelope| envelope.normalize(&contract, endpoint.rejection_kind()))
            .map_err(|e| e.with_response(status, body))
    }
}

/// Decodes a normalized payload into a typed value.
pub(crate) fn decode<T>(payload: Value) -> Result<T, Error>
where
    T: DeserializeOwned,
{
    serde_json::from_value(payload)
        .map_err(|e| Error::invalid_response(format!("unexpected payload shape: {}", e)).with_source(e))
}

/// Maps a non-2xx management response to an error.
pub(crate) fn map_status_error(endpoint: Endpoint, status: u16, body: &str) -> Error {
    let kind = match (endpoint, status) {
        (Endpoint::Login, 401 | 403) => ErrorKind::Authentication,
        (Endpoint::Register, 409) => ErrorKind::RegistrationConflict,
        (_, 400 | 422) => ErrorKind::Validation,
        (_, 401) => ErrorKind::Unauthorized,
        (_, 403) => ErrorKind::Forbidden,
        (_, 404) => ErrorKind::NotFound,
        (_, 409) => ErrorKind::Conflict,
        (_, 500..=599) => ErrorKind::Server,
        _ => ErrorKind::UnexpectedStatus,
    };

    let text = error_text(body);
    let message = if text.is_empty() {
        format!("gateway returned HTTP {}", status)
    } else {
        text
    };

    Error::new(kind, message).with_response(status, body)
}
