//! Main error type for the harness.

use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt;

use super::ErrorKind;
use crate::environment::Stage;
use crate::supervisor::ProcessOutput;

/// Maximum number of response-body characters rendered by `Display`.
const DISPLAY_BODY_LIMIT: usize = 2048;

/// Maximum number of trailing process-output characters rendered by `Display`.
const DISPLAY_OUTPUT_LIMIT: usize = 4096;

/// The error type for every harness operation.
///
/// Besides the [`kind`](Error::kind) used for matching, an error carries the
/// context needed to diagnose a failed setup without re-running it:
///
/// ```text
/// Error
/// ├── kind: ErrorKind          (category for matching)
/// ├── message: String          (human-readable description)
/// ├── status: Option<u16>      (HTTP status, for gateway responses)
/// ├── body: Option<String>     (raw response body)
/// ├── output: Option           (exit code, stdout, stderr of a child process)
/// ├── stage: Option<Stage>     (resource-graph stage that failed)
/// └── source: Option           (underlying cause)
/// ```
///
/// ## Example
///
/// ```rust
/// use redisgate_harness::{Error, ErrorKind};
///
/// let err = Error::data_plane(500, r#"{"error":"Redis command failed"}"#);
/// assert_eq!(err.kind(), ErrorKind::DataPlane);
/// assert_eq!(err.status(), Some(500));
/// assert!(err.to_string().contains("Redis command failed"));
/// ```
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: Cow<'static, str>,
    status: Option<u16>,
    body: Option<String>,
    output: Option<Box<ProcessOutput>>,
    stage: Option<Stage>,
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

impl Error {
    /// Creates a new error with the given kind and message.
    pub fn new(kind: ErrorKind, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
            body: None,
            output: None,
            stage: None,
            source: None,
        }
    }

    /// Returns the error kind.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the HTTP status of the failed response, if any.
    #[inline]
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// Returns the raw body of the failed response, if any.
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// Returns the captured output of a failed child process, if any.
    pub fn output(&self) -> Option<&ProcessOutput> {
        self.output.as_deref()
    }

    /// Returns the resource-graph stage that failed, if the error surfaced
    /// while building a [`TestEnvironment`](crate::TestEnvironment).
    #[inline]
    pub fn stage(&self) -> Option<Stage> {
        self.stage
    }

    /// Attaches the HTTP status and body of the failed response.
    #[must_use]
    pub fn with_response(mut self, status: u16, body: impl Into<String>) -> Self {
        self.status = Some(status);
        self.body = Some(body.into());
        self
    }

    /// Attaches the captured output of a child process.
    #[must_use]
    pub fn with_output(mut self, output: ProcessOutput) -> Self {
        self.output = Some(Box::new(output));
        self
    }

    /// Tags the error with the resource-graph stage it came from.
    ///
    /// The first tag wins: an error that already names a stage keeps it.
    #[must_use]
    pub fn with_stage(mut self, stage: Stage) -> Self {
        if self.stage.is_none() {
            self.stage = Some(stage);
        }
        self
    }

    /// Sets the source error.
    #[must_use]
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    // Convenience constructors

    /// Creates a build error from the captured build output.
    pub fn build(message: impl Into<Cow<'static, str>>, output: ProcessOutput) -> Self {
        Self::new(ErrorKind::Build, message).with_output(output)
    }

    /// Creates a premature-exit error from the captured server output.
    pub fn process_exited(output: ProcessOutput) -> Self {
        let message = match output.exit_code {
            Some(code) => format!("server exited with code {} before becoming healthy", code),
            None => "server was terminated by a signal before becoming healthy".to_string(),
        };
        Self::new(ErrorKind::ProcessExited, message).with_output(output)
    }

    /// Creates a startup timeout error.
    pub fn startup_timeout(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::StartupTimeout, message)
    }

    /// Creates an unauthorized error.
    pub fn unauthorized(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Unauthorized, message)
    }

    /// Creates a not found error.
    pub fn not_found(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Creates a data-plane error carrying the HTTP status and body.
    pub fn data_plane(status: u16, body: impl Into<String>) -> Self {
        Self::new(ErrorKind::DataPlane, format!("data plane call returned HTTP {}", status))
            .with_response(status, body)
    }

    /// Creates a transport error.
    pub fn transport(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Transport, message)
    }

    /// Creates an invalid response error.
    pub fn invalid_response(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::InvalidResponse, message)
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(stage) = self.stage {
            write!(f, "[{} stage] ", stage)?;
        }

        write!(f, "{}: {}", self.kind, self.message)?;

        if let Some(status) = self.status {
            write!(f, " (HTTP {})", status)?;
        }

        if let Some(body) = self.body.as_deref().filter(|b| !b.is_empty()) {
            write!(f, ": {}", head(body, DISPLAY_BODY_LIMIT))?;
        }

        if let Some(output) = self.output.as_deref() {
            if let Some(code) = output.exit_code {
                write!(f, "\nexit code: {}", code)?;
            }
            if !output.stderr.is_empty() {
                write!(f, "\nstderr:\n{}", tail(&output.stderr, DISPLAY_OUTPUT_LIMIT))?;
            }
            if !output.stdout.is_empty() {
                write!(f, "\nstdout:\n{}", tail(&output.stdout, DISPLAY_OUTPUT_LIMIT))?;
            }
        }

        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

fn head(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn tail(text: &str, limit: usize) -> &str {
    let count = text.chars().count();
    if count <= limit {
        return text;
    }
    match text.char_indices().nth(count - limit) {
        Some((idx, _)) => &text[idx..],
        None => text,
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind, kind.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::new(ErrorKind::Io, err.to_string()).with_source(err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::configuration(format!("invalid URL: {}", err)).with_source(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::invalid_response(format!("JSON error: {}", err)).with_source(err)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            format!("request timed out: {}", err)
        } else if err.is_connect() {
            format!("connection failed: {}", err)
        } else {
            format!("request failed: {}", err)
        };
        Error::transport(message).with_source(err)
    }
}
