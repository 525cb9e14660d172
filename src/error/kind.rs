//! Error kind enumeration for categorizing harness errors.

/// Categorization of harness errors.
///
/// The kinds are grouped by the component that raises them:
///
/// | Component         | Kinds                                                        |
/// |-------------------|--------------------------------------------------------------|
/// | Process supervisor| `Build`, `ProcessExited`, `StartupTimeout`                   |
/// | Workflow client   | `Authentication`, `RegistrationConflict`, `Validation`,      |
/// |                   | `Unauthorized`, `Forbidden`, `NotFound`, `Conflict`,         |
/// |                   | `Server`, `UnexpectedStatus`                                 |
/// | Data plane        | `DataPlane`                                                  |
/// | Any               | `Transport`, `InvalidResponse`, `Configuration`, `Io`        |
///
/// Nothing in the harness retries on its own. [`ErrorKind::is_transient`] is a
/// hint for callers that implement their own run policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The server build command exited unsuccessfully.
    ///
    /// The error carries the captured build output.
    #[error("build failed")]
    Build,

    /// The server process exited before it reported healthy.
    ///
    /// The error carries the exit code and captured stdout/stderr.
    #[error("server process exited")]
    ProcessExited,

    /// The server did not report healthy within the startup window.
    #[error("startup timeout")]
    StartupTimeout,

    /// Login was rejected (bad email or password).
    ///
    /// HTTP: 401 / 403 on `POST /auth/login`
    #[error("authentication failed")]
    Authentication,

    /// Registration was rejected because the identity already exists.
    ///
    /// HTTP: 409 on `POST /auth/register`
    #[error("registration conflict")]
    RegistrationConflict,

    /// The request payload was rejected as malformed.
    ///
    /// HTTP: 400 / 422
    #[error("validation error")]
    Validation,

    /// The call requires a session and none was attached, or the server
    /// rejected the attached token.
    ///
    /// HTTP: 401
    #[error("unauthorized")]
    Unauthorized,

    /// The session is valid but lacks rights on the resource.
    ///
    /// HTTP: 403
    #[error("forbidden")]
    Forbidden,

    /// The referenced resource does not exist.
    ///
    /// HTTP: 404
    #[error("not found")]
    NotFound,

    /// The resource conflicts with existing state (e.g. duplicate slug).
    ///
    /// HTTP: 409 (outside registration)
    #[error("conflict")]
    Conflict,

    /// The gateway failed internally.
    ///
    /// HTTP: 5xx
    #[error("server error")]
    Server,

    /// The gateway answered with a status the client has no mapping for.
    #[error("unexpected status")]
    UnexpectedStatus,

    /// A data-plane call returned a non-2xx status.
    ///
    /// The error carries the status and body.
    #[error("data plane error")]
    DataPlane,

    /// The HTTP request could not be completed (connect, timeout, TLS).
    #[error("transport error")]
    Transport,

    /// The response body could not be interpreted.
    #[error("invalid response")]
    InvalidResponse,

    /// The harness was configured with unusable values.
    #[error("configuration error")]
    Configuration,

    /// A local I/O operation failed (spawn, temp dir, log files).
    #[error("i/o error")]
    Io,
}

impl ErrorKind {
    /// Returns `true` for failures that may succeed when the whole run is
    /// repeated.
    ///
    /// This is only a hint: the supervisor, workflow client and data-plane
    /// client never retry.
    ///
    /// ```rust
    /// use redisgate_harness::ErrorKind;
    ///
    /// assert!(ErrorKind::StartupTimeout.is_transient());
    /// assert!(!ErrorKind::RegistrationConflict.is_transient());
    /// ```
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ErrorKind::StartupTimeout | ErrorKind::Transport | ErrorKind::Server
        )
    }

    /// Returns `true` for kinds raised by the process supervisor.
    pub fn is_supervisor(&self) -> bool {
        matches!(
            self,
            ErrorKind::Build | ErrorKind::ProcessExited | ErrorKind::StartupTimeout
        )
    }
}
