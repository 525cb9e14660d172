//! Lifecycle of the externally built gateway process.
//!
//! [`Supervisor::start`] runs the configured build step, launches the
//! gateway with an injected environment and polls `GET /health` until it
//! answers 2xx. The resulting [`ServerHandle`] owns the process and its
//! per-run working directory.
//!
//! ## Failure Modes
//!
//! | Failure | Kind | Context |
//! |---------|------|---------|
//! | Build command fails | `Build` | exit code, stdout, stderr |
//! | Process exits before healthy | `ProcessExited` | exit code, server logs |
//! | No healthy answer in time | `StartupTimeout` | server logs |
//!
//! None of these are retried. On a startup timeout the process is stopped
//! before the error is returned.
//!
//! ## Example
//!
//! ```rust,ignore
//! let config = ServerConfig::builder().port(18080).build();
//! let mut server = Supervisor::new(config)?.start().await?;
//! // ... run tests against server.base_url() ...
//! server.stop().await?;
//! ```

mod output;
mod readiness;

pub use output::ProcessOutput;
pub use readiness::wait_for_health;

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::process::{Child, Command};
use tokio::time::Instant;

use crate::config::{BuildStep, ServerConfig};
use crate::error::{Error, ErrorKind};
use readiness::Probe;

const STDOUT_LOG: &str = "server.stdout.log";
const STDERR_LOG: &str = "server.stderr.log";

/// Readiness state of a supervised server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServerState {
    /// Launched, not yet healthy.
    Starting,
    /// Answered the health probe.
    Ready,
    /// Exited or timed out before becoming healthy.
    Failed,
    /// Stopped by the harness.
    Stopped,
}

impl fmt::Display for ServerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ServerState::Starting => "starting",
            ServerState::Ready => "ready",
            ServerState::Failed => "failed",
            ServerState::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

/// Builds and launches the gateway.
#[derive(Debug, Clone)]
pub struct Supervisor {
    config: ServerConfig,
}

impl Supervisor {
    /// Creates a supervisor after validating the configuration.
    pub fn new(config: ServerConfig) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Runs the build step, if any.
    ///
    /// # Errors
    ///
    /// `Build` with the captured output if the command cannot be spawned or
    /// exits unsuccessfully.
    pub async fn build(&self) -> Result<(), Error> {
        let BuildStep::Run(ref build) = self.config.build_step else {
            tracing::debug!("build step skipped");
            return Ok(());
        };

        tracing::info!(program = %build.program, args = ?build.args, "building gateway");
        let started = Instant::now();

        let mut cmd = Command::new(&build.program);
        cmd.args(&build.args)
            .stdin(Stdio::null())
            .kill_on_drop(true);
        if let Some(ref dir) = self.config.working_dir {
            cmd.current_dir(dir);
        }

        let output = cmd.output().await.map_err(|e| {
            Error::new(
                ErrorKind::Build,
                format!("failed to run build command {}: {}", build.program, e),
            )
            .with_source(e)
        })?;
        let output = ProcessOutput::from_output(output);

        if !output.success() {
            tracing::warn!(exit_code = ?output.exit_code, "gateway build failed");
            return Err(Error::build(
                format!("build command {} failed", build.program),
                output,
            ));
        }

        tracing::info!(elapsed_ms = started.elapsed().as_millis() as u64, "gateway built");
        Ok(())
    }

    /// Builds, launches and waits for the gateway to become healthy.
    pub async fn start(&self) -> Result<ServerHandle, Error> {
        self.build().await?;

        let config = &self.config;
        let work_dir = tempfile::Builder::new().prefix("redisgate-run-").tempdir()?;
        let stdout_path = work_dir.path().join(STDOUT_LOG);
        let stderr_path = work_dir.path().join(STDERR_LOG);
        let stdout = std::fs::File::create(&stdout_path)?;
        let stderr = std::fs::File::create(&stderr_path)?;

        let mut cmd = Command::new(&config.program);
        cmd.args(&config.args)
            .envs(config.server_env())
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr))
            .kill_on_drop(true);
        if let Some(ref dir) = config.working_dir {
            cmd.current_dir(dir);
        }

        let child = cmd.spawn().map_err(|e| {
            Error::new(
                ErrorKind::Io,
                format!("failed to launch {}: {}", config.program, e),
            )
            .with_source(e)
        })?;

        let mut handle = ServerHandle {
            pid: child.id(),
            child: Some(child),
            state: ServerState::Starting,
            base_url: config.base_url(),
            stop_grace: config.stop_grace,
            stdout_path,
            stderr_path,
            work_dir,
        };

        tracing::info!(
            pid = ?handle.pid,
            program = %config.program,
            base_url = %handle.base_url,
            work_dir = %handle.work_dir().display(),
            "gateway launched"
        );

        self.await_ready(&mut handle).await?;
        Ok(handle)
    }

    async fn await_ready(&self, handle: &mut ServerHandle) -> Result<(), Error> {
        let config = &self.config;
        let probe = Probe::new(config.health_url(), config.probe_timeout)?;
        let started = Instant::now();
        let deadline = started + config.startup_timeout;

        loop {
            if let Some(status) = handle.try_exit_status()? {
                handle.state = ServerState::Failed;
                let output = handle.output_with(Some(status));
                tracing::warn!(exit_code = ?output.exit_code, "gateway exited before becoming healthy");
                return Err(Error::process_exited(output));
            }

            if probe.check().await {
                // Another listener on the port can answer for a child that
                // already died on bind
                if let Some(status) = handle.try_exit_status()? {
                    handle.state = ServerState::Failed;
                    let output = handle.output_with(Some(status));
                    tracing::warn!(
                        url = probe.url(),
                        exit_code = ?output.exit_code,
                        "health answered but gateway process has exited"
                    );
                    return Err(Error::process_exited(output));
                }
                handle.state = ServerState::Ready;
                tracing::info!(
                    url = probe.url(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "gateway ready"
                );
                return Ok(());
            }

            let now = Instant::now();
            if now >= deadline {
                tracing::warn!(timeout = ?config.startup_timeout, "gateway startup timed out");
                let status = termination_status(handle.terminate().await);
                handle.state = ServerState::Failed;
                let output = handle.output_with(status);
                return Err(Error::startup_timeout(format!(
                    "{} did not become healthy within {:?}",
                    probe.url(),
                    config.startup_timeout
                ))
                .with_output(output));
            }

            tokio::time::sleep(config.probe_interval.min(deadline - now)).await;
        }
    }
}

/// A running gateway process.
///
/// Dropping the handle kills the process and removes its working
/// directory. Call [`stop`](ServerHandle::stop) for a graceful shutdown.
pub struct ServerHandle {
    child: Option<Child>,
    pid: Option<u32>,
    state: ServerState,
    base_url: String,
    stop_grace: Duration,
    stdout_path: PathBuf,
    stderr_path: PathBuf,
    work_dir: tempfile::TempDir,
}

impl ServerHandle {
    /// Returns the readiness state.
    pub fn state(&self) -> ServerState {
        self.state
    }

    /// Returns the URL the gateway serves on.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the OS process id.
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Returns the per-run working directory holding the server logs.
    pub fn work_dir(&self) -> &Path {
        self.work_dir.path()
    }

    /// Returns what the server has logged so far.
    pub fn logs(&self) -> ProcessOutput {
        self.output_with(None)
    }

    /// Stops the server: `SIGTERM`, then `SIGKILL` after the grace period.
    ///
    /// Stopping an already stopped handle is a no-op.
    pub async fn stop(&mut self) -> Result<(), Error> {
        if self.state == ServerState::Stopped || self.child.is_none() {
            tracing::debug!("gateway already stopped");
            self.state = ServerState::Stopped;
            return Ok(());
        }

        let status = self.terminate().await?;
        self.state = ServerState::Stopped;
        tracing::info!(pid = ?self.pid, exit_code = ?status.and_then(|s| s.code()), "gateway stopped");
        Ok(())
    }

    fn try_exit_status(&mut self) -> Result<Option<ExitStatus>, Error> {
        match self.child.as_mut() {
            Some(child) => Ok(child.try_wait()?),
            None => Ok(None),
        }
    }

    fn output_with(&self, status: Option<ExitStatus>) -> ProcessOutput {
        ProcessOutput::from_logs(status, &self.stdout_path, &self.stderr_path)
    }

    /// Terminates and reaps the child, releasing it from the handle.
    async fn terminate(&mut self) -> Result<Option<ExitStatus>, Error> {
        let Some(mut child) = self.child.take() else {
            return Ok(None);
        };

        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }

        #[cfg(unix)]
        {
            if let Some(pid) = child.id() {
                use nix::sys::signal::{Signal, kill};
                use nix::unistd::Pid;

                match kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
                    Ok(()) => match tokio::time::timeout(self.stop_grace, child.wait()).await {
                        Ok(status) => return Ok(Some(status?)),
                        Err(_) => {
                            tracing::warn!(pid, grace = ?self.stop_grace, "gateway ignored SIGTERM; killing");
                        }
                    },
                    Err(e) => tracing::warn!(pid, error = %e, "failed to send SIGTERM"),
                }
            }
        }

        child.kill().await?;
        Ok(child.try_wait()?)
    }
}

/// A failed terminate is logged rather than returned, so it cannot mask the
/// error that triggered it.
fn termination_status(result: Result<Option<ExitStatus>, Error>) -> Option<ExitStatus> {
    match result {
        Ok(status) => status,
        Err(error) => {
            tracing::warn!(error = %error, "failed to terminate timed-out gateway");
            None
        }
    }
}

impl fmt::Debug for ServerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerHandle")
            .field("pid", &self.pid)
            .field("state", &self.state)
            .field("base_url", &self.base_url)
            .field("work_dir", &self.work_dir.path())
            .finish_non_exhaustive()
    }
}
