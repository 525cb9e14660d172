//! Ordered release of acquired resources.

use std::fmt;
use std::future::Future;

use futures::FutureExt;
use futures::future::BoxFuture;

use crate::error::Error;

/// A stage of the resource graph, in acquisition order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    /// The gateway process (or the external gateway's readiness).
    Process,
    /// The anonymous workflow client.
    WorkflowClient,
    /// Registration and login.
    Session,
    /// The organization.
    Organization,
    /// The data instance.
    DataInstance,
    /// The access credential.
    AccessCredential,
    /// The data-plane client.
    DataPlane,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Process => "process",
            Stage::WorkflowClient => "workflow client",
            Stage::Session => "session",
            Stage::Organization => "organization",
            Stage::DataInstance => "data instance",
            Stage::AccessCredential => "access credential",
            Stage::DataPlane => "data plane",
        };
        f.write_str(s)
    }
}

type ReleaseFn = Box<dyn FnOnce() -> BoxFuture<'static, Result<(), Error>> + Send>;

struct Entry {
    stage: Stage,
    label: String,
    best_effort: bool,
    release: ReleaseFn,
}

/// A LIFO stack of release actions.
///
/// Each acquired resource pushes the action that gives it back.
/// [`unwind`](ReleaseStack::unwind) runs them newest first and never stops
/// early: a failing action is logged and recorded, and the next one runs.
///
/// ```rust
/// # #[tokio::main]
/// # async fn main() {
/// use redisgate_harness::{ReleaseStack, Stage};
///
/// let mut stack = ReleaseStack::new();
/// stack.push(Stage::Organization, "delete org", || async { Ok(()) });
/// stack.push(Stage::DataInstance, "delete instance", || async { Ok(()) });
///
/// let report = stack.unwind().await;
/// assert_eq!(report.released(), &[Stage::DataInstance, Stage::Organization]);
/// # }
/// ```
#[derive(Default)]
pub struct ReleaseStack {
    entries: Vec<Entry>,
}

impl ReleaseStack {
    /// Creates an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes a release action whose failure is recorded in the report.
    pub fn push<F, Fut>(&mut self, stage: Stage, label: impl Into<String>, release: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), Error>> + Send + 'static,
    {
        self.push_entry(stage, label.into(), false, release);
    }

    /// Pushes a release action whose failure is only logged.
    pub fn push_best_effort<F, Fut>(&mut self, stage: Stage, label: impl Into<String>, release: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), Error>> + Send + 'static,
    {
        self.push_entry(stage, label.into(), true, release);
    }

    fn push_entry<F, Fut>(&mut self, stage: Stage, label: String, best_effort: bool, release: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), Error>> + Send + 'static,
    {
        self.entries.push(Entry {
            stage,
            label,
            best_effort,
            release: Box::new(move || release().boxed()),
        });
    }

    /// Returns the number of pending actions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is left to release.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Runs every pending action, newest first.
    pub async fn unwind(&mut self) -> TeardownReport {
        let mut report = TeardownReport::default();

        while let Some(entry) = self.entries.pop() {
            match (entry.release)().await {
                Ok(()) => {
                    tracing::debug!(stage = %entry.stage, action = %entry.label, "released");
                    report.released.push(entry.stage);
                }
                Err(error) if entry.best_effort => {
                    tracing::debug!(stage = %entry.stage, action = %entry.label, %error, "best-effort release failed");
                    report.released.push(entry.stage);
                }
                Err(error) => {
                    tracing::warn!(stage = %entry.stage, action = %entry.label, %error, "release failed");
                    report.failures.push(ReleaseFailure {
                        stage: entry.stage,
                        action: entry.label,
                        error,
                    });
                }
            }
        }

        report
    }
}

impl fmt::Debug for ReleaseStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|e| (e.stage, &e.label)))
            .finish()
    }
}

/// A release action that failed.
#[derive(Debug)]
pub struct ReleaseFailure {
    /// Stage whose resource was not released.
    pub stage: Stage,
    /// Description of the action.
    pub action: String,
    /// The error it returned.
    pub error: Error,
}

/// Outcome of unwinding a [`ReleaseStack`].
#[derive(Debug, Default)]
pub struct TeardownReport {
    released: Vec<Stage>,
    failures: Vec<ReleaseFailure>,
}

impl TeardownReport {
    /// Stages released successfully, in release order.
    pub fn released(&self) -> &[Stage] {
        &self.released
    }

    /// Release actions that failed.
    pub fn failures(&self) -> &[ReleaseFailure] {
        &self.failures
    }

    /// Returns `true` if every recorded release succeeded.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for TeardownReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "released {} stage(s)", self.released.len())?;
        for failure in &self.failures {
            write!(f, "\n  {} ({}): {}", failure.stage, failure.action, failure.error)?;
        }
        Ok(())
    }
}
