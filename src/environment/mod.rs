//! The resource graph: an ordered chain of provisioned gateway resources.
//!
//! ```text
//! Process → WorkflowClient → Session → Organization → DataInstance
//!         → AccessCredential → DataPlane
//! ```
//!
//! Each stage assumes the previous ones succeeded and pushes the action that
//! releases what it acquired onto a [`ReleaseStack`]. A failing stage
//! unwinds the stack before its error is returned. A finished
//! [`TestEnvironment`] is torn down with [`release`](TestEnvironment::release).
//!
//! ## Example
//!
//! ```rust,ignore
//! use redisgate_harness::TestEnvironment;
//!
//! let env = TestEnvironment::builder()
//!     .external("http://127.0.0.1:8080")
//!     .build()
//!     .await?;
//!
//! env.data_plane().set("greeting", "hello").await?;
//! assert_eq!(env.data_plane().get("greeting").await?.as_deref(), Some("hello"));
//!
//! let report = env.release().await;
//! assert!(report.is_clean());
//! ```
//!
//! A test that may panic should use
//! [`TestEnvironmentBuilder::run`] instead, which releases the environment
//! before the panic propagates. Dropping an unreleased environment only
//! stops a supervised gateway; the gateway-side resources stay behind.
//!
//! ## Release Order
//!
//! | Stage | Release action | Failure |
//! |-------|----------------|---------|
//! | DataPlane | `FLUSHALL` | logged, swallowed |
//! | AccessCredential | revoke | recorded |
//! | DataInstance | delete | recorded |
//! | Organization | delete | recorded |
//! | Process | stop (supervised only) | recorded |
//!
//! Release failures never surface as errors; they land in the
//! [`TeardownReport`].

mod builder;
mod identity;
mod release;

pub use builder::{DEFAULT_CAPACITY_MIB, Gateway, TestEnvironmentBuilder};
pub use identity::Identity;
pub use release::{ReleaseFailure, ReleaseStack, Stage, TeardownReport};

use std::fmt;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::client::WorkflowClient;
use crate::control::{DataInstance, IssuedCredential, Organization, UserRecord};
use crate::dataplane::DataPlaneClient;
use crate::supervisor::{ProcessOutput, ServerHandle};

/// Everything the builder acquired.
pub(crate) struct Provisioned {
    pub base_url: String,
    pub server: Option<Arc<Mutex<ServerHandle>>>,
    pub client: WorkflowClient,
    pub identity: Identity,
    pub user: UserRecord,
    pub organization: Organization,
    pub instance: DataInstance,
    pub credential: IssuedCredential,
    pub data_plane: DataPlaneClient,
}

/// A fully provisioned gateway environment.
///
/// Test code normally only needs [`data_plane`](TestEnvironment::data_plane).
/// The other stages are exposed for tests of the provisioning surface.
///
/// Dropping an environment without calling
/// [`release`](TestEnvironment::release) kills a supervised gateway but
/// leaves the remote resources in place.
pub struct TestEnvironment {
    provisioned: Provisioned,
    stack: ReleaseStack,
}

impl TestEnvironment {
    /// Returns a builder.
    pub fn builder() -> TestEnvironmentBuilder {
        TestEnvironmentBuilder::new()
    }

    pub(crate) fn new(provisioned: Provisioned, stack: ReleaseStack) -> Self {
        Self { provisioned, stack }
    }

    /// Returns the gateway base URL.
    pub fn base_url(&self) -> &str {
        &self.provisioned.base_url
    }

    /// Returns the logged-in workflow client.
    pub fn client(&self) -> &WorkflowClient {
        &self.provisioned.client
    }

    /// Returns the registered identity.
    pub fn identity(&self) -> &Identity {
        &self.provisioned.identity
    }

    /// Returns the registered user.
    pub fn user(&self) -> &UserRecord {
        &self.provisioned.user
    }

    /// Returns the organization.
    pub fn organization(&self) -> &Organization {
        &self.provisioned.organization
    }

    /// Returns the data instance.
    pub fn instance(&self) -> &DataInstance {
        &self.provisioned.instance
    }

    /// Returns the issued access credential, secret included.
    pub fn credential(&self) -> &IssuedCredential {
        &self.provisioned.credential
    }

    /// Returns the data-plane client bound to the instance and credential.
    pub fn data_plane(&self) -> &DataPlaneClient {
        &self.provisioned.data_plane
    }

    /// Returns `true` if the harness launched the gateway.
    pub fn is_supervised(&self) -> bool {
        self.provisioned.server.is_some()
    }

    /// Returns the supervised gateway's process id.
    pub async fn server_pid(&self) -> Option<u32> {
        match self.provisioned.server {
            Some(ref server) => server.lock().await.pid(),
            None => None,
        }
    }

    /// Returns what the supervised gateway has logged so far.
    pub async fn server_logs(&self) -> Option<ProcessOutput> {
        match self.provisioned.server {
            Some(ref server) => Some(server.lock().await.logs()),
            None => None,
        }
    }

    /// Releases every stage in reverse acquisition order.
    pub async fn release(mut self) -> TeardownReport {
        tracing::info!(pending = self.stack.len(), "releasing test environment");
        let report = self.stack.unwind().await;
        if report.is_clean() {
            tracing::info!(released = report.released().len(), "test environment released");
        } else {
            tracing::warn!(%report, "test environment released with failures");
        }
        report
    }
}

impl Drop for TestEnvironment {
    fn drop(&mut self) {
        if !self.stack.is_empty() {
            tracing::warn!(
                org_id = %self.provisioned.organization.id,
                pending = self.stack.len(),
                "test environment dropped without release(); use TestEnvironmentBuilder::run to release on panic"
            );
        }
    }
}

impl fmt::Debug for TestEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestEnvironment")
            .field("base_url", &self.provisioned.base_url)
            .field("organization", &self.provisioned.organization.id)
            .field("instance", &self.provisioned.instance.id)
            .field("credential", &self.provisioned.credential.credential.id)
            .field("pending_releases", &self.stack.len())
            .finish_non_exhaustive()
    }
}
