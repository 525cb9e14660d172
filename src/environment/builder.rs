//! Builder that provisions a [`TestEnvironment`].

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use futures::future::LocalBoxFuture;
use tokio::sync::Mutex;

use super::release::{ReleaseStack, Stage};
use super::{Identity, Provisioned, TestEnvironment};
use crate::client::WorkflowClient;
use crate::config::{ClientConfig, DataPlaneConfig, ServerConfig};
use crate::control::Scope;
use crate::dataplane::{DataPlaneClient, TokenTransport};
use crate::error::Error;
use crate::supervisor::{Supervisor, wait_for_health};

/// Capacity of the provisioned data instance, in MiB.
pub const DEFAULT_CAPACITY_MIB: u64 = 256;

const DEFAULT_EXTERNAL_READY_TIMEOUT: Duration = Duration::from_secs(30);
const EXTERNAL_PROBE_TIMEOUT: Duration = Duration::from_secs(1);
const EXTERNAL_PROBE_INTERVAL: Duration = Duration::from_millis(500);

/// Where the gateway under test comes from.
#[derive(Debug, Clone)]
pub enum Gateway {
    /// Build and launch the gateway as a child process.
    Supervised(ServerConfig),
    /// Use a gateway that is already running.
    External {
        /// Base URL of the gateway.
        base_url: String,
        /// How long to wait for `GET /health` to answer 2xx.
        ready_timeout: Duration,
    },
}

impl Default for Gateway {
    fn default() -> Self {
        Gateway::Supervised(ServerConfig::default())
    }
}

/// Builder for [`TestEnvironment`].
///
/// ## Defaults
///
/// - Gateway: supervised with [`ServerConfig::default`]
/// - Identity: freshly generated with the `test` prefix
/// - Data instance capacity: 256 MiB
/// - Credential scopes: read, write and admin
///
/// ## Example
///
/// ```rust,ignore
/// let env = TestEnvironment::builder()
///     .external("http://127.0.0.1:8080")
///     .capacity_mib(64)
///     .scopes([Scope::Read, Scope::Write])
///     .build()
///     .await?;
/// ```
#[derive(Debug, Clone)]
#[must_use = "builders do nothing until .build().await is called"]
pub struct TestEnvironmentBuilder {
    gateway: Gateway,
    client_config: ClientConfig,
    data_plane_config: DataPlaneConfig,
    identity: Option<Identity>,
    name_prefix: String,
    capacity_mib: u64,
    scopes: Vec<Scope>,
}

impl Default for TestEnvironmentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestEnvironmentBuilder {
    /// Creates a builder with the defaults above.
    pub fn new() -> Self {
        Self {
            gateway: Gateway::default(),
            client_config: ClientConfig::default(),
            data_plane_config: DataPlaneConfig::default(),
            identity: None,
            name_prefix: "test".to_string(),
            capacity_mib: DEFAULT_CAPACITY_MIB,
            scopes: Scope::all(),
        }
    }

    /// Launches the gateway with the given configuration.
    pub fn supervised(mut self, config: ServerConfig) -> Self {
        self.gateway = Gateway::Supervised(config);
        self
    }

    /// Uses an already running gateway.
    pub fn external(mut self, base_url: impl Into<String>) -> Self {
        self.gateway = Gateway::External {
            base_url: base_url.into(),
            ready_timeout: DEFAULT_EXTERNAL_READY_TIMEOUT,
        };
        self
    }

    /// Sets the gateway source.
    pub fn gateway(mut self, gateway: Gateway) -> Self {
        self.gateway = gateway;
        self
    }

    /// Sets the workflow client configuration.
    pub fn client_config(mut self, config: ClientConfig) -> Self {
        self.client_config = config;
        self
    }

    /// Sets the data-plane client configuration.
    pub fn data_plane_config(mut self, config: DataPlaneConfig) -> Self {
        self.data_plane_config = config;
        self
    }

    /// Sets how the data-plane client sends the credential secret.
    pub fn token_transport(mut self, transport: TokenTransport) -> Self {
        self.data_plane_config.token_transport = transport;
        self
    }

    /// Registers this identity instead of a generated one.
    pub fn identity(mut self, identity: Identity) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Sets the prefix of generated identities and resource names.
    pub fn name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.name_prefix = prefix.into();
        self
    }

    /// Sets the data instance capacity in MiB.
    pub fn capacity_mib(mut self, capacity_mib: u64) -> Self {
        self.capacity_mib = capacity_mib;
        self
    }

    /// Sets the scopes of the issued credential.
    pub fn scopes(mut self, scopes: impl IntoIterator<Item = Scope>) -> Self {
        self.scopes = scopes.into_iter().collect();
        self
    }

    /// Acquires every stage in order.
    ///
    /// If a stage fails, everything acquired so far is released in reverse
    /// order and the error is returned tagged with the failing [`Stage`].
    pub async fn build(self) -> Result<TestEnvironment, Error> {
        let mut stack = ReleaseStack::new();

        match self.acquire(&mut stack).await {
            Ok(provisioned) => Ok(TestEnvironment::new(provisioned, stack)),
            Err(error) => {
                tracing::warn!(stage = ?error.stage(), %error, "environment setup failed; unwinding");
                let report = stack.unwind().await;
                if !report.is_clean() {
                    tracing::warn!(%report, "unwind after failed setup left resources behind");
                }
                Err(error)
            }
        }
    }

    /// Builds the environment, runs `body` against it and releases it
    /// afterwards, even if `body` panics.
    ///
    /// A panic in `body` is resumed once the release has finished, so a
    /// failing assertion still fails the test. Release failures are logged
    /// and do not affect the returned value.
    ///
    /// ```rust,ignore
    /// use futures::FutureExt;
    ///
    /// TestEnvironment::builder()
    ///     .external("http://127.0.0.1:8080")
    ///     .run(|env| {
    ///         async move {
    ///             env.data_plane().set("greeting", "hello").await.unwrap();
    ///             assert_eq!(env.data_plane().get("greeting").await.unwrap().as_deref(), Some("hello"));
    ///         }
    ///         .boxed_local()
    ///     })
    ///     .await?;
    /// ```
    pub async fn run<F, T>(self, body: F) -> Result<T, Error>
    where
        F: for<'e> FnOnce(&'e TestEnvironment) -> LocalBoxFuture<'e, T>,
    {
        let env = self.build().await?;
        let outcome = AssertUnwindSafe(body(&env)).catch_unwind().await;
        let report = env.release().await;

        match outcome {
            Ok(value) => Ok(value),
            Err(panic) => {
                tracing::warn!(clean = report.is_clean(), "environment body panicked; released before resuming");
                std::panic::resume_unwind(panic)
            }
        }
    }

    async fn acquire(self, stack: &mut ReleaseStack) -> Result<Provisioned, Error> {
        // Process
        let (base_url, server) = match self.gateway {
            Gateway::Supervised(config) => {
                let handle = Supervisor::new(config)
                    .map_err(|e| e.with_stage(Stage::Process))?
                    .start()
                    .await
                    .map_err(|e| e.with_stage(Stage::Process))?;
                let base_url = handle.base_url().to_string();
                let server = Arc::new(Mutex::new(handle));

                let owned = Arc::clone(&server);
                stack.push(Stage::Process, "stop gateway", move || async move {
                    owned.lock().await.stop().await
                });
                (base_url, Some(server))
            }
            Gateway::External {
                base_url,
                ready_timeout,
            } => {
                let health = format!("{}/health", base_url.trim_end_matches('/'));
                wait_for_health(
                    &health,
                    EXTERNAL_PROBE_TIMEOUT,
                    EXTERNAL_PROBE_INTERVAL,
                    ready_timeout,
                )
                .await
                .map_err(|e| e.with_stage(Stage::Process))?;
                (base_url, None)
            }
        };

        let client = WorkflowClient::with_config(&base_url, self.client_config)
            .map_err(|e| e.with_stage(Stage::WorkflowClient))?;

        // Session
        let identity = self
            .identity
            .unwrap_or_else(|| Identity::generate(&self.name_prefix));
        let user = client
            .register(
                &identity.email,
                &identity.username,
                identity.password.expose(),
            )
            .await
            .map_err(|e| e.with_stage(Stage::Session))?;
        client
            .login(&identity.email, identity.password.expose())
            .await
            .map_err(|e| e.with_stage(Stage::Session))?;

        // Organization
        let organization = client
            .create_organization(
                &identity.resource_name("org"),
                Some("provisioned by redisgate-harness"),
            )
            .await
            .map_err(|e| e.with_stage(Stage::Organization))?;
        {
            let client = client.clone();
            let org_id = organization.id.clone();
            stack.push(Stage::Organization, "delete organization", move || async move {
                client.delete_organization(&org_id).await
            });
        }

        // Data instance
        let instance = client
            .create_data_instance(
                &organization.id,
                &identity.resource_name("cache"),
                self.capacity_mib,
            )
            .await
            .map_err(|e| e.with_stage(Stage::DataInstance))?;
        {
            let client = client.clone();
            let org_id = organization.id.clone();
            let instance_id = instance.id.clone();
            stack.push(Stage::DataInstance, "delete data instance", move || async move {
                client.delete_data_instance(&org_id, &instance_id).await
            });
        }

        // Access credential
        let credential = client
            .create_access_credential(
                &organization.id,
                &identity.resource_name("key"),
                &self.scopes,
            )
            .await
            .map_err(|e| e.with_stage(Stage::AccessCredential))?;
        {
            let client = client.clone();
            let org_id = organization.id.clone();
            let key_id = credential.credential.id.clone();
            stack.push(Stage::AccessCredential, "revoke access credential", move || async move {
                client.revoke_access_credential(&org_id, &key_id).await
            });
        }

        // Data plane
        let data_plane = DataPlaneClient::with_config(
            &base_url,
            instance.id.clone(),
            credential.secret.clone(),
            self.data_plane_config,
        )
        .map_err(|e| e.with_stage(Stage::DataPlane))?;
        {
            let data_plane = data_plane.clone();
            stack.push_best_effort(Stage::DataPlane, "flush data", move || async move {
                data_plane.flush_all().await.map(drop)
            });
        }

        tracing::info!(
            base_url = %base_url,
            org_id = %organization.id,
            instance_id = %instance.id,
            credential_id = %credential.credential.id,
            "test environment ready"
        );

        Ok(Provisioned {
            base_url,
            server,
            client,
            identity,
            user,
            organization,
            instance,
            credential,
            data_plane,
        })
    }
}
