//! # RedisGate Harness
//!
//! Test-environment orchestrator for the RedisGate multi-tenant Redis HTTP
//! gateway.
//!
//! The harness builds and launches the gateway, waits for it to report
//! healthy, provisions a user, organization, data instance and access
//! credential through the management API, and hands test code a data-plane
//! client bound to that credential. Everything it acquires is released in
//! reverse order.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use redisgate_harness::prelude::*;
//!
//! #[tokio::test]
//! async fn round_trip() -> Result<(), Error> {
//!     let env = TestEnvironment::builder()
//!         .supervised(ServerConfig::from_env()?)
//!         .build()
//!         .await?;
//!
//!     env.data_plane().set("greeting", "hello").await?;
//!     assert_eq!(env.data_plane().get("greeting").await?.as_deref(), Some("hello"));
//!
//!     env.release().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Components
//!
//! - **Supervisor**: build step, launch, readiness polling, graceful stop
//! - **WorkflowClient**: registration, login and resource provisioning
//! - **DataPlaneClient**: `PING`/`SET`/`GET`/`DEL`/`FLUSHALL` over HTTP
//! - **TestEnvironment**: the ordered acquisition and release chain
//!
//! ## Features
//!
//! - `rustls` (default): Use rustls for TLS
//! - `native-tls`: Use native TLS (OpenSSL on Linux, Secure Transport on macOS)
//! - `live-gateway`: Integration tests against a gateway at `REDISGATE_TEST_URL`

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

// Core modules
pub mod client;
pub mod config;
pub mod error;
pub mod secret;

// Gateway process
pub mod supervisor;

// Management API
pub mod control;

// Redis over HTTP
pub mod dataplane;

// Fixture chain
pub mod environment;

// Prelude for convenient imports
pub mod prelude;

// User-Agent header
pub mod user_agent;

// Re-export main types at crate root for convenience
pub use client::{GatewayVersion, HealthReport, Session, WorkflowClient};
pub use error::{Error, ErrorKind, Result};
pub use secret::Secret;

// Re-export config types
pub use config::{
    ApiContract, BuildCommand, BuildStep, ClientConfig, DataPlaneConfig, EnvNames,
    EnvelopePolicy, ServerConfig,
};

// Re-export resource types
pub use control::{
    AccessCredential, DataInstance, InstanceStatus, IssuedCredential, Organization, Scope,
    UserRecord, capacity_bytes, slugify,
};

pub use dataplane::{DataPlaneClient, TokenTransport};
pub use environment::{
    Gateway, Identity, ReleaseFailure, ReleaseStack, Stage, TeardownReport, TestEnvironment,
    TestEnvironmentBuilder,
};
pub use supervisor::{ProcessOutput, ServerHandle, ServerState, Supervisor, wait_for_health};
