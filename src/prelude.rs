//! Prelude module for convenient imports.
//!
//! ```rust
//! use redisgate_harness::prelude::*;
//! ```
//!
//! This provides access to:
//! - The environment builder and its stages
//! - Clients for the management API and the data plane
//! - Configuration and error types

pub use crate::{
    client::{HealthReport, Session, WorkflowClient},
    config::{ApiContract, BuildStep, ClientConfig, DataPlaneConfig, ServerConfig},
    control::{DataInstance, IssuedCredential, Organization, Scope},
    dataplane::{DataPlaneClient, TokenTransport},
    environment::{Identity, Stage, TeardownReport, TestEnvironment},
    error::{Error, ErrorKind, Result},
    secret::Secret,
    supervisor::{ServerHandle, Supervisor},
};
