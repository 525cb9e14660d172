//! Configuration types for the harness.
//!
//! Configuration is always an explicit value handed to a constructor:
//! - [`ServerConfig`]: How the gateway is built, launched and probed
//! - [`ClientConfig`]: Timeouts and response contract for the workflow client
//! - [`DataPlaneConfig`]: Timeouts and token transport for data-plane calls
//! - [`ApiContract`]: Which response shapes are accepted

mod client;
mod contract;
mod server;

pub use client::{ClientConfig, DEFAULT_INLINE_VALUE_LIMIT, DataPlaneConfig};
pub use contract::{ApiContract, EnvelopePolicy};
pub use server::{
    BuildCommand, BuildStep, DEFAULT_DATABASE_URL, DEFAULT_HOST, DEFAULT_PORT,
    DEFAULT_SIGNING_SECRET, EnvNames, ServerConfig,
};
