//! Provisioning operations of the management API.
//!
//! All operations are methods on [`WorkflowClient`](crate::WorkflowClient),
//! grouped by resource:
//!
//! - registration and login
//! - organizations
//! - data instances (`/redis-instances`)
//! - access credentials (`/api-keys`)
//!
//! ## Provisioning Order
//!
//! ```rust,ignore
//! client.register(email, username, password).await?;
//! client.login(email, password).await?;
//!
//! let org = client.create_organization("Acme", None).await?;
//! let instance = client.create_data_instance(&org.id, "cache", 256).await?;
//! let issued = client.create_access_credential(&org.id, "key", &Scope::all()).await?;
//! ```

mod api_keys;
mod auth;
mod instances;
mod organizations;
pub(crate) mod types;

pub use types::{
    AccessCredential, DataInstance, InstanceStatus, IssuedCredential, MIB, MIN_CAPACITY_BYTES,
    Organization, Scope, UserRecord, capacity_bytes, slugify,
};

/// Percent-encodes one path segment.
pub(crate) fn segment(raw: &str) -> std::borrow::Cow<'_, str> {
    urlencoding::encode(raw)
}
