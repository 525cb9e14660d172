//! Organization management.

use reqwest::Method;
use serde::Serialize;

use crate::client::WorkflowClient;
use crate::client::inner::{Endpoint, decode};
use crate::control::types::{decode_list, required_slug};
use crate::control::{Organization, segment};
use crate::error::Error;

/// Request body for creating or updating an organization.
///
/// The gateway reuses the create shape for `PUT`.
#[derive(Debug, Clone, Serialize)]
struct OrganizationRequest<'a> {
    name: &'a str,
    slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

impl<'a> OrganizationRequest<'a> {
    fn new(name: &'a str, description: Option<&'a str>) -> Result<Self, Error> {
        Ok(Self {
            name,
            slug: required_slug(name)?,
            description,
        })
    }
}

impl WorkflowClient {
    /// Creates an organization owned by the logged-in user.
    ///
    /// The slug is derived from `name`.
    ///
    /// # Errors
    ///
    /// - `Unauthorized` without a session (no request is sent)
    /// - `Validation` if `name` yields an empty slug (no request is sent)
    /// - `Conflict` if the slug is taken
    pub async fn create_organization(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<Organization, Error> {
        self.require_session()?;
        let request = OrganizationRequest::new(name, description)?;

        let payload = self
            .inner()
            .send_json(Method::POST, "/api/organizations", Endpoint::Authenticated, &request)
            .await?;
        let org: Organization = decode(payload)?;

        tracing::info!(org_id = %org.id, slug = %org.slug, "created organization");
        Ok(org)
    }

    /// Lists the organizations the logged-in user belongs to.
    pub async fn list_organizations(&self) -> Result<Vec<Organization>, Error> {
        let payload = self
            .inner()
            .send(Method::GET, "/api/organizations", Endpoint::Authenticated)
            .await?;
        decode_list(payload)
    }

    /// Fetches one organization.
    ///
    /// # Errors
    ///
    /// `NotFound` if the organization does not exist or is not visible.
    pub async fn get_organization(&self, org_id: &str) -> Result<Organization, Error> {
        let path = format!("/api/organizations/{}", segment(org_id));
        let payload = self
            .inner()
            .send(Method::GET, &path, Endpoint::Authenticated)
            .await?;
        decode(payload)
    }

    /// Renames an organization and replaces its description.
    pub async fn update_organization(
        &self,
        org_id: &str,
        name: &str,
        description: Option<&str>,
    ) -> Result<Organization, Error> {
        self.require_session()?;
        let request = OrganizationRequest::new(name, description)?;
        let path = format!("/api/organizations/{}", segment(org_id));

        let payload = self
            .inner()
            .send_json(Method::PUT, &path, Endpoint::Authenticated, &request)
            .await?;
        decode(payload)
    }

    /// Deletes an organization.
    ///
    /// The gateway refuses (`Conflict` or `Validation`) while the organization
    /// still has active data instances.
    pub async fn delete_organization(&self, org_id: &str) -> Result<(), Error> {
        let path = format!("/api/organizations/{}", segment(org_id));
        self.inner()
            .send(Method::DELETE, &path, Endpoint::Authenticated)
            .await?;

        tracing::info!(org_id, "deleted organization");
        Ok(())
    }

    /// Fails with `Unauthorized` when no session is attached.
    pub(crate) fn require_session(&self) -> Result<(), Error> {
        if self.is_authenticated() {
            Ok(())
        } else {
            Err(Error::unauthorized(
                "no authenticated session; call login() first",
            ))
        }
    }
}
