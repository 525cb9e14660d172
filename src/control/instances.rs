//! Data-instance management.

use reqwest::Method;
use serde::Serialize;

use crate::client::WorkflowClient;
use crate::client::inner::{Endpoint, decode};
use crate::control::types::{capacity_bytes, decode_list, required_slug};
use crate::control::{DataInstance, segment};
use crate::error::Error;

#[derive(Debug, Serialize)]
struct CreateInstanceRequest<'a> {
    name: &'a str,
    slug: String,
    organization_id: &'a str,
    max_memory: u64,
}

impl WorkflowClient {
    /// Creates a data instance inside an organization.
    ///
    /// `capacity_mib` is converted to bytes with a 1 MiB floor, so `0`
    /// requests the minimum.
    ///
    /// # Errors
    ///
    /// - `Unauthorized` without a session (no request is sent)
    /// - `Validation` if `name` yields an empty slug (no request is sent)
    /// - `NotFound` if the organization is unknown
    pub async fn create_data_instance(
        &self,
        org_id: &str,
        name: &str,
        capacity_mib: u64,
    ) -> Result<DataInstance, Error> {
        self.require_session()?;
        let request = CreateInstanceRequest {
            name,
            slug: required_slug(name)?,
            organization_id: org_id,
            max_memory: capacity_bytes(capacity_mib),
        };
        let path = instances_path(org_id);

        let payload = self
            .inner()
            .send_json(Method::POST, &path, Endpoint::Authenticated, &request)
            .await?;
        let instance: DataInstance = decode(payload)?;

        tracing::info!(
            org_id,
            instance_id = %instance.id,
            capacity = instance.capacity,
            status = %instance.status,
            "created data instance"
        );
        Ok(instance)
    }

    /// Lists the data instances of an organization.
    pub async fn list_data_instances(&self, org_id: &str) -> Result<Vec<DataInstance>, Error> {
        let payload = self
            .inner()
            .send(Method::GET, &instances_path(org_id), Endpoint::Authenticated)
            .await?;
        decode_list(payload)
    }

    /// Fetches one data instance.
    pub async fn get_data_instance(
        &self,
        org_id: &str,
        instance_id: &str,
    ) -> Result<DataInstance, Error> {
        let path = format!("{}/{}", instances_path(org_id), segment(instance_id));
        let payload = self
            .inner()
            .send(Method::GET, &path, Endpoint::Authenticated)
            .await?;
        decode(payload)
    }

    /// Deletes a data instance.
    pub async fn delete_data_instance(&self, org_id: &str, instance_id: &str) -> Result<(), Error> {
        let path = format!("{}/{}", instances_path(org_id), segment(instance_id));
        self.inner()
            .send(Method::DELETE, &path, Endpoint::Authenticated)
            .await?;

        tracing::info!(org_id, instance_id, "deleted data instance");
        Ok(())
    }
}

fn instances_path(org_id: &str) -> String {
    format!("/api/organizations/{}/redis-instances", segment(org_id))
}
