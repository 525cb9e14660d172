//! Access-credential (API key) management.

use reqwest::Method;
use serde::Serialize;

use crate::client::WorkflowClient;
use crate::client::inner::Endpoint;
use crate::control::types::decode_list;
use crate::control::{AccessCredential, IssuedCredential, Scope, segment};
use crate::error::Error;

#[derive(Debug, Serialize)]
struct CreateApiKeyRequest<'a> {
    name: &'a str,
    organization_id: &'a str,
    scopes: &'a [Scope],
}

impl WorkflowClient {
    /// Issues an access credential for an organization.
    ///
    /// The returned [`IssuedCredential`] holds the secret; the gateway never
    /// returns it again.
    pub async fn create_access_credential(
        &self,
        org_id: &str,
        name: &str,
        scopes: &[Scope],
    ) -> Result<IssuedCredential, Error> {
        self.require_session()?;
        let request = CreateApiKeyRequest {
            name,
            organization_id: org_id,
            scopes,
        };

        let payload = self
            .inner()
            .send_json(Method::POST, &api_keys_path(org_id), Endpoint::Authenticated, &request)
            .await?;
        let issued = IssuedCredential::from_payload(payload)?;

        tracing::info!(
            org_id,
            credential_id = %issued.credential.id,
            scopes = ?issued.credential.scopes,
            "issued access credential"
        );
        Ok(issued)
    }

    /// Lists the credentials of an organization. Secrets are not included.
    pub async fn list_access_credentials(
        &self,
        org_id: &str,
    ) -> Result<Vec<AccessCredential>, Error> {
        let payload = self
            .inner()
            .send(Method::GET, &api_keys_path(org_id), Endpoint::Authenticated)
            .await?;
        decode_list(payload)
    }

    /// Revokes a credential. Later data-plane calls with its secret fail.
    pub async fn revoke_access_credential(&self, org_id: &str, key_id: &str) -> Result<(), Error> {
        let path = format!("{}/{}", api_keys_path(org_id), segment(key_id));
        self.inner()
            .send(Method::DELETE, &path, Endpoint::Authenticated)
            .await?;

        tracing::info!(org_id, credential_id = key_id, "revoked access credential");
        Ok(())
    }
}

fn api_keys_path(org_id: &str) -> String {
    format!("/api/organizations/{}/api-keys", segment(org_id))
}
