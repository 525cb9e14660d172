//! Management API tests against the fake gateway.

use redisgate_harness::{
    ApiContract, ClientConfig, DataPlaneClient, ErrorKind, Identity, InstanceStatus, Scope,
    WorkflowClient,
};

use crate::common::{init_tracing, logged_in_client, relogin};
use crate::fake_gateway::FakeGateway;

#[tokio::test]
async fn test_register_and_login_yield_distinct_tokens() {
    let gateway = FakeGateway::start().await;

    let (alice, _) = logged_in_client(&gateway).await;
    let (bob, _) = logged_in_client(&gateway).await;

    let alice_token = alice.session().expect("alice session").token().expose().to_string();
    let bob_token = bob.session().expect("bob session").token().expose().to_string();
    assert!(!alice_token.is_empty());
    assert!(!bob_token.is_empty());
    assert_ne!(alice_token, bob_token);
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    init_tracing();
    let gateway = FakeGateway::start().await;
    let client = WorkflowClient::new(gateway.uri()).unwrap();
    let identity = Identity::generate("dup");

    client
        .register(&identity.email, &identity.username, identity.password.expose())
        .await
        .unwrap();
    let err = client
        .register(&identity.email, &identity.username, identity.password.expose())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::RegistrationConflict);
    assert_eq!(err.status(), Some(409));
}

#[tokio::test]
async fn test_short_password_is_a_validation_error() {
    let gateway = FakeGateway::start().await;
    let client = WorkflowClient::new(gateway.uri()).unwrap();

    let err = client
        .register("short@example.com", "short", "pw")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(err.to_string().contains("at least 8"));
}

#[tokio::test]
async fn test_wrong_password_is_authentication_error() {
    let gateway = FakeGateway::start().await;
    let (_, identity) = logged_in_client(&gateway).await;

    let client = WorkflowClient::new(gateway.uri()).unwrap();
    let err = client
        .login(&identity.email, "not-the-password")
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Authentication);
    assert!(!client.is_authenticated());
}

#[tokio::test]
async fn test_unauthenticated_calls_never_reach_the_gateway() {
    let gateway = FakeGateway::start().await;
    let client = WorkflowClient::new(gateway.uri()).unwrap();

    let err = client.create_organization("Acme", None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
    assert!(gateway.calls().iter().all(|c| !c.contains("/api/")));
}

#[tokio::test]
async fn test_organization_crud() {
    let gateway = FakeGateway::start().await;
    let (client, identity) = logged_in_client(&gateway).await;
    let name = format!("{} Org", identity.username);

    let org = client
        .create_organization(&name, Some("integration"))
        .await
        .unwrap();
    assert_eq!(org.name, name);
    assert_eq!(org.slug, redisgate_harness::slugify(&name));
    assert!(org.slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));

    let fetched = client.get_organization(&org.id).await.unwrap();
    assert_eq!(fetched.id, org.id);

    let listed = client.list_organizations().await.unwrap();
    assert!(listed.iter().any(|o| o.id == org.id));

    let renamed = client
        .update_organization(&org.id, "Renamed", None)
        .await
        .unwrap();
    assert_eq!(renamed.name, "Renamed");

    client.delete_organization(&org.id).await.unwrap();
    let err = client.get_organization(&org.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn test_duplicate_slug_conflicts() {
    let gateway = FakeGateway::start().await;
    let (client, identity) = logged_in_client(&gateway).await;
    let name = format!("{}-shared", identity.username);

    client.create_organization(&name, None).await.unwrap();
    let err = client.create_organization(&name, None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn test_instance_capacity_and_listing() {
    let gateway = FakeGateway::start().await;
    let (client, identity) = logged_in_client(&gateway).await;
    let org = client
        .create_organization(&format!("{}-org", identity.username), None)
        .await
        .unwrap();

    let tiny = client.create_data_instance(&org.id, "tiny", 0).await.unwrap();
    assert_eq!(tiny.capacity, 1_048_576);
    assert_eq!(tiny.status, InstanceStatus::Pending);

    let sized = client.create_data_instance(&org.id, "sized", 256).await.unwrap();
    assert_eq!(sized.capacity, 268_435_456);

    let fetched = client.get_data_instance(&org.id, &sized.id).await.unwrap();
    assert_eq!(fetched.status, InstanceStatus::Active);

    let listed = client.list_data_instances(&org.id).await.unwrap();
    assert_eq!(listed.len(), 2);

    // Organizations with live instances cannot be deleted
    let err = client.delete_organization(&org.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    client.delete_data_instance(&org.id, &tiny.id).await.unwrap();
    client.delete_data_instance(&org.id, &sized.id).await.unwrap();
    client.delete_organization(&org.id).await.unwrap();
}

#[tokio::test]
async fn test_credential_lifecycle() {
    let gateway = FakeGateway::start().await;
    let (client, identity) = logged_in_client(&gateway).await;
    let org = client
        .create_organization(&format!("{}-org", identity.username), None)
        .await
        .unwrap();
    let instance = client.create_data_instance(&org.id, "cache", 64).await.unwrap();

    let issued = client
        .create_access_credential(&org.id, "reader", &[Scope::Read])
        .await
        .unwrap();
    assert!(!issued.secret.is_empty());
    assert_eq!(issued.credential.scopes, vec![Scope::Read]);
    assert!(issued.credential.is_active);

    let listed = client.list_access_credentials(&org.id).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, issued.credential.id);

    let kv = DataPlaneClient::new(gateway.uri(), &instance.id, issued.secret.clone()).unwrap();
    assert_eq!(kv.ping().await.unwrap(), "PONG");

    client
        .revoke_access_credential(&org.id, &issued.credential.id)
        .await
        .unwrap();

    let err = kv.ping().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DataPlane);
    assert_eq!(err.status(), Some(401));
    assert!(err.body().unwrap_or_default().contains("API key"));
}

#[tokio::test]
async fn test_other_users_organizations_are_hidden() {
    let gateway = FakeGateway::start().await;
    let (owner, identity) = logged_in_client(&gateway).await;
    let (stranger, _) = logged_in_client(&gateway).await;

    let org = owner
        .create_organization(&format!("{}-private", identity.username), None)
        .await
        .unwrap();

    let err = stranger.get_organization(&org.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    // A second login of the owner still sees it
    let again = relogin(&gateway, &identity).await;
    assert_eq!(again.get_organization(&org.id).await.unwrap().id, org.id);
}

#[tokio::test]
async fn test_raw_bodies_tolerated_by_default() {
    let gateway = FakeGateway::start().await;
    let (client, identity) = logged_in_client(&gateway).await;
    gateway.raw_bodies(true);

    let org = client
        .create_organization(&format!("{}-raw", identity.username), None)
        .await
        .unwrap();
    let instance = client.create_data_instance(&org.id, "raw", 1).await.unwrap();
    let issued = client
        .create_access_credential(&org.id, "raw", &Scope::all())
        .await
        .unwrap();

    assert_eq!(instance.organization_id, org.id);
    assert!(!issued.secret.is_empty());
}

#[tokio::test]
async fn test_strict_contract_rejects_raw_bodies() {
    let gateway = FakeGateway::start().await;
    let (_, identity) = logged_in_client(&gateway).await;

    let config = ClientConfig::builder().contract(ApiContract::strict()).build();
    let strict = WorkflowClient::with_config(gateway.uri(), config).unwrap();
    strict
        .login(&identity.email, identity.password.expose())
        .await
        .unwrap();

    gateway.raw_bodies(true);
    let err = strict
        .create_organization(&format!("{}-strict", identity.username), None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidResponse);

    // Health stays readable regardless of the contract
    assert!(strict.health().await.unwrap().is_healthy());
}

#[tokio::test]
async fn test_health_and_version() {
    let gateway = FakeGateway::start().await;
    let client = WorkflowClient::new(gateway.uri()).unwrap();

    let health = client.health().await.unwrap();
    assert!(health.is_healthy());
    assert_eq!(health.database.as_deref(), Some("healthy"));

    let version = client.version().await.unwrap();
    assert_eq!(version.name, "redisgate");
}
