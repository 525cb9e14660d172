//! Tests against a real gateway.
//!
//! Enabled with the `live-gateway` feature; the gateway must already be
//! running at `REDISGATE_TEST_URL`.

use redisgate_harness::{ErrorKind, TestEnvironment, TokenTransport};

use crate::common::init_tracing;

fn live_url() -> String {
    std::env::var("REDISGATE_TEST_URL").unwrap_or_else(|_| "http://127.0.0.1:8080".to_string())
}

async fn live_environment() -> TestEnvironment {
    init_tracing();
    TestEnvironment::builder()
        .external(live_url())
        .name_prefix("live")
        .build()
        .await
        .expect("live environment")
}

#[tokio::test]
async fn live_round_trip() {
    let env = live_environment().await;
    let kv = env.data_plane();

    assert_eq!(kv.ping().await.unwrap(), "PONG");
    for value in ["plain", "ünïcödé ✓", ""] {
        kv.set("live-key", value).await.unwrap();
        assert_eq!(kv.get("live-key").await.unwrap().as_deref(), Some(value));
    }
    assert_eq!(kv.delete("live-key").await.unwrap(), 1);
    assert_eq!(kv.delete("live-key").await.unwrap(), 0);

    let report = env.release().await;
    assert!(report.is_clean(), "{}", report);
}

#[tokio::test]
async fn live_query_token_and_revocation() {
    let env = live_environment().await;
    let query = env.data_plane().with_token_transport(TokenTransport::Query);
    assert_eq!(query.ping().await.unwrap(), "PONG");

    let org_id = env.organization().id.clone();
    let client = env.client().clone();
    env.release().await;

    let err = client.get_organization(&org_id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}
