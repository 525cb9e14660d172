//! Data-plane tests through a provisioned environment.

use futures::future::try_join_all;
use redisgate_harness::{DataPlaneConfig, ErrorKind, TokenTransport};
use test_case::test_case;

use crate::common::environment;
use crate::fake_gateway::FakeGateway;

#[test_case("hello world"; "ascii")]
#[test_case("héllo wörld ✓ 日本語 🚀"; "unicode")]
#[test_case(""; "empty")]
#[test_case("a/b?c=d&e#f %2F"; "reserved characters")]
#[test_case("."; "single dot")]
#[test_case(".."; "double dot")]
#[tokio::test]
async fn test_set_get_round_trip(value: &str) {
    let gateway = FakeGateway::start().await;
    let env = environment(&gateway).build().await.unwrap();
    let kv = env.data_plane();

    assert_eq!(kv.set("round-trip", value).await.unwrap(), "OK");
    assert_eq!(kv.get("round-trip").await.unwrap().as_deref(), Some(value));

    assert!(env.release().await.is_clean());
}

#[tokio::test]
async fn test_large_value_round_trip() {
    let gateway = FakeGateway::start().await;
    let env = environment(&gateway).build().await.unwrap();
    let kv = env.data_plane();

    let value = "x".repeat(1024 * 1024 + 7);
    kv.set("large", &value).await.unwrap();
    let read = kv.get("large").await.unwrap().unwrap();
    assert_eq!(read.len(), value.len());
    assert_eq!(read, value);

    // Too large for a path segment, so it went through the command body
    assert!(gateway.calls().iter().any(|c| c.starts_with("POST /redis/")));

    env.release().await;
}

#[tokio::test]
async fn test_dot_segment_keys_round_trip() {
    let gateway = FakeGateway::start().await;
    let env = environment(&gateway).build().await.unwrap();
    let kv = env.data_plane();

    kv.set(".", "one dot").await.unwrap();
    kv.set("..", "two dots").await.unwrap();
    assert_eq!(kv.get(".").await.unwrap().as_deref(), Some("one dot"));
    assert_eq!(kv.get("..").await.unwrap().as_deref(), Some("two dots"));
    assert_eq!(kv.delete("..").await.unwrap(), 1);

    env.release().await;
}

#[tokio::test]
async fn test_delete_semantics() {
    let gateway = FakeGateway::start().await;
    let env = environment(&gateway).build().await.unwrap();
    let kv = env.data_plane();

    assert_eq!(kv.delete("absent").await.unwrap(), 0);
    assert_eq!(kv.get("absent").await.unwrap(), None);

    kv.set("present", "v").await.unwrap();
    assert_eq!(kv.delete("present").await.unwrap(), 1);
    assert_eq!(kv.get("present").await.unwrap(), None);
    assert_eq!(kv.delete("present").await.unwrap(), 0);

    env.release().await;
}

#[tokio::test]
async fn test_query_token_transport() {
    let gateway = FakeGateway::start().await;
    let env = environment(&gateway)
        .token_transport(TokenTransport::Query)
        .build()
        .await
        .unwrap();
    let kv = env.data_plane();
    assert_eq!(kv.token_transport(), TokenTransport::Query);

    assert_eq!(kv.ping().await.unwrap(), "PONG");
    kv.set("via-query", "1").await.unwrap();

    // The same credential works as a header too
    let header = kv.with_token_transport(TokenTransport::Header);
    assert_eq!(header.get("via-query").await.unwrap().as_deref(), Some("1"));

    env.release().await;
}

#[tokio::test]
async fn test_set_with_expiry_and_generic_command() {
    let gateway = FakeGateway::start().await;
    let env = environment(&gateway).build().await.unwrap();
    let kv = env.data_plane();

    kv.set_with_expiry("session", "abc", 60).await.unwrap();
    assert_eq!(kv.get("session").await.unwrap().as_deref(), Some("abc"));

    let err = kv.set_with_expiry("session", "abc", 0).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    // Values that cannot travel inline would lose their TTL
    let before = gateway.calls().len();
    let err = kv.set_with_expiry("session", "", 60).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    let err = kv
        .set_with_expiry("session", &"x".repeat(1024 * 1024), 60)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(gateway.calls().len(), before);
    assert_eq!(kv.get("session").await.unwrap().as_deref(), Some("abc"));

    let reply = kv.command(["SET", "cmd", "value"]).await.unwrap();
    assert_eq!(reply, serde_json::json!("OK"));
    assert_eq!(kv.get("cmd").await.unwrap().as_deref(), Some("value"));

    let err = kv.command(["HGETALL", "cmd"]).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DataPlane);
    assert_eq!(err.status(), Some(400));

    env.release().await;
}

#[tokio::test]
async fn test_concurrent_operations() {
    let gateway = FakeGateway::start().await;
    let env = environment(&gateway).build().await.unwrap();
    let kv = env.data_plane();

    let writes = (0..16).map(|i| {
        let kv = kv.clone();
        async move { kv.set(&format!("key-{}", i), &format!("value-{}", i)).await }
    });
    try_join_all(writes).await.unwrap();

    let reads = (0..16).map(|i| {
        let kv = kv.clone();
        async move { kv.get(&format!("key-{}", i)).await }
    });
    let values = try_join_all(reads).await.unwrap();
    for (i, value) in values.into_iter().enumerate() {
        assert_eq!(value, Some(format!("value-{}", i)));
    }
    assert_eq!(gateway.key_count(kv.instance_id()), 16);

    env.release().await;
}

#[tokio::test]
async fn test_small_inline_limit_routes_through_command_body() {
    let gateway = FakeGateway::start().await;
    let config = DataPlaneConfig::builder().inline_value_limit(4).build();
    let env = environment(&gateway)
        .data_plane_config(config)
        .build()
        .await
        .unwrap();
    let kv = env.data_plane();

    kv.set("k", "longer than four").await.unwrap();
    assert_eq!(kv.get("k").await.unwrap().as_deref(), Some("longer than four"));

    env.release().await;
}
