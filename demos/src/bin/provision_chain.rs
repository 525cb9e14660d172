//! Provisions a full environment against a running gateway.
//!
//! # Running
//!
//! ```bash
//! export REDISGATE_URL="http://127.0.0.1:8080"
//! cargo run -p redisgate-harness-demos --bin provision_chain
//! ```

use std::env;

use futures::FutureExt;
use redisgate_harness::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let url = env::var("REDISGATE_URL").unwrap_or_else(|_| "http://127.0.0.1:8080".to_string());

    // The environment is released even if a step below fails
    TestEnvironment::builder()
        .external(&url)
        .name_prefix("demo")
        .capacity_mib(64)
        .run(|env| async move { exercise(env).await }.boxed_local())
        .await?
}

async fn exercise(env: &TestEnvironment) -> Result<()> {
    println!("user:         {}", env.user().email);
    println!("organization: {} ({})", env.organization().name, env.organization().id);
    println!("instance:     {} ({} bytes)", env.instance().id, env.instance().capacity);
    println!("credential:   {}", env.credential().credential.id);

    let kv = env.data_plane();
    println!("PING -> {}", kv.ping().await?);
    kv.set("demo:greeting", "hello from the harness").await?;
    println!("GET  -> {:?}", kv.get("demo:greeting").await?);
    println!("DEL  -> {}", kv.delete("demo:greeting").await?);
    Ok(())
}
