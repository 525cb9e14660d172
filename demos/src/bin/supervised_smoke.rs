//! Builds, launches and health-checks the gateway, then stops it.
//!
//! # Running
//!
//! ```bash
//! # From the gateway's checkout
//! export REDISGATE_TEST_WORKDIR="$PWD"
//! export REDISGATE_TEST_PORT=18080
//! cargo run -p redisgate-harness-demos --bin supervised_smoke
//! ```

use redisgate_harness::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::from_env()?;
    let mut server = Supervisor::new(config)?.start().await?;
    println!("gateway ready at {} (pid {:?})", server.base_url(), server.pid());

    let client = WorkflowClient::new(server.base_url())?;
    let health = client.health().await?;
    println!("{}", health.summary());

    server.stop().await?;
    Ok(())
}
