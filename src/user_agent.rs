//! User-Agent header sent by the harness.
//!
//! Gateway access logs can then tell harness traffic apart from real clients,
//! and the per-process run id groups the requests of one test binary.

use std::sync::LazyLock;

static USER_AGENT: LazyLock<String> = LazyLock::new(|| {
    let platform = match std::env::consts::OS {
        "macos" => "darwin",
        other => other,
    };
    let run = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "{}/{} ({}/{}; run {})",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        platform,
        std::env::consts::ARCH,
        &run[..8],
    )
});

/// `redisgate-harness/<version> (<os>/<arch>; run <id>)`, fixed for the
/// lifetime of the process.
pub fn user_agent() -> &'static str {
    USER_AGENT.as_str()
}
