//! Error types for the harness.
//!
//! Every operation returns [`Error`], categorized by [`ErrorKind`]:
//!
//! - supervisor failures (`Build`, `ProcessExited`, `StartupTimeout`)
//! - workflow failures mapped from gateway status codes
//! - data-plane failures (`DataPlane`, carrying status and body)
//!
//! ## Key Invariant
//!
//! A missing key is not an error: `get()` returns `Ok(None)` and `delete()`
//! returns `Ok(0)`. Only non-2xx data-plane responses become `Err`.
//!
//! ```rust,ignore
//! match env.build().await {
//!     Err(err) if err.kind() == ErrorKind::StartupTimeout => { /* ... */ }
//!     Err(err) => eprintln!("setup failed at {:?}: {}", err.stage(), err),
//!     Ok(env) => { /* ... */ }
//! }
//! ```

mod core;
mod kind;

pub use self::core::Error;
pub use self::kind::ErrorKind;

/// A specialized `Result` type for harness operations.
pub type Result<T> = std::result::Result<T, Error>;
