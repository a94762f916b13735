//! Arbiter Runtime - the process-facing layer of the Arbiter command router.
//!
//! This crate provides:
//! - The message loop (`ArbiterRuntime`) that feeds inbound messages through
//!   the pipeline and into a reply sink, one task per message
//! - Periodic sweeping of expired duplicate-suppression entries
//! - Layered configuration (`arbiter.toml`, `ARBITER_*` environment variables)
//! - Logging configuration
//!
//! ```ignore
//! use arbiter_runtime::ArbiterRuntime;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = ArbiterRuntime::builder()
//!         .router(router)
//!         .sink(sink)
//!         .build()?;
//!
//!     let (tx, rx) = tokio::sync::mpsc::channel(64);
//!     spawn_transport(tx);
//!     runtime.run(rx).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;

// Re-exports
pub use config::{
    ArbiterConfig, ConfigError, ConfigLoader, ConfigResult, LoggingConfig, PipelineConfig,
};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};
pub use runtime::{ArbiterRuntime, RuntimeBuilder};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Prelude module for convenient imports.
///
/// This provides all the commonly used logging macros:
/// - `trace!`, `debug!`, `info!`, `warn!`, `error!`
/// - `span`, `event`
/// - `instrument` attribute
/// - `Level` for span creation
pub mod prelude {
    pub use tracing::{Level, debug, error, event, info, instrument, span, trace, warn};
}
