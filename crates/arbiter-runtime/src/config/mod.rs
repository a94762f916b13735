//! Configuration module for the Arbiter runtime.
//!
//! Layered loading (defaults, TOML files, `ARBITER_*` environment variables,
//! programmatic overrides) via figment, plus validation of the merged result.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    ArbiterConfig, LogFormat, LogLevel, LogOutput, LogRotation, LoggingConfig, PipelineConfig,
    SpanEventConfig,
};
pub use validation::validate_config;
