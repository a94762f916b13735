//! # Arbiter Core
//!
//! Core types and collaborator contracts for the Arbiter chat command router.
//!
//! This crate has no opinion about how commands are found or answered. It
//! defines the vocabulary the rest of the workspace shares:
//!
//! - **Messages**: [`InboundMessage`], [`Destination`], [`Candidate`]
//! - **Resolvers**: the [`Resolver`] trait and its [`Resolution`]
//! - **Sinks**: the [`ReplySink`] trait transports implement
//! - **Reporting**: [`ErrorReporter`] for recovered failures
//! - **Errors**: [`ResolveError`], [`SinkError`], [`UnitFault`]
//!
//! ```text
//! ┌───────────┐     ┌───────────┐     ┌────────────┐     ┌──────────┐
//! │ Transport │────▶│ Tokenizer │────▶│ Dispatcher │────▶│ Resolver │
//! └───────────┘     └───────────┘     └────────────┘────▶│ Resolver │
//!       ▲                                   │            └──────────┘
//!       │           ┌───────────┐     ┌─────▼──────┐
//!       └───────────│  Chunker  │◀────│   Dedup    │
//!      (ReplySink)  └───────────┘     └────────────┘
//! ```

pub mod error;
pub mod message;
pub mod report;
pub mod resolver;
pub mod sink;

pub use error::{ResolveError, ResolveResult, SinkError, SinkResult, UnitFault};
pub use message::{Candidate, Destination, DestinationKind, InboundMessage};
pub use report::{BoxedReporter, ErrorReporter, TracingReporter};
pub use resolver::{BoxedResolver, Resolution, Resolver};
pub use sink::{BoxedSink, ReplySink};

/// Prelude for common imports.
pub mod prelude {
    pub use super::{
        Candidate, Destination, ErrorReporter, InboundMessage, ReplySink, Resolution,
        ResolveError, ResolveResult, Resolver,
    };
}
