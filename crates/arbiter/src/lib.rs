//! # Arbiter
//!
//! A chat command router: it pulls lookup commands out of chat lines,
//! resolves them concurrently, and hands back ordered, deduplicated,
//! line-wrapped replies.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐   ┌───────────┐   ┌──────────────────────────────┐   ┌────────┐
//! │ Transport │──▶│ Tokenizer │──▶│ Dispatcher                   │──▶│ Dedup  │
//! │ (inbound) │   │           │   │  !alpha ──▶ Route ──▶ lookup │   │ Chunker│──▶ ReplySink
//! └───────────┘   └───────────┘   │  !beta  ──▶ Route ──▶ lookup │   └────────┘
//!                                 └──────────────────────────────┘
//! ```
//!
//! - **Runtime**: message loop, configuration, logging, dedup sweeping
//! - **Tokenizer**: finds `!cmd`, `&cmd` and `[[name]]` commands in a line
//! - **Routes**: pick the resolver for each command (keyword, prefix, regex)
//! - **Resolvers**: user-supplied async lookups (cards, rules, ...)
//! - **Dispatcher**: one task per command; replies come back in command order
//! - **Dedup / Chunker**: suppress channel repeats, wrap to the line limit
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use arbiter::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let router = Router::new()
//!         .with(Route::new(StaticResolver::new("help", "Try !<card name>")).keyword("help"))
//!         .fallback(Route::new(PrefixFallback::new(my_card_resolver)));
//!
//!     let runtime = ArbiterRuntime::builder()
//!         .router(router)
//!         .sink(my_irc_sink)
//!         .build()?;
//!
//!     let (tx, rx) = tokio::sync::mpsc::channel(64);
//!     my_transport.forward_into(tx);
//!     runtime.run(rx).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config`: load `arbiter.toml` files (default)
//! - `json-log`: JSON log output

pub use arbiter_core as core;
pub use arbiter_framework as framework;
pub use arbiter_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use arbiter::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use arbiter_runtime::{ArbiterConfig, ArbiterRuntime, ConfigLoader};

    // Routing
    pub use arbiter_framework::{Route, Router};

    // Ready-made resolvers
    pub use arbiter_framework::{FnResolver, PrefixFallback, StaticResolver, TableResolver};

    // Pipeline pieces, for use without the runtime
    pub use arbiter_framework::{Chunker, DedupStore, Pipeline, PipelineSettings, Tokenizer};

    // Collaborator contracts for custom implementations
    pub use arbiter_core::{
        Destination, ErrorReporter, InboundMessage, ReplySink, ResolveError, ResolveResult,
        Resolution, Resolver, SinkError, SinkResult,
    };
}
