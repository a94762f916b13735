//! # Arbiter Framework
//!
//! The message pipeline of the Arbiter chat command router.
//!
//! This layer provides:
//! - Tokenizer extracting lookup commands from raw chat text
//! - Route/Router system selecting the resolver for each command
//! - Concurrent dispatcher with ordered reassembly and per-unit fault isolation
//! - Time-windowed duplicate suppression per destination
//! - Word-wrapping chunker for transport line limits
//! - [`Pipeline`] tying them together, and ready-made resolver adapters
//!
//! The framework layer is built on top of the core contracts
//! (`arbiter-core`) and has no knowledge of transports or configuration
//! files.

pub mod chunker;
pub mod dedup;
pub mod dispatcher;
pub mod pipeline;
pub mod resolvers;
pub mod route;
pub mod router;
pub mod tokenizer;

pub use chunker::{Chunker, DEFAULT_CONTINUATION, DEFAULT_LINE_WIDTH};
pub use dedup::{
    DEFAULT_DEDUP_WINDOW, DEFAULT_EXEMPT_PHRASES, DEFAULT_PREVIEW_LEN, DedupDecision, DedupStore,
    Deduplicator, ExemptFn, ExemptPhrases,
};
pub use dispatcher::Dispatcher;
pub use pipeline::{DUPLICATE_NOTICE, Pipeline, PipelineBuilder, PipelineSettings};
pub use resolvers::{FnResolver, PrefixFallback, StaticResolver, TableResolver};
pub use route::{CheckFn, DEFAULT_NOT_FOUND, Reply, ReplyKind, RewriteFn, Route};
pub use router::Router;
pub use tokenizer::{DEFAULT_LITERAL_KEYWORD, DEFAULT_MAX_CANDIDATE_LEN, MARKERS, Tokenizer};
