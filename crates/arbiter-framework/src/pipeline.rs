//! The message pipeline: raw chat text in, physical lines out.
//!
//! ```text
//! InboundMessage
//!     │ Tokenizer           candidates, in source order
//!     ▼
//! Dispatcher              one reply per candidate, same order
//!     │ drop empty
//!     ▼
//! Deduplicator            full reply, or a short notice (answers only)
//!     │
//!     ▼
//! Chunker                 physical lines, prefix on the first
//!     │
//!     ▼
//! ReplySink
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use arbiter_framework::{Pipeline, PipelineSettings, Route, Router};
//!
//! let router = Router::new().fallback(Route::new(cards));
//! let pipeline = Pipeline::builder(router)
//!     .settings(PipelineSettings::default())
//!     .build();
//!
//! pipeline.deliver(&message, &sink).await;
//! ```

use std::sync::Arc;
use std::time::Duration;

use tracing::{Instrument, Level, debug, span, warn};

use crate::chunker::{Chunker, DEFAULT_CONTINUATION, DEFAULT_LINE_WIDTH};
use crate::dedup::{
    DEFAULT_DEDUP_WINDOW, DEFAULT_EXEMPT_PHRASES, DEFAULT_PREVIEW_LEN, DedupDecision, DedupStore,
    Deduplicator, ExemptFn, ExemptPhrases,
};
use crate::dispatcher::Dispatcher;
use crate::route::Reply;
use crate::router::Router;
use crate::tokenizer::{DEFAULT_LITERAL_KEYWORD, DEFAULT_MAX_CANDIDATE_LEN, Tokenizer};
use arbiter_core::{BoxedReporter, InboundMessage, ReplySink};

/// Lead-in of the notice sent in place of a suppressed duplicate.
pub const DUPLICATE_NOTICE: &str = "Duplicate response withheld:";

/// Tunables for a [`Pipeline`].
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    /// Maximum physical line width.
    pub line_width: usize,
    /// Marker appended to wrapped lines.
    pub continuation: String,
    /// Maximum candidate length in characters.
    pub max_candidate_len: usize,
    /// Keyword forcing a literal lookup, or `None` to disable.
    pub literal_keyword: Option<String>,
    /// Duplicate suppression window.
    pub dedup_window: Duration,
    /// Length of the preview in duplicate notices.
    pub preview_len: usize,
    /// Replies containing any of these are never suppressed.
    pub exempt_phrases: Vec<String>,
    /// Prefix channel replies with `"<sender>: "`.
    pub address_replies: bool,
    /// Reply used when a resolver fails. `None` keeps failures silent.
    pub failure_reply: Option<String>,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            line_width: DEFAULT_LINE_WIDTH,
            continuation: DEFAULT_CONTINUATION.to_string(),
            max_candidate_len: DEFAULT_MAX_CANDIDATE_LEN,
            literal_keyword: Some(DEFAULT_LITERAL_KEYWORD.to_string()),
            dedup_window: DEFAULT_DEDUP_WINDOW,
            preview_len: DEFAULT_PREVIEW_LEN,
            exempt_phrases: DEFAULT_EXEMPT_PHRASES.iter().map(|p| p.to_string()).collect(),
            address_replies: true,
            failure_reply: None,
        }
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Builder for [`Pipeline`].
pub struct PipelineBuilder {
    router: Router,
    settings: PipelineSettings,
    store: Option<Arc<DedupStore>>,
    reporter: Option<BoxedReporter>,
    exempt: Option<ExemptFn>,
}

impl PipelineBuilder {
    /// Sets the pipeline settings.
    pub fn settings(mut self, settings: PipelineSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Uses a shared dedup store instead of a fresh one.
    pub fn store(mut self, store: Arc<DedupStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Sets the error reporter.
    pub fn reporter(mut self, reporter: BoxedReporter) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// Replaces the phrase-based exemption with a custom predicate.
    pub fn exempt<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.exempt = Some(Arc::new(f));
        self
    }

    /// Builds the pipeline.
    pub fn build(self) -> Pipeline {
        let settings = self.settings;

        let tokenizer = Tokenizer::new()
            .max_len(settings.max_candidate_len)
            .literal_keyword(settings.literal_keyword.clone());

        let mut dispatcher = Dispatcher::new(Arc::new(self.router))
            .failure_reply(settings.failure_reply.clone());
        if let Some(reporter) = self.reporter {
            dispatcher = dispatcher.reporter(reporter);
        }

        let exempt = self
            .exempt
            .unwrap_or_else(|| ExemptPhrases::new(&settings.exempt_phrases).into_predicate());
        let dedup = Deduplicator::new(self.store.unwrap_or_default())
            .window(settings.dedup_window)
            .preview_len(settings.preview_len)
            .exempt_fn(exempt);

        let chunker = Chunker::new()
            .width(settings.line_width)
            .continuation(settings.continuation.clone());

        Pipeline {
            tokenizer,
            dispatcher,
            dedup,
            chunker,
            address_replies: settings.address_replies,
        }
    }
}

// =============================================================================
// Pipeline
// =============================================================================

/// Turns inbound messages into ordered, deduplicated, wrapped reply lines.
///
/// Cheap to clone; clones share the router and the dedup store.
#[derive(Debug, Clone)]
pub struct Pipeline {
    tokenizer: Tokenizer,
    dispatcher: Dispatcher,
    dedup: Deduplicator,
    chunker: Chunker,
    address_replies: bool,
}

impl Pipeline {
    /// Starts building a pipeline around `router`.
    pub fn builder(router: Router) -> PipelineBuilder {
        PipelineBuilder {
            router,
            settings: PipelineSettings::default(),
            store: None,
            reporter: None,
            exempt: None,
        }
    }

    /// Returns the dedup store.
    pub fn store(&self) -> &Arc<DedupStore> {
        self.dedup.store()
    }

    /// Returns the tokenizer.
    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    /// Returns the addressing prefix for replies to `message`.
    pub fn prefix_for(&self, message: &InboundMessage) -> String {
        if self.address_replies && !message.destination.is_private() {
            format!("{}: ", message.sender)
        } else {
            String::new()
        }
    }

    /// Tokenizes and dispatches, returning one raw reply per candidate.
    pub async fn replies(&self, message: &InboundMessage) -> Vec<Reply> {
        let candidates = self
            .tokenizer
            .tokenize(&message.text, message.requires_marker());
        if candidates.is_empty() {
            return Vec::new();
        }
        self.dispatcher.dispatch_replies(candidates).await
    }

    /// Runs the full pipeline and returns the physical lines to send, in
    /// order.
    pub async fn process(&self, message: &InboundMessage) -> Vec<String> {
        let span = span!(
            Level::DEBUG,
            "message",
            destination = %message.destination,
            sender = %message.sender
        );
        self.process_inner(message).instrument(span).await
    }

    async fn process_inner(&self, message: &InboundMessage) -> Vec<String> {
        let replies = self.replies(message).await;
        let prefix = self.prefix_for(message);

        let mut lines = Vec::new();
        for reply in replies {
            if reply.text.trim().is_empty() {
                continue;
            }
            if !reply.is_answer() {
                lines.extend(self.chunker.chunk(&reply.text, &prefix));
                continue;
            }

            let text = match self.dedup.check(&message.destination, &reply.text) {
                DedupDecision::Send => reply.text,
                DedupDecision::Suppress { preview } => {
                    format!("{DUPLICATE_NOTICE} {preview}...")
                }
            };

            lines.extend(self.chunker.chunk(&text, &prefix));
        }

        debug!(lines = lines.len(), "Message processed");
        lines
    }

    /// Processes `message` and sends every line to `sink` in order.
    ///
    /// Returns the number of lines sent. Delivery of a message stops at the
    /// first sink error, which is logged.
    pub async fn deliver(&self, message: &InboundMessage, sink: &dyn ReplySink) -> usize {
        let lines = self.process(message).await;
        let mut sent = 0;

        for line in &lines {
            if let Err(err) = sink.send(&message.destination, line).await {
                warn!(
                    destination = %message.destination,
                    error = %err,
                    dropped = lines.len() - sent,
                    "Reply sink failed, dropping remaining lines"
                );
                break;
            }
            sent += 1;
        }
        sent
    }
}
