//! Concurrent candidate dispatcher for the Arbiter framework.
//!
//! The [`Dispatcher`] resolves every candidate of one message concurrently and
//! hands the replies back in candidate order.
//!
//! # Fan-out / fan-in
//!
//! 1. One task is spawned per candidate (a *dispatch unit*)
//! 2. Each unit selects its route through the [`Router`] and awaits the
//!    resolver
//! 3. The dispatcher waits for every unit and writes each result into the
//!    slot at the candidate's position
//!
//! A slow resolver delays only its own message. A unit that panics is caught
//! at the join, reported, and leaves an empty slot; its siblings are
//! unaffected. No timeouts are applied here.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use arbiter_framework::{Dispatcher, Router};
//!
//! let dispatcher = Dispatcher::new(Arc::new(router));
//! let replies = dispatcher.dispatch(candidates).await;
//! assert_eq!(replies.len(), candidate_count);
//! ```

use std::any::Any;
use std::sync::Arc;

use futures::future;
use tokio::task::JoinError;
use tracing::{Instrument, Level, debug, span, warn};

use crate::route::Reply;
use crate::router::Router;
use arbiter_core::{BoxedReporter, Candidate, TracingReporter, UnitFault};

/// Resolves candidates concurrently and reassembles replies in order.
///
/// # Thread Safety
///
/// `Dispatcher` is `Send + Sync` and cheap to clone.
#[derive(Clone)]
pub struct Dispatcher {
    router: Arc<Router>,
    reporter: BoxedReporter,
    failure_reply: Option<Arc<str>>,
}

impl Dispatcher {
    /// Creates a dispatcher that reports through `tracing`.
    pub fn new(router: Arc<Router>) -> Self {
        Self {
            router,
            reporter: Arc::new(TracingReporter),
            failure_reply: None,
        }
    }

    /// Sets the error reporter for resolver errors and unit faults.
    pub fn reporter(mut self, reporter: BoxedReporter) -> Self {
        self.reporter = reporter;
        self
    }

    /// Sets the reply used when a resolver returns an error.
    ///
    /// With `None` (the default) failed lookups produce an empty reply and
    /// the user sees nothing.
    pub fn failure_reply(mut self, reply: Option<impl Into<String>>) -> Self {
        self.failure_reply = reply.map(|r| Arc::from(r.into()));
        self
    }

    /// Returns the router.
    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    /// Resolves all candidates and returns one reply per candidate, in input
    /// order. Replies may be empty.
    pub async fn dispatch(&self, candidates: Vec<Candidate>) -> Vec<String> {
        self.dispatch_replies(candidates)
            .await
            .into_iter()
            .map(|reply| reply.text)
            .collect()
    }

    /// Like [`dispatch`](Self::dispatch), tagging each reply with how it was
    /// produced.
    pub async fn dispatch_replies(&self, candidates: Vec<Candidate>) -> Vec<Reply> {
        let span = span!(Level::DEBUG, "dispatch", candidates = candidates.len());
        self.dispatch_inner(candidates).instrument(span).await
    }

    async fn dispatch_inner(&self, candidates: Vec<Candidate>) -> Vec<Reply> {
        let mut slots = vec![Reply::default(); candidates.len()];
        if candidates.is_empty() {
            return slots;
        }

        let mut queries = Vec::with_capacity(candidates.len());
        let handles: Vec<_> = candidates
            .into_iter()
            .enumerate()
            .map(|(slot, candidate)| {
                queries.push(candidate.text().to_string());
                let unit_span = span!(Level::TRACE, "unit", slot, query = %candidate);
                tokio::spawn(
                    run_unit(
                        Arc::clone(&self.router),
                        Arc::clone(&self.reporter),
                        self.failure_reply.clone(),
                        candidate,
                    )
                    .instrument(unit_span),
                )
            })
            .collect();

        let results = future::join_all(handles).await;

        for (slot, (result, query)) in results.into_iter().zip(queries).enumerate() {
            match result {
                Ok(reply) => slots[slot] = reply,
                Err(err) => {
                    let fault = UnitFault {
                        index: slot,
                        query,
                        reason: join_error_reason(err),
                    };
                    warn!(slot, "Dispatch unit faulted, leaving slot empty");
                    self.reporter.report("dispatch unit", &fault);
                }
            }
        }

        debug!(
            filled = slots.iter().filter(|s| !s.text.is_empty()).count(),
            total = slots.len(),
            "Dispatch complete"
        );
        slots
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("route_count", &self.router.route_count())
            .field("failure_reply", &self.failure_reply)
            .finish_non_exhaustive()
    }
}

/// Body of one dispatch unit.
async fn run_unit(
    router: Arc<Router>,
    reporter: BoxedReporter,
    failure_reply: Option<Arc<str>>,
    candidate: Candidate,
) -> Reply {
    let Some(route) = router.select(&candidate) else {
        debug!(candidate = %candidate, "No route for candidate");
        return Reply::default();
    };

    match route.resolve_reply(&candidate).await {
        Ok(reply) => reply,
        Err(err) => {
            let context = format!("resolver '{}'", route.resolver_name());
            reporter.report(&context, &err);
            Reply::failure(failure_reply.as_deref().unwrap_or_default())
        }
    }
}

fn join_error_reason(err: JoinError) -> String {
    if err.is_panic() {
        panic_message(err.into_panic())
    } else {
        "cancelled".to_string()
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
