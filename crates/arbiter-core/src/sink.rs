//! The reply sink contract.
//!
//! A [`ReplySink`] is the transport side of the router: it receives one
//! physical line at a time, already wrapped to the transport's width.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::SinkResult;
use crate::message::Destination;

/// Delivers physical lines to a transport.
///
/// The router calls `send` once per line, in order, and awaits each call
/// before sending the next line of the same message.
#[async_trait]
pub trait ReplySink: Send + Sync + 'static {
    /// Sends one physical line to `destination`.
    async fn send(&self, destination: &Destination, line: &str) -> SinkResult<()>;
}

/// A shared sink trait object.
pub type BoxedSink = Arc<dyn ReplySink>;

#[async_trait]
impl<S: ReplySink + ?Sized> ReplySink for Arc<S> {
    async fn send(&self, destination: &Destination, line: &str) -> SinkResult<()> {
        (**self).send(destination, line).await
    }
}
