//! Error reporting for unit faults and resolver failures.

use std::error::Error;
use std::sync::Arc;

use tracing::error;

/// Receives errors that the router recovers from.
///
/// Reports are fire-and-forget; implementations must not block.
pub trait ErrorReporter: Send + Sync + 'static {
    /// Reports a recovered error. `context` names what was being done.
    fn report(&self, context: &str, error: &(dyn Error + Send + Sync));
}

/// A shared reporter trait object.
pub type BoxedReporter = Arc<dyn ErrorReporter>;

/// Reports errors through `tracing` at `ERROR` level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, context: &str, error: &(dyn Error + Send + Sync)) {
        error!(context, error = %error, "Recovered from failure");
    }
}

impl<R: ErrorReporter + ?Sized> ErrorReporter for Arc<R> {
    fn report(&self, context: &str, error: &(dyn Error + Send + Sync)) {
        (**self).report(context, error);
    }
}
