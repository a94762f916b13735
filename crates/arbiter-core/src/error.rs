//! Unified error types for the Arbiter core.
//!
//! These are the errors collaborators hand back to the router. Runtime-level
//! errors (configuration, startup) live in `arbiter-runtime`.

use thiserror::Error;

// =============================================================================
// Resolver Errors
// =============================================================================

/// Errors a resolver may return instead of a reply.
///
/// "Nothing matched" is not an error; resolvers report it with
/// [`Resolution::NotFound`](crate::Resolution::NotFound).
#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    /// The backing data source could not be reached or answered badly.
    #[error("lookup backend '{backend}' unavailable: {reason}")]
    Unavailable {
        /// Name of the backend that failed.
        backend: String,
        /// Reason for failure.
        reason: String,
    },

    /// The backend answered but the payload could not be interpreted.
    #[error("malformed response from '{backend}': {reason}")]
    Malformed {
        /// Name of the backend that failed.
        backend: String,
        /// Reason for failure.
        reason: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(String),

    /// Other error.
    #[error("{0}")]
    Other(String),
}

impl ResolveError {
    /// Creates an unavailable-backend error.
    pub fn unavailable(backend: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            backend: backend.into(),
            reason: reason.into(),
        }
    }

    /// Creates a malformed-response error.
    pub fn malformed(backend: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Malformed {
            backend: backend.into(),
            reason: reason.into(),
        }
    }
}

impl From<std::io::Error> for ResolveError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

// =============================================================================
// Sink Errors
// =============================================================================

/// Errors that can occur while handing a physical line to the transport.
#[derive(Debug, Clone, Error)]
pub enum SinkError {
    /// The transport is not connected.
    #[error("transport is not connected")]
    NotConnected,

    /// The destination rejected the line.
    #[error("destination '{destination}' rejected message: {reason}")]
    Rejected {
        /// The destination identifier.
        destination: String,
        /// Reason for rejection.
        reason: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for SinkError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

// =============================================================================
// Unit Faults
// =============================================================================

/// A dispatch unit terminated abnormally (panicked or was aborted).
#[derive(Debug, Clone, Error)]
#[error("dispatch unit #{index} for '{query}' faulted: {reason}")]
pub struct UnitFault {
    /// Position of the candidate in its message.
    pub index: usize,
    /// The candidate text the unit was resolving.
    pub query: String,
    /// Panic payload or abort reason.
    pub reason: String,
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for resolver calls.
pub type ResolveResult<T> = Result<T, ResolveError>;

/// Result type for sink calls.
pub type SinkResult<T> = Result<T, SinkError>;
