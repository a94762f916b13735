//! The resolver contract.
//!
//! A [`Resolver`] maps a normalized candidate string to formatted reply text.
//! Card lookups, rule and glossary lookups, achievements, policy links and
//! help text are all resolvers; the router only ever sees this trait.
//!
//! # Example
//!
//! ```rust,ignore
//! use arbiter_core::{Resolution, ResolveResult, Resolver};
//! use async_trait::async_trait;
//!
//! struct Glossary;
//!
//! #[async_trait]
//! impl Resolver for Glossary {
//!     fn name(&self) -> &str {
//!         "glossary"
//!     }
//!
//!     async fn resolve(&self, query: &str) -> ResolveResult<Resolution> {
//!         match query {
//!             "trample" => Ok(Resolution::reply("Trample: excess damage ...")),
//!             _ => Ok(Resolution::NotFound),
//!         }
//!     }
//! }
//! ```

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ResolveResult;

/// The outcome of a successful resolver call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Formatted reply text. May contain `\n` to separate semantic lines;
    /// an empty string means "say nothing".
    Reply(String),
    /// The resolver found nothing for the query.
    NotFound,
}

impl Resolution {
    /// Convenience constructor for [`Resolution::Reply`].
    pub fn reply(text: impl Into<String>) -> Self {
        Self::Reply(text.into())
    }

    /// Returns `true` for [`Resolution::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

/// A lookup capability.
///
/// Implementations may block on network I/O, may keep caches, and must
/// tolerate being called concurrently with the same query.
#[async_trait]
pub trait Resolver: Send + Sync + 'static {
    /// A short name used in logs.
    fn name(&self) -> &str;

    /// Resolves a normalized query.
    async fn resolve(&self, query: &str) -> ResolveResult<Resolution>;
}

/// A shared resolver trait object.
pub type BoxedResolver = Arc<dyn Resolver>;

#[async_trait]
impl<R: Resolver + ?Sized> Resolver for Arc<R> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn resolve(&self, query: &str) -> ResolveResult<Resolution> {
        (**self).resolve(query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Upper;

    #[async_trait]
    impl Resolver for Upper {
        fn name(&self) -> &str {
            "upper"
        }

        async fn resolve(&self, query: &str) -> ResolveResult<Resolution> {
            Ok(Resolution::reply(query.to_uppercase()))
        }
    }

    #[tokio::test]
    async fn test_arc_resolver_delegates() {
        let resolver: BoxedResolver = Arc::new(Upper);
        let shared = Arc::new(Arc::clone(&resolver));
        assert_eq!(shared.name(), "upper");
        assert_eq!(
            shared.resolve("bolt").await.unwrap(),
            Resolution::reply("BOLT")
        );
    }
}
