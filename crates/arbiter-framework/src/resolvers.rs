//! Ready-made resolver adapters.
//!
//! The real lookup backends live outside this crate. These adapters cover the
//! common shapes around them:
//!
//! - [`StaticResolver`]: fixed text (help, policy links)
//! - [`TableResolver`]: an in-memory, case-insensitive lookup table
//! - [`FnResolver`]: wraps an async closure
//! - [`PrefixFallback`]: retries another resolver with shorter word prefixes

use std::collections::HashMap;
use std::future::Future;
use std::marker::PhantomData;

use async_trait::async_trait;
use tracing::trace;

use arbiter_core::{ResolveResult, Resolution, Resolver};

// ============================================================================
// StaticResolver
// ============================================================================

/// Answers every query with the same text.
#[derive(Debug, Clone)]
pub struct StaticResolver {
    name: String,
    text: String,
}

impl StaticResolver {
    /// Creates a static resolver.
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

#[async_trait]
impl Resolver for StaticResolver {
    fn name(&self) -> &str {
        &self.name
    }

    async fn resolve(&self, _query: &str) -> ResolveResult<Resolution> {
        Ok(Resolution::Reply(self.text.clone()))
    }
}

// ============================================================================
// TableResolver
// ============================================================================

/// Looks queries up in a fixed table, ignoring case.
#[derive(Debug, Clone, Default)]
pub struct TableResolver {
    name: String,
    entries: HashMap<String, String>,
}

impl TableResolver {
    /// Creates an empty table.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: HashMap::new(),
        }
    }

    /// Adds an entry (builder pattern).
    pub fn entry(mut self, key: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Adds an entry.
    pub fn insert(&mut self, key: impl AsRef<str>, value: impl Into<String>) {
        self.entries
            .insert(key.as_ref().to_lowercase(), value.into());
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl Resolver for TableResolver {
    fn name(&self) -> &str {
        &self.name
    }

    async fn resolve(&self, query: &str) -> ResolveResult<Resolution> {
        Ok(self
            .entries
            .get(&query.to_lowercase())
            .map_or(Resolution::NotFound, |v| Resolution::Reply(v.clone())))
    }
}

// ============================================================================
// FnResolver
// ============================================================================

/// Adapts an async closure into a [`Resolver`].
///
/// ```rust,ignore
/// let echo = FnResolver::new("echo", |query: String| async move {
///     Ok(Resolution::Reply(query))
/// });
/// ```
pub struct FnResolver<F, Fut> {
    name: String,
    f: F,
    _marker: PhantomData<fn() -> Fut>,
}

impl<F, Fut> FnResolver<F, Fut>
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ResolveResult<Resolution>> + Send + 'static,
{
    /// Wraps `f` as a resolver called `name`.
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<F, Fut> Resolver for FnResolver<F, Fut>
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ResolveResult<Resolution>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn resolve(&self, query: &str) -> ResolveResult<Resolution> {
        (self.f)(query.to_string()).await
    }
}

// ============================================================================
// PrefixFallback
// ============================================================================

/// Retries an inner resolver with progressively shorter word prefixes.
///
/// `"lightning bolt do"` is tried as-is, then as `"lightning bolt"`, then as
/// `"lightning"`. The first non-`NotFound` result wins. Errors stop the search.
#[derive(Debug, Clone)]
pub struct PrefixFallback<R> {
    inner: R,
    min_words: usize,
}

impl<R: Resolver> PrefixFallback<R> {
    /// Wraps `inner`. Prefixes shorter than one word are never tried.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            min_words: 1,
        }
    }

    /// Sets the shortest prefix (in words) worth trying.
    pub fn min_words(mut self, min_words: usize) -> Self {
        self.min_words = min_words.max(1);
        self
    }
}

#[async_trait]
impl<R: Resolver> Resolver for PrefixFallback<R> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn resolve(&self, query: &str) -> ResolveResult<Resolution> {
        let words: Vec<&str> = query.split_whitespace().collect();

        for len in (self.min_words..=words.len()).rev() {
            let prefix = words[..len].join(" ");
            trace!(resolver = self.inner.name(), prefix = %prefix, "Trying prefix");
            match self.inner.resolve(&prefix).await? {
                Resolution::NotFound => continue,
                found => return Ok(found),
            }
        }

        Ok(Resolution::NotFound)
    }
}
