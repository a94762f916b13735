//! Routes: resolver selection rules.
//!
//! A [`Route`] pairs a check on the candidate with the [`Resolver`] that
//! answers it. Routes are how the router tells help text, policy links, rule
//! lookups and metadata sub-queries apart from the default card lookup.
//!
//! # Design
//!
//! A route is responsible for:
//! - Checking whether a candidate belongs to it (keyword, prefix, regex or a
//!   custom predicate)
//! - Rewriting the candidate into the resolver's query (prefix routes strip
//!   their keyword: `rule 601.2` → `601.2`)
//! - Turning [`Resolution::NotFound`] into user-visible text
//!
//! # Tower Service Integration
//!
//! `Route` implements `tower::Service<Candidate>`, so middleware can be
//! layered on a single route:
//!
//! ```rust,ignore
//! use tower::ServiceBuilder;
//!
//! let route = Route::new(RulesResolver::new()).prefix("rule");
//! let service = ServiceBuilder::new()
//!     .map_response(|reply: String| reply.replace("  ", " "))
//!     .service(route);
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! let help = Route::new(StaticResolver::new("help", HELP_TEXT)).keyword("help");
//! let rules = Route::new(rules_resolver).prefix("rule").not_found("No such rule: {query}");
//! let numbered = Route::new(rules_resolver).regex(r"^\d{3}(\.\d+[a-z]?)?$")?;
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use regex::Regex;
use tower::Service;
use tracing::{debug, trace};

use arbiter_core::{BoxedResolver, Candidate, ResolveError, ResolveResult, Resolution, Resolver};

/// Default not-found reply. `{query}` is replaced with the resolver query.
pub const DEFAULT_NOT_FOUND: &str = "\"{query}\" not found.";

/// A type-erased check function.
pub type CheckFn = Arc<dyn Fn(&Candidate) -> bool + Send + Sync>;

/// A type-erased query rewrite function.
pub type RewriteFn = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// How a reply was produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReplyKind {
    /// The resolver answered.
    #[default]
    Answer,
    /// The resolver found nothing; the text is the route's not-found reply.
    NotFound,
    /// The resolver failed; the text is the configured failure reply.
    Failure,
}

/// Reply text tagged with its [`ReplyKind`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub kind: ReplyKind,
}

impl Reply {
    pub fn answer(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: ReplyKind::Answer,
        }
    }

    pub fn not_found(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: ReplyKind::NotFound,
        }
    }

    pub fn failure(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: ReplyKind::Failure,
        }
    }

    /// Returns `true` for resolver answers, `false` for not-found and
    /// failure replies.
    pub fn is_answer(&self) -> bool {
        self.kind == ReplyKind::Answer
    }
}

/// Internal data for a Route.
///
/// Wrapped in an `Arc` so clones are cheap; `Clone` supports copy-on-write
/// through `Arc::make_mut`.
#[derive(Clone)]
struct RouteInner {
    check_fn: Option<CheckFn>,
    rewrite_fn: Option<RewriteFn>,
    resolver: BoxedResolver,
    not_found: String,
    name: Option<String>,
}

/// A resolver selection rule.
///
/// A route with no check matches every candidate, which is what the
/// router's fallback route usually wants.
#[derive(Clone)]
pub struct Route {
    inner: Arc<RouteInner>,
}

impl Route {
    /// Creates a route answered by `resolver`.
    pub fn new<R: Resolver>(resolver: R) -> Self {
        Self::from_boxed(Arc::new(resolver))
    }

    /// Creates a route from a shared resolver.
    pub fn from_boxed(resolver: BoxedResolver) -> Self {
        Self {
            inner: Arc::new(RouteInner {
                check_fn: None,
                rewrite_fn: None,
                resolver,
                not_found: DEFAULT_NOT_FOUND.to_string(),
                name: None,
            }),
        }
    }

    fn inner_mut(&mut self) -> &mut RouteInner {
        Arc::make_mut(&mut self.inner)
    }

    /// Sets a name for this route (used in logs).
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.inner_mut().name = Some(name.into());
        self
    }

    /// Sets a custom check function.
    pub fn check<F>(mut self, f: F) -> Self
    where
        F: Fn(&Candidate) -> bool + Send + Sync + 'static,
    {
        self.inner_mut().check_fn = Some(Arc::new(f));
        self
    }

    /// Sets a custom query rewrite.
    pub fn rewrite<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.inner_mut().rewrite_fn = Some(Arc::new(f));
        self
    }

    /// Matches candidates equal to `keyword`, ignoring ASCII case.
    pub fn keyword(self, keyword: impl Into<String>) -> Self {
        let keyword = keyword.into();
        self.check(move |c| c.text().eq_ignore_ascii_case(&keyword))
    }

    /// Matches candidates of the form `<keyword> <rest>` and passes only
    /// `<rest>` to the resolver.
    pub fn prefix(self, keyword: impl Into<String>) -> Self {
        let keyword = keyword.into();
        let strip = keyword.clone();
        self.check(move |c| strip_keyword(c.text(), &keyword).is_some())
            .rewrite(move |q| strip_keyword(q, &strip).unwrap_or(q).to_string())
    }

    /// Matches candidates against a regular expression.
    pub fn regex(self, pattern: &str) -> Result<Self, regex::Error> {
        let re = Regex::new(pattern)?;
        Ok(self.check(move |c| re.is_match(c.text())))
    }

    /// Sets the reply used when the resolver finds nothing.
    ///
    /// `{query}` in the template is replaced with the resolver query.
    pub fn not_found(mut self, template: impl Into<String>) -> Self {
        self.inner_mut().not_found = template.into();
        self
    }

    /// Checks if this route should answer the candidate.
    pub fn matches(&self, candidate: &Candidate) -> bool {
        match &self.inner.check_fn {
            Some(f) => f(candidate),
            None => true,
        }
    }

    /// Returns the query the resolver will see for this candidate.
    pub fn query_for(&self, candidate: &Candidate) -> String {
        match &self.inner.rewrite_fn {
            Some(f) => f(candidate.text()),
            None => candidate.text().to_string(),
        }
    }

    /// Returns the name of this route, if set.
    pub fn get_name(&self) -> Option<&str> {
        self.inner.name.as_deref()
    }

    /// Returns the name of the resolver behind this route.
    pub fn resolver_name(&self) -> &str {
        self.inner.resolver.name()
    }

    /// Resolves a candidate into reply text.
    ///
    /// Not-found results become the route's not-found reply. Resolver errors
    /// are returned to the caller.
    pub async fn resolve(&self, candidate: &Candidate) -> ResolveResult<String> {
        self.resolve_reply(candidate).await.map(|reply| reply.text)
    }

    /// Like [`resolve`](Self::resolve), keeping whether the resolver answered
    /// or found nothing.
    pub async fn resolve_reply(&self, candidate: &Candidate) -> ResolveResult<Reply> {
        let query = self.query_for(candidate);
        trace!(
            route = self.get_name().unwrap_or("unnamed"),
            resolver = self.resolver_name(),
            query = %query,
            "Resolving candidate"
        );

        match self.inner.resolver.resolve(&query).await? {
            Resolution::Reply(text) => Ok(Reply::answer(text)),
            Resolution::NotFound => {
                debug!(
                    route = self.get_name().unwrap_or("unnamed"),
                    query = %query,
                    "Resolver found nothing"
                );
                Ok(Reply::not_found(
                    self.inner.not_found.replace("{query}", &query),
                ))
            }
        }
    }
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("name", &self.inner.name)
            .field("resolver", &self.resolver_name())
            .field("has_check", &self.inner.check_fn.is_some())
            .finish()
    }
}

/// Returns the remainder after `<keyword><whitespace>`, ignoring ASCII case.
fn strip_keyword<'a>(text: &'a str, keyword: &str) -> Option<&'a str> {
    let head = text.get(..keyword.len())?;
    let rest = &text[keyword.len()..];
    if head.eq_ignore_ascii_case(keyword) && rest.starts_with(char::is_whitespace) {
        let rest = rest.trim_start();
        (!rest.is_empty()).then_some(rest)
    } else {
        None
    }
}

// ============================================================================
// Tower Service Implementation for Route
// ============================================================================

/// Tower Service implementation for Route.
///
/// The service does not apply the route's check; the caller has already
/// selected the route.
impl Service<Candidate> for Route {
    type Response = String;
    type Error = ResolveError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, candidate: Candidate) -> Self::Future {
        let route = self.clone();
        Box::pin(async move { route.resolve(&candidate).await })
    }
}
