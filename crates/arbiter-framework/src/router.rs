//! Resolver selection for the Arbiter framework.
//!
//! The [`Router`] holds an ordered list of [`Route`]s plus an optional
//! fallback. For each candidate:
//!
//! 1. Literal candidates (`!name help`) go straight to the fallback
//! 2. Otherwise routes are checked in registration order; the first match wins
//! 3. If nothing matches, the fallback route answers
//!
//! ```rust,ignore
//! use arbiter_framework::{Route, Router};
//!
//! let router = Router::new()
//!     .with(Route::new(help).keyword("help").name("help"))
//!     .with(Route::new(rules).prefix("rule").name("rules"))
//!     .fallback(Route::new(cards).name("cards"));
//! ```

use tracing::trace;

use crate::route::Route;
use arbiter_core::Candidate;

/// Selects the route that answers each candidate.
///
/// `Router` is `Send + Sync` and is shared between dispatch units behind an
/// `Arc`.
#[derive(Debug, Default, Clone)]
pub struct Router {
    routes: Vec<Route>,
    fallback: Option<Route>,
}

impl Router {
    /// Creates a new, empty router.
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            fallback: None,
        }
    }

    /// Adds a route. Routes are checked in the order they are added.
    pub fn add(&mut self, route: Route) {
        self.routes.push(route);
    }

    /// Adds a route (builder pattern).
    pub fn with(mut self, route: Route) -> Self {
        self.routes.push(route);
        self
    }

    /// Sets the fallback route used when no other route matches.
    ///
    /// The fallback's own check is ignored.
    pub fn fallback(mut self, route: Route) -> Self {
        self.fallback = Some(route);
        self
    }

    /// Returns the number of registered routes, excluding the fallback.
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Returns `true` if a fallback route is set.
    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    /// Selects the route for a candidate, if any.
    pub fn select(&self, candidate: &Candidate) -> Option<&Route> {
        if !candidate.is_literal()
            && let Some(route) = self.routes.iter().find(|r| r.matches(candidate))
        {
            trace!(
                route = route.get_name().unwrap_or("unnamed"),
                candidate = %candidate,
                "Route matched"
            );
            return Some(route);
        }

        self.fallback.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolvers::StaticResolver;

    fn router() -> Router {
        Router::new()
            .with(Route::new(StaticResolver::new("help", "usage")).keyword("help").name("help"))
            .with(Route::new(StaticResolver::new("rules", "rule")).prefix("rule").name("rules"))
            .with(Route::new(StaticResolver::new("any", "any")).name("catch-all"))
            .fallback(Route::new(StaticResolver::new("cards", "card")).name("cards"))
    }

    fn selected(router: &Router, candidate: Candidate) -> Option<&str> {
        router.select(&candidate).and_then(Route::get_name)
    }

    #[test]
    fn test_first_match_wins() {
        let router = router();
        assert_eq!(selected(&router, Candidate::new(0, "help")), Some("help"));
        assert_eq!(selected(&router, Candidate::new(0, "rule 100.1")), Some("rules"));
        assert_eq!(selected(&router, Candidate::new(0, "bolt")), Some("catch-all"));
    }

    #[test]
    fn test_literal_candidate_uses_fallback() {
        let router = router();
        let candidate = Candidate::new(0, "help").literal(true);
        assert_eq!(selected(&router, candidate), Some("cards"));
    }

    #[test]
    fn test_no_match_without_fallback() {
        let router = Router::new()
            .with(Route::new(StaticResolver::new("help", "usage")).keyword("help"));
        assert!(router.select(&Candidate::new(0, "bolt")).is_none());
        assert!(!router.has_fallback());
        assert_eq!(router.route_count(), 1);
    }

    #[test]
    fn test_fallback_when_nothing_matches() {
        let router = Router::new()
            .with(Route::new(StaticResolver::new("help", "usage")).keyword("help"))
            .fallback(Route::new(StaticResolver::new("cards", "card")).name("cards"));
        assert_eq!(selected(&router, Candidate::new(0, "bolt")), Some("cards"));
    }
}
