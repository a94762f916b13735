//! Time-windowed duplicate reply suppression.
//!
//! On public channels the same answer asked for twice in quick succession is
//! noise. The [`Deduplicator`] remembers, per destination, which exact reply
//! texts were sent recently and tells the caller to send a short notice
//! instead of repeating one inside the window.
//!
//! - Private destinations are never deduplicated and never touch the store
//! - Replies matched by the exemption predicate are always sent and never
//!   recorded. Not-found and failure replies never reach the deduplicator;
//!   the pipeline skips them by outcome.
//! - Entries expire after the window; expired entries are dropped lazily when
//!   their destination is next checked, and by [`DedupStore::sweep`]
//!
//! The state lives in a [`DedupStore`] that is injected, so tests and
//! separate bots can use isolated instances.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::tokenizer::truncate_chars;
use arbiter_core::Destination;

/// Default suppression window.
pub const DEFAULT_DEDUP_WINDOW: Duration = Duration::from_secs(30);

/// Default length, in characters, of the preview of a suppressed reply.
pub const DEFAULT_PREVIEW_LEN: usize = 23;

/// Phrases that mark a reply as exempt from suppression by default.
///
/// Matched case-insensitively as whole words.
pub const DEFAULT_EXEMPT_PHRASES: [&str; 2] = ["not found", "no results"];

/// A type-erased exemption predicate.
pub type ExemptFn = Arc<dyn Fn(&str) -> bool + Send + Sync>;

// =============================================================================
// DedupStore
// =============================================================================

/// Recently sent replies for one destination, keyed by exact text.
#[derive(Debug, Default)]
struct DestinationState {
    expiries: HashMap<String, Instant>,
}

impl DestinationState {
    fn purge_expired(&mut self, now: Instant) -> usize {
        let before = self.expiries.len();
        self.expiries.retain(|_, expiry| *expiry > now);
        before - self.expiries.len()
    }
}

/// Concurrency-safe, destination-scoped store of recently sent replies.
///
/// Each destination has its own mutex; the outer map lock is held (shared)
/// for the duration of a check so that [`sweep`](Self::sweep) can never
/// discard a destination while it is being written.
#[derive(Debug, Default)]
pub struct DedupStore {
    destinations: RwLock<HashMap<String, Mutex<DestinationState>>>,
}

impl DedupStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks whether `text` was sent to `destination` within the window and,
    /// if it was not, records it as sent at `now`.
    ///
    /// Returns `true` when the reply should be suppressed. The check and the
    /// record are one critical section on the destination.
    pub fn check_and_record(
        &self,
        destination: &str,
        text: &str,
        now: Instant,
        window: Duration,
    ) -> bool {
        let apply = |state: &mut DestinationState| {
            state.purge_expired(now);
            if state.expiries.contains_key(text) {
                return true;
            }
            state.expiries.insert(text.to_string(), now + window);
            false
        };

        {
            let map = self.destinations.read();
            if let Some(state) = map.get(destination) {
                return apply(&mut state.lock());
            }
        }

        let mut map = self.destinations.write();
        let state = map.entry(destination.to_string()).or_default();
        apply(state.get_mut())
    }

    /// Removes expired entries and destinations left empty.
    ///
    /// Returns the number of entries removed.
    pub fn sweep(&self, now: Instant) -> usize {
        let mut map = self.destinations.write();
        let mut removed = 0;
        map.retain(|_, state| {
            let state = state.get_mut();
            removed += state.purge_expired(now);
            !state.expiries.is_empty()
        });

        if removed > 0 {
            debug!(removed, destinations = map.len(), "Swept expired dedup entries");
        }
        removed
    }

    /// Returns the number of live or not-yet-collected entries.
    pub fn len(&self) -> usize {
        self.destinations
            .read()
            .values()
            .map(|state| state.lock().expiries.len())
            .sum()
    }

    /// Returns `true` if the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of destinations with entries.
    pub fn destination_count(&self) -> usize {
        self.destinations.read().len()
    }
}

// =============================================================================
// Exemption
// =============================================================================

/// Case-insensitive phrase list used as the default exemption predicate.
#[derive(Debug, Clone)]
pub struct ExemptPhrases {
    phrases: Vec<String>,
}

impl Default for ExemptPhrases {
    fn default() -> Self {
        Self::new(DEFAULT_EXEMPT_PHRASES)
    }
}

impl ExemptPhrases {
    /// Creates a phrase list.
    pub fn new<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            phrases: phrases
                .into_iter()
                .map(|p| p.as_ref().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    /// Returns `true` if `text` contains any of the phrases as whole words.
    pub fn matches(&self, text: &str) -> bool {
        let text = text.to_lowercase();
        self.phrases.iter().any(|p| contains_phrase(&text, p))
    }

    /// Converts the list into a predicate.
    pub fn into_predicate(self) -> ExemptFn {
        Arc::new(move |text| self.matches(text))
    }
}

/// Whether `phrase` occurs in `text` with no letter or digit on either side.
fn contains_phrase(text: &str, phrase: &str) -> bool {
    text.match_indices(phrase).any(|(start, _)| {
        let before = text[..start].chars().next_back();
        let after = text[start + phrase.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

// =============================================================================
// Deduplicator
// =============================================================================

/// Outcome of a dedup check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DedupDecision {
    /// Send the reply in full.
    Send,
    /// The reply was sent recently; send a notice with this preview instead.
    Suppress {
        /// The first characters of the suppressed reply.
        preview: String,
    },
}

/// Decides whether a reply may be sent to a destination.
#[derive(Clone)]
pub struct Deduplicator {
    store: Arc<DedupStore>,
    window: Duration,
    preview_len: usize,
    exempt: ExemptFn,
}

impl Deduplicator {
    /// Creates a deduplicator over `store` with default settings.
    pub fn new(store: Arc<DedupStore>) -> Self {
        Self {
            store,
            window: DEFAULT_DEDUP_WINDOW,
            preview_len: DEFAULT_PREVIEW_LEN,
            exempt: ExemptPhrases::default().into_predicate(),
        }
    }

    /// Sets the suppression window.
    pub fn window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    /// Sets the preview length in characters.
    pub fn preview_len(mut self, preview_len: usize) -> Self {
        self.preview_len = preview_len;
        self
    }

    /// Sets the exemption predicate.
    pub fn exempt<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.exempt = Arc::new(f);
        self
    }

    /// Sets a shared exemption predicate.
    pub fn exempt_fn(mut self, f: ExemptFn) -> Self {
        self.exempt = f;
        self
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &Arc<DedupStore> {
        &self.store
    }

    /// Checks `reply` against the store using the current time.
    pub fn check(&self, destination: &Destination, reply: &str) -> DedupDecision {
        self.check_at(destination, reply, Instant::now())
    }

    /// Checks `reply` against the store as of `now`.
    pub fn check_at(
        &self,
        destination: &Destination,
        reply: &str,
        now: Instant,
    ) -> DedupDecision {
        if destination.is_private() {
            return DedupDecision::Send;
        }
        if (self.exempt)(reply) {
            trace!(destination = %destination, "Reply exempt from dedup");
            return DedupDecision::Send;
        }

        if self
            .store
            .check_and_record(destination.id(), reply, now, self.window)
        {
            debug!(destination = %destination, "Suppressing duplicate reply");
            DedupDecision::Suppress {
                preview: truncate_chars(reply, self.preview_len).to_string(),
            }
        } else {
            DedupDecision::Send
        }
    }
}

impl std::fmt::Debug for Deduplicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deduplicator")
            .field("window", &self.window)
            .field("preview_len", &self.preview_len)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CARD: &str = "Lightning Bolt {R} Instant: Lightning Bolt deals 3 damage to any target.";

    fn dedup() -> Deduplicator {
        Deduplicator::new(Arc::new(DedupStore::new()))
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeat_within_window_suppressed_then_allowed() {
        let dedup = dedup();
        let chan = Destination::channel("#mtg");

        assert_eq!(dedup.check(&chan, CARD), DedupDecision::Send);
        assert_eq!(
            dedup.check(&chan, CARD),
            DedupDecision::Suppress {
                preview: "Lightning Bolt {R} Inst".to_string()
            }
        );

        tokio::time::advance(DEFAULT_DEDUP_WINDOW + Duration::from_millis(1)).await;
        assert_eq!(dedup.check(&chan, CARD), DedupDecision::Send);
        assert!(matches!(dedup.check(&chan, CARD), DedupDecision::Suppress { .. }));
    }

    #[test]
    fn test_not_found_replies_exempt() {
        let dedup = dedup();
        let chan = Destination::channel("#mtg");
        let now = Instant::now();

        for _ in 0..3 {
            assert_eq!(
                dedup.check_at(&chan, "\"xyzzy\" not found.", now),
                DedupDecision::Send
            );
        }
        assert_eq!(dedup.check_at(&chan, "\"plugh\" not found.", now), DedupDecision::Send);
        assert!(dedup.store().is_empty());
    }

    #[test]
    fn test_private_destination_bypasses_store() {
        let dedup = dedup();
        let dm = Destination::private("alice");
        let now = Instant::now();

        for _ in 0..3 {
            assert_eq!(dedup.check_at(&dm, CARD, now), DedupDecision::Send);
        }
        assert_eq!(dedup.store().destination_count(), 0);
    }

    #[test]
    fn test_destinations_are_isolated() {
        let dedup = dedup();
        let now = Instant::now();

        assert_eq!(dedup.check_at(&Destination::channel("#a"), CARD, now), DedupDecision::Send);
        assert_eq!(dedup.check_at(&Destination::channel("#b"), CARD, now), DedupDecision::Send);
        assert_eq!(dedup.store().destination_count(), 2);
    }

    #[test]
    fn test_custom_exemption_and_preview() {
        let dedup = dedup().exempt(|text| text.starts_with("http")).preview_len(4);
        let chan = Destination::channel("#mtg");
        let now = Instant::now();

        assert_eq!(dedup.check_at(&chan, "https://example.org", now), DedupDecision::Send);
        assert_eq!(dedup.check_at(&chan, "https://example.org", now), DedupDecision::Send);

        assert_eq!(dedup.check_at(&chan, "Fog {G}", now), DedupDecision::Send);
        assert_eq!(
            dedup.check_at(&chan, "Fog {G}", now),
            DedupDecision::Suppress {
                preview: "Fog ".to_string()
            }
        );
    }

    #[test]
    fn test_sweep_removes_expired_entries_and_destinations() {
        let store = DedupStore::new();
        let now = Instant::now();
        let window = Duration::from_secs(30);

        store.check_and_record("#a", "one", now, window);
        store.check_and_record("#b", "two", now + Duration::from_secs(20), window);
        assert_eq!(store.len(), 2);

        assert_eq!(store.sweep(now + Duration::from_secs(31)), 1);
        assert_eq!(store.len(), 1);
        assert_eq!(store.destination_count(), 1);

        assert_eq!(store.sweep(now + Duration::from_secs(60)), 1);
        assert!(store.is_empty());
        assert_eq!(store.destination_count(), 0);
    }

    #[test]
    fn test_expired_entries_collected_on_lookup() {
        let store = DedupStore::new();
        let now = Instant::now();
        let window = Duration::from_secs(30);

        store.check_and_record("#a", "one", now, window);
        store.check_and_record("#a", "two", now + Duration::from_secs(40), window);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_checks_send_exactly_once() {
        let dedup = dedup();
        let chan = Destination::channel("#mtg");

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let dedup = dedup.clone();
                let chan = chan.clone();
                tokio::spawn(async move { dedup.check(&chan, CARD) })
            })
            .collect();

        let mut sent = 0;
        for handle in handles {
            if handle.await.unwrap() == DedupDecision::Send {
                sent += 1;
            }
        }
        assert_eq!(sent, 1);
    }

    #[test]
    fn test_exempt_phrases_case_insensitive() {
        let phrases = ExemptPhrases::new(["Not Found", ""]);
        assert!(phrases.matches("Card NOT FOUND"));
        assert!(!phrases.matches("Fog {G}"));
        assert!(ExemptPhrases::default().matches("No results for \"xyzzy\"."));
    }

    #[test]
    fn test_exempt_phrases_match_whole_words() {
        let phrases = ExemptPhrases::new(["error", "not found"]);
        assert!(phrases.matches("Lookup error, try again"));
        assert!(phrases.matches("\"xyzzy\" not found."));
        assert!(!phrases.matches("Terror {1}{B} Instant"));
        assert!(!phrases.matches("Reign of Terrorize"));
        assert!(!phrases.matches("cannot found"));
    }

    #[test]
    fn test_reply_containing_error_letters_is_suppressed() {
        let dedup = dedup();
        let chan = Destination::channel("#mtg");
        let now = Instant::now();
        let terror = "Terror {1}{B} Instant: Destroy target nonartifact, nonblack creature.";

        assert_eq!(dedup.check_at(&chan, terror, now), DedupDecision::Send);
        assert!(matches!(
            dedup.check_at(&chan, terror, now),
            DedupDecision::Suppress { .. }
        ));
    }
}
