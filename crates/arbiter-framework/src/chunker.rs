//! Word wrapping of replies into transport-safe physical lines.
//!
//! Chat transports cap the length of a single line. The [`Chunker`] splits a
//! reply on its own line breaks, wraps each semantic line at word
//! boundaries, and puts the addressing prefix (`"alice: "`) in front of the
//! first physical line only.
//!
//! ```rust,ignore
//! let lines = Chunker::new().width(20).chunk("the quick brown fox jumps", "bob: ");
//! // ["bob: the quick ...", "brown fox jumps"]
//! ```
//!
//! All lengths are counted in characters.

use tracing::trace;

/// Default maximum physical line width.
pub const DEFAULT_LINE_WIDTH: usize = 390;

/// Default marker appended to a line that was wrapped.
pub const DEFAULT_CONTINUATION: &str = " ...";

/// Wraps replies into physical lines.
#[derive(Debug, Clone)]
pub struct Chunker {
    width: usize,
    continuation: String,
}

impl Default for Chunker {
    fn default() -> Self {
        Self::new()
    }
}

impl Chunker {
    /// Creates a chunker with the default width and continuation marker.
    pub fn new() -> Self {
        Self {
            width: DEFAULT_LINE_WIDTH,
            continuation: DEFAULT_CONTINUATION.to_string(),
        }
    }

    /// Sets the maximum physical line width.
    pub fn width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }

    /// Sets the continuation marker.
    pub fn continuation(mut self, marker: impl Into<String>) -> Self {
        self.continuation = marker.into();
        self
    }

    /// Returns the configured width.
    pub fn get_width(&self) -> usize {
        self.width
    }

    /// Splits `reply` into physical lines.
    ///
    /// The first line is budgeted `width - prefix` characters and starts with
    /// `prefix`; later lines get the full width and no prefix. A word longer
    /// than its line budget is placed on a line of its own.
    pub fn chunk(&self, reply: &str, prefix: &str) -> Vec<String> {
        let prefix_len = prefix.chars().count();
        let mut lines = Vec::new();

        for semantic in reply.split('\n').map(str::trim) {
            if semantic.is_empty() {
                continue;
            }
            self.wrap(semantic, prefix_len, &mut lines);
        }

        if let Some(first) = lines.first_mut() {
            first.insert_str(0, prefix);
        }
        trace!(count = lines.len(), width = self.width, "Chunked reply");
        lines
    }

    /// Wraps one non-empty semantic line, appending to `out`.
    fn wrap(&self, semantic: &str, prefix_len: usize, out: &mut Vec<String>) {
        let words: Vec<(&str, usize)> = semantic
            .split_whitespace()
            .map(|w| (w, w.chars().count()))
            .collect();

        // rest[i]: length of words[i..] joined by single spaces.
        let mut rest = vec![0; words.len() + 1];
        for i in (0..words.len()).rev() {
            let sep = usize::from(i + 1 < words.len());
            rest[i] = words[i].1 + sep + rest[i + 1];
        }

        let marker_len = self.continuation.chars().count();
        let mut line = String::new();
        let mut line_len = 0;

        for (i, &(word, word_len)) in words.iter().enumerate() {
            let budget = if out.is_empty() {
                self.width.saturating_sub(prefix_len)
            } else {
                self.width
            };

            if line.is_empty() {
                line.push_str(word);
                line_len = word_len;
                continue;
            }

            let needed = line_len + 1 + word_len;
            let rest_fits = line_len + 1 + rest[i] <= budget;
            if rest_fits || needed + marker_len <= budget {
                line.push(' ');
                line.push_str(word);
                line_len = needed;
                continue;
            }

            if line_len + marker_len <= budget {
                line.push_str(&self.continuation);
            }
            out.push(std::mem::take(&mut line));
            line.push_str(word);
            line_len = word_len;
        }

        if !line.is_empty() {
            out.push(line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FOX: &str = "the quick brown fox jumps over the lazy dog";

    fn width(width: usize) -> Chunker {
        Chunker::new().width(width)
    }

    #[test]
    fn test_short_reply_single_line_with_prefix() {
        assert_eq!(Chunker::new().chunk("Fog {G}", "bob: "), vec!["bob: Fog {G}"]);
    }

    #[test]
    fn test_wraps_at_word_boundaries() {
        assert_eq!(
            width(20).chunk(FOX, ""),
            vec!["the quick brown ...", "fox jumps over ...", "the lazy dog"]
        );
    }

    #[test]
    fn test_prefix_only_on_first_line() {
        let lines = width(20).chunk(FOX, "alice: ");
        assert_eq!(
            lines,
            vec!["alice: the quick ...", "brown fox jumps ...", "over the lazy dog"]
        );
        assert!(lines.iter().all(|l| l.chars().count() <= 20));
        assert!(lines[1..].iter().all(|l| !l.starts_with("alice: ")));
    }

    #[test]
    fn test_never_splits_words() {
        let lines = width(12).chunk(FOX, "");
        let words: Vec<&str> = lines
            .iter()
            .flat_map(|l| l.split_whitespace())
            .filter(|w| *w != "...")
            .collect();
        assert_eq!(words, FOX.split_whitespace().collect::<Vec<_>>());
    }

    #[test]
    fn test_semantic_lines_wrapped_independently() {
        let reply = "Fog {G}\n\n   \nInstant\nPrevent all combat damage.";
        assert_eq!(
            width(40).chunk(reply, "bob: "),
            vec!["bob: Fog {G}", "Instant", "Prevent all combat damage."]
        );
    }

    #[test]
    fn test_overlong_word_on_its_own_line() {
        assert_eq!(
            width(10).chunk("a supercalifragilistic b", ""),
            vec!["a ...", "supercalifragilistic", "b"]
        );
    }

    #[test]
    fn test_width_counts_characters() {
        assert_eq!(width(8).chunk("ééé ééé", ""), vec!["ééé ééé"]);
    }

    #[test]
    fn test_blank_reply_yields_nothing() {
        assert!(Chunker::new().chunk(" \n \n", "bob: ").is_empty());
    }

    #[test]
    fn test_custom_continuation() {
        assert_eq!(
            width(12).continuation(" >").chunk("one two three", ""),
            vec!["one two >", "three"]
        );
    }

    #[test]
    fn test_deterministic() {
        let chunker = width(17);
        assert_eq!(chunker.chunk(FOX, "x: "), chunker.chunk(FOX, "x: "));
    }
}
