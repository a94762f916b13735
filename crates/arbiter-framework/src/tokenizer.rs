//! Command extraction from raw chat lines.
//!
//! The [`Tokenizer`] turns one raw message into an ordered list of
//! [`Candidate`]s. It recognizes two command forms:
//!
//! - **Marker commands**: `!bolt`, `&tarmogoyf`, `!"Fire // Ice"`. A marker
//!   only starts a command at the beginning of the line or after whitespace or
//!   an opening bracket; `Hello!` is punctuation, not a command.
//! - **Bracket commands**: `[[Lightning Bolt]]`, anywhere in the line.
//!
//! In private conversations a line without any marker is treated as a single
//! command.
//!
//! Scanning produces raw captures; each capture then passes through a set of
//! named filters ([`is_pure_punctuation`], [`is_degenerate_marker`],
//! [`is_sentence_punctuation`], [`is_quoted_empty`]) and normalization.
//! Nothing here errors: malformed input just yields fewer candidates.
//!
//! ```rust,ignore
//! use arbiter_framework::Tokenizer;
//!
//! let tokenizer = Tokenizer::new();
//! let candidates = tokenizer.tokenize("[[Foo]] and !bar", true);
//! assert_eq!(candidates[0].text(), "Foo");
//! assert_eq!(candidates[1].text(), "bar");
//! ```

use arbiter_core::Candidate;

/// Characters that introduce a marker command.
pub const MARKERS: [char; 2] = ['!', '&'];

/// Default maximum candidate length, in characters.
pub const DEFAULT_MAX_CANDIDATE_LEN: usize = 41;

/// Default keyword that forces a literal name lookup (`!name help`).
pub const DEFAULT_LITERAL_KEYWORD: &str = "name";

const BRACKET_OPEN: &str = "[[";
const BRACKET_CLOSE: &str = "]]";
const QUOTES: [char; 3] = ['"', '\'', '`'];
const WRAPPERS: [(char, char); 7] = [
    ('"', '"'),
    ('\'', '\''),
    ('`', '`'),
    ('(', ')'),
    ('[', ']'),
    ('{', '}'),
    ('<', '>'),
];
const TRAILING_PUNCTUATION: [char; 5] = ['.', ',', ';', ':', '!'];

// ============================================================================
// Raw captures
// ============================================================================

/// An unfiltered capture found by the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Capture<'a> {
    /// Text following a marker character at byte offset `pos`.
    Marker { pos: usize, body: &'a str },
    /// Text between `[[` and `]]`.
    Bracket { body: &'a str },
    /// The whole line, for unmarked private messages.
    Whole { body: &'a str },
}

// ============================================================================
// Tokenizer
// ============================================================================

/// Extracts normalized command candidates from raw chat text.
///
/// `Tokenizer` holds only configuration; [`tokenize`](Self::tokenize) is pure.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    max_len: usize,
    literal_keyword: Option<String>,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer {
    /// Creates a tokenizer with default limits.
    pub fn new() -> Self {
        Self {
            max_len: DEFAULT_MAX_CANDIDATE_LEN,
            literal_keyword: Some(DEFAULT_LITERAL_KEYWORD.to_string()),
        }
    }

    /// Sets the maximum candidate length in characters.
    pub fn max_len(mut self, max_len: usize) -> Self {
        self.max_len = max_len;
        self
    }

    /// Sets (or disables, with `None`) the literal lookup keyword.
    pub fn literal_keyword(mut self, keyword: Option<impl Into<String>>) -> Self {
        self.literal_keyword = keyword.map(Into::into);
        self
    }

    /// Returns the configured maximum candidate length.
    pub fn get_max_len(&self) -> usize {
        self.max_len
    }

    /// Tokenizes one raw message.
    ///
    /// `requires_marker` is `false` for contexts (private messages) where an
    /// unmarked line is itself a command.
    pub fn tokenize(&self, text: &str, requires_marker: bool) -> Vec<Candidate> {
        let captures = if !requires_marker && !has_marker(text) {
            vec![Capture::Whole { body: text }]
        } else {
            scan(text)
        };

        captures
            .into_iter()
            .filter_map(|capture| self.normalize(text, capture))
            .enumerate()
            .map(|(index, (body, literal))| Candidate::new(index, body).literal(literal))
            .collect()
    }

    /// Applies filters and normalization to one capture.
    fn normalize(&self, source: &str, capture: Capture<'_>) -> Option<(String, bool)> {
        let body = match capture {
            Capture::Marker { pos, body } => {
                if is_sentence_punctuation(source, pos) || is_degenerate_marker(body) {
                    return None;
                }
                body
            }
            Capture::Bracket { body } | Capture::Whole { body } => body,
        };

        let body = body.trim().trim_end_matches(TRAILING_PUNCTUATION).trim_end();
        if is_quoted_empty(body) {
            return None;
        }

        let body = unwrap_once(body).trim();
        let (body, literal) = self.strip_literal_keyword(body);
        let body = truncate_chars(body, self.max_len).trim_end();

        if is_pure_punctuation(body) {
            return None;
        }
        Some((body.to_string(), literal))
    }

    fn strip_literal_keyword<'a>(&self, body: &'a str) -> (&'a str, bool) {
        let Some(keyword) = self.literal_keyword.as_deref() else {
            return (body, false);
        };
        let Some(head) = body.get(..keyword.len()) else {
            return (body, false);
        };
        let rest = &body[keyword.len()..];
        if head.eq_ignore_ascii_case(keyword) && rest.starts_with(char::is_whitespace) {
            (rest.trim_start(), true)
        } else {
            (body, false)
        }
    }
}

// ============================================================================
// Scanner
// ============================================================================

/// Whether the text contains anything that could start a command.
fn has_marker(text: &str) -> bool {
    text.contains(MARKERS)
        || text
            .find(BRACKET_OPEN)
            .is_some_and(|pos| opens_bracket_pair(text, pos))
}

/// Whether a complete `[[...]]` pair starts at byte offset `pos`.
fn opens_bracket_pair(text: &str, pos: usize) -> bool {
    text[pos..].starts_with(BRACKET_OPEN)
        && text[pos + BRACKET_OPEN.len()..].contains(BRACKET_CLOSE)
}

/// Collects raw captures in order of appearance.
fn scan(text: &str) -> Vec<Capture<'_>> {
    let mut captures = Vec::new();
    let mut pos = 0;

    while let Some(ch) = text[pos..].chars().next() {
        if opens_bracket_pair(text, pos) {
            let start = pos + BRACKET_OPEN.len();
            // `opens_bracket_pair` guarantees the close exists.
            let len = text[start..].find(BRACKET_CLOSE).unwrap_or(text.len() - start);
            captures.push(Capture::Bracket {
                body: &text[start..start + len],
            });
            pos = (start + len + BRACKET_CLOSE.len()).min(text.len());
            continue;
        }

        if MARKERS.contains(&ch) {
            let start = pos + ch.len_utf8();
            let wrapper = text[..pos].chars().next_back().and_then(bracket_pair);
            let end = command_end(text, start, wrapper);
            captures.push(Capture::Marker {
                pos,
                body: &text[start..end],
            });
            pos = end;
            continue;
        }

        pos += ch.len_utf8();
    }

    captures
}

/// Finds where a marker command that begins at byte offset `start` ends.
///
/// A quoted body runs to its closing quote. A command written inside
/// brackets, as in `(!bolt)`, stops at the matching closer. Otherwise the
/// body stops at the next command start, a `?`, a line break, or the end of
/// the text.
fn command_end(text: &str, start: usize, wrapper: Option<(char, char)>) -> usize {
    let rest = &text[start..];

    if let Some(quote) = rest.chars().next().filter(|c| QUOTES.contains(c))
        && let Some(close) = closing_quote(rest, quote)
    {
        return start + close + quote.len_utf8();
    }

    let mut depth = 0usize;
    for (offset, ch) in rest.char_indices() {
        let pos = start + offset;
        if ch == '\n' || ch == '?' || opens_bracket_pair(text, pos) {
            return pos;
        }
        if let Some((open, close)) = wrapper {
            if ch == open {
                depth += 1;
            } else if ch == close {
                if depth == 0 {
                    return pos;
                }
                depth -= 1;
            }
        }
        if MARKERS.contains(&ch) && !is_sentence_punctuation(text, pos) {
            return pos;
        }
    }

    text.len()
}

/// Finds the byte offset in `rest` of the quote closing its opening `quote`.
///
/// A closing quote must be followed by whitespace, punctuation or the end of
/// the text; apostrophes inside names (`'Urza's Saga'`) are skipped.
fn closing_quote(rest: &str, quote: char) -> Option<usize> {
    let open = quote.len_utf8();
    rest[open..]
        .match_indices(quote)
        .map(|(offset, _)| open + offset)
        .find(|&pos| {
            rest[pos + quote.len_utf8()..]
                .chars()
                .next()
                .is_none_or(ends_quoted_body)
        })
}

fn ends_quoted_body(ch: char) -> bool {
    ch.is_whitespace()
        || ch == '?'
        || TRAILING_PUNCTUATION.contains(&ch)
        || matches!(ch, ')' | ']' | '}' | '>')
}

/// Returns the bracket pair opened by `ch`, if any.
fn bracket_pair(ch: char) -> Option<(char, char)> {
    match ch {
        '(' => Some(('(', ')')),
        '[' => Some(('[', ']')),
        '{' => Some(('{', '}')),
        _ => None,
    }
}

// ============================================================================
// Filters
// ============================================================================

/// Rejects captures made only of punctuation, symbols and whitespace.
pub fn is_pure_punctuation(body: &str) -> bool {
    !body.chars().any(char::is_alphanumeric)
}

/// Rejects a marker followed directly by whitespace or the end of the line
/// (`"! bolt"`, `"rock & roll"`).
pub fn is_degenerate_marker(body: &str) -> bool {
    body.chars().next().is_none_or(char::is_whitespace)
}

/// Rejects a marker glued to the end of a word, as in `"Hello!"` or `"Q&A"`.
///
/// `pos` is the byte offset of the marker in `source`. A marker starts a
/// command only at the start of the line or after whitespace or an opening
/// bracket.
pub fn is_sentence_punctuation(source: &str, pos: usize) -> bool {
    source[..pos]
        .chars()
        .next_back()
        .is_some_and(|prev| !(prev.is_whitespace() || matches!(prev, '(' | '[' | '{')))
}

/// Rejects quoted-empty forms such as `""`, `''` and `" "`.
pub fn is_quoted_empty(body: &str) -> bool {
    let mut chars = body.chars();
    match (chars.next(), chars.next_back()) {
        (Some(open), Some(close)) if open == close && QUOTES.contains(&open) => {
            chars.as_str().trim().is_empty()
        }
        _ => false,
    }
}

// ============================================================================
// Normalization helpers
// ============================================================================

/// Removes one layer of matching quote or bracket punctuation.
fn unwrap_once(body: &str) -> &str {
    let mut chars = body.chars();
    let (Some(first), Some(last)) = (chars.next(), chars.next_back()) else {
        return body;
    };
    if WRAPPERS.iter().any(|&(open, close)| first == open && last == close) {
        chars.as_str()
    } else {
        body
    }
}

/// Truncates to at most `max` characters on a char boundary.
pub(crate) fn truncate_chars(body: &str, max: usize) -> &str {
    match body.char_indices().nth(max) {
        Some((byte, _)) => &body[..byte],
        None => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(candidates: &[Candidate]) -> Vec<&str> {
        candidates.iter().map(Candidate::text).collect()
    }

    fn channel(text: &str) -> Vec<Candidate> {
        Tokenizer::new().tokenize(text, true)
    }

    #[test]
    fn test_two_marker_commands() {
        assert_eq!(texts(&channel("!alpha !beta")), vec!["alpha", "beta"]);
    }

    #[test]
    fn test_sentence_exclamation_yields_nothing() {
        assert!(channel("Hello!").is_empty());
        assert!(Tokenizer::new().tokenize("Hello!", false).is_empty());
    }

    #[test]
    fn test_bracket_pairs() {
        assert_eq!(texts(&channel("[[Foo]] [[Bar]]")), vec!["Foo", "Bar"]);
    }

    #[test]
    fn test_mixed_forms_keep_source_order() {
        let candidates = channel("try [[Fog]] or !bolt &ancestral");
        assert_eq!(texts(&candidates), vec!["Fog", "bolt", "ancestral"]);
        let indices: Vec<usize> = candidates.iter().map(Candidate::index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_comma_stays_inside_command() {
        assert_eq!(
            texts(&channel("!Jace, the Mind Sculptor")),
            vec!["Jace, the Mind Sculptor"]
        );
    }

    #[test]
    fn test_multi_word_command_stops_at_question_mark() {
        assert_eq!(
            texts(&channel("what does !lightning bolt do? thanks")),
            vec!["lightning bolt do"]
        );
    }

    #[test]
    fn test_quoted_command_runs_to_closing_quote() {
        assert_eq!(
            texts(&channel(r#"!"Fire // Ice" is great"#)),
            vec!["Fire // Ice"]
        );
    }

    #[test]
    fn test_degenerate_and_punctuation_candidates_dropped() {
        assert!(channel("! bolt").is_empty());
        assert!(channel("rock & roll").is_empty());
        assert!(channel("!!!").is_empty());
        assert!(channel("!?").is_empty());
        assert!(channel(r#"!"""#).is_empty());
        assert!(channel(r#"[[""]]"#).is_empty());
    }

    #[test]
    fn test_glued_marker_inside_word_ignored() {
        assert!(channel("Q&A at https://example.com/?a=1&b=2").is_empty());
        assert_eq!(texts(&channel("wow! !bolt")), vec!["bolt"]);
    }

    #[test]
    fn test_unterminated_bracket_ignored() {
        assert!(channel("[[Foo").is_empty());
        assert_eq!(texts(&channel("[[Foo !bar")), vec!["bar"]);
    }

    #[test]
    fn test_private_unmarked_line_is_one_candidate() {
        let candidates = Tokenizer::new().tokenize("lightning bolt", false);
        assert_eq!(texts(&candidates), vec!["lightning bolt"]);
    }

    #[test]
    fn test_private_marked_line_is_scanned() {
        let candidates = Tokenizer::new().tokenize("!bolt !fog", false);
        assert_eq!(texts(&candidates), vec!["bolt", "fog"]);
    }

    #[test]
    fn test_channel_unmarked_line_yields_nothing() {
        assert!(channel("lightning bolt").is_empty());
    }

    #[test]
    fn test_unwraps_single_layer() {
        assert_eq!(texts(&channel("!(bolt)")), vec!["bolt"]);
        assert_eq!(texts(&channel("!<<bolt>>")), vec!["<bolt>"]);
        assert_eq!(texts(&channel("[['Fog']]")), vec!["Fog"]);
    }

    #[test]
    fn test_trailing_punctuation_trimmed() {
        assert_eq!(texts(&channel("I love !bolt.")), vec!["bolt"]);
        assert_eq!(texts(&channel("!rule 601.2a.")), vec!["rule 601.2a"]);
    }

    #[test]
    fn test_literal_keyword_stripped() {
        let candidates = channel("!name Help");
        assert_eq!(texts(&candidates), vec!["Help"]);
        assert!(candidates[0].is_literal());

        let candidates = channel("!NAME help");
        assert!(candidates[0].is_literal());

        let candidates = channel("!names");
        assert_eq!(texts(&candidates), vec!["names"]);
        assert!(!candidates[0].is_literal());
    }

    #[test]
    fn test_literal_keyword_disabled() {
        let tokenizer = Tokenizer::new().literal_keyword(None::<String>);
        let candidates = tokenizer.tokenize("!name Help", true);
        assert_eq!(texts(&candidates), vec!["name Help"]);
        assert!(!candidates[0].is_literal());
    }

    #[test]
    fn test_long_candidate_truncated() {
        let long = format!("!{}", "a".repeat(100));
        let candidates = channel(&long);
        assert_eq!(candidates[0].text().chars().count(), DEFAULT_MAX_CANDIDATE_LEN);

        let candidates = Tokenizer::new().max_len(5).tokenize("!abc defgh", true);
        assert_eq!(texts(&candidates), vec!["abc d"]);
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        let candidates = Tokenizer::new().max_len(3).tokenize("!Æther Vial", true);
        assert_eq!(texts(&candidates), vec!["Æth"]);
    }

    #[test]
    fn test_tokenize_is_idempotent() {
        let tokenizer = Tokenizer::new();
        let line = "[[Foo]] !bar baz? &\"qux\" Hello!";
        assert_eq!(tokenizer.tokenize(line, true), tokenizer.tokenize(line, true));
    }

    #[test]
    fn test_bracketed_command_stops_at_closer() {
        assert_eq!(texts(&channel("(!bolt)")), vec!["bolt"]);
        assert_eq!(
            texts(&channel("see (!lightning bolt) for details")),
            vec!["lightning bolt"]
        );
        assert_eq!(texts(&channel("[&fog], {!counterspell}")), vec!["fog", "counterspell"]);
        assert_eq!(texts(&channel("(!Fire (Ice))")), vec!["Fire (Ice)"]);
    }

    #[test]
    fn test_apostrophe_inside_quoted_name() {
        assert_eq!(texts(&channel("!'Urza's Saga'")), vec!["Urza's Saga"]);
        assert_eq!(
            texts(&channel("!'Urza's Saga' or !fog")),
            vec!["Urza's Saga", "fog"]
        );
        assert_eq!(texts(&channel("(!'Urza's Saga')")), vec!["Urza's Saga"]);
    }

    #[test]
    fn test_filter_predicates() {
        assert!(is_pure_punctuation("?!."));
        assert!(is_pure_punctuation("   "));
        assert!(!is_pure_punctuation("a."));

        assert!(is_degenerate_marker(""));
        assert!(is_degenerate_marker(" bolt"));
        assert!(!is_degenerate_marker("bolt"));

        assert!(is_sentence_punctuation("Hello!", 5));
        assert!(!is_sentence_punctuation("!bolt", 0));
        assert!(!is_sentence_punctuation("see !bolt", 4));
        assert!(!is_sentence_punctuation("(!bolt)", 1));

        assert!(is_quoted_empty("\"\""));
        assert!(is_quoted_empty("' '"));
        assert!(!is_quoted_empty("\"bolt\""));
        assert!(!is_quoted_empty("\""));
    }
}
