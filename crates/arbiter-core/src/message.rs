//! Message types shared by every stage of the router.
//!
//! - [`Destination`]: where a message came from and where replies go
//! - [`InboundMessage`]: one raw line of chat text from a transport
//! - [`Candidate`]: one normalized lookup request extracted from that line

use std::fmt;

// ============================================================================
// Destination
// ============================================================================

/// Whether a destination is a shared channel or a one-to-one conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DestinationKind {
    /// A public channel (IRC channel, Slack channel, ...).
    Channel,
    /// A private conversation with a single user.
    Private,
}

/// A chat destination that replies are delivered to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Destination {
    id: String,
    kind: DestinationKind,
}

impl Destination {
    /// Creates a public channel destination.
    pub fn channel(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: DestinationKind::Channel,
        }
    }

    /// Creates a private conversation destination.
    pub fn private(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: DestinationKind::Private,
        }
    }

    /// Returns the transport-level identifier (channel name, nick, ...).
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the destination kind.
    pub fn kind(&self) -> DestinationKind {
        self.kind
    }

    /// Returns `true` for private conversations.
    pub fn is_private(&self) -> bool {
        self.kind == DestinationKind::Private
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

// ============================================================================
// InboundMessage
// ============================================================================

/// A raw line of text received from a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Where the line was said, and where replies go.
    pub destination: Destination,
    /// Display name of the user who said it.
    pub sender: String,
    /// The raw text.
    pub text: String,
}

impl InboundMessage {
    /// Creates a new inbound message.
    pub fn new(
        destination: Destination,
        sender: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            destination,
            sender: sender.into(),
            text: text.into(),
        }
    }

    /// Whether the transport needs an explicit command marker for this message.
    ///
    /// Private conversations treat an unmarked line as a single command.
    pub fn requires_marker(&self) -> bool {
        !self.destination.is_private()
    }
}

// ============================================================================
// Candidate
// ============================================================================

/// A normalized command substring extracted from a raw line.
///
/// Candidates are immutable once produced by the tokenizer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Candidate {
    index: usize,
    text: String,
    literal: bool,
}

impl Candidate {
    /// Creates a candidate at position `index` of its message.
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
            literal: false,
        }
    }

    /// Marks the candidate as a literal name lookup.
    ///
    /// Literal candidates bypass keyword routes and always reach the
    /// default resolver.
    pub fn literal(mut self, literal: bool) -> Self {
        self.literal = literal;
        self
    }

    /// Position of this candidate in the original message.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The normalized command text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether the disambiguation keyword was present.
    pub fn is_literal(&self) -> bool {
        self.literal
    }

    /// Consumes the candidate, returning its text.
    pub fn into_text(self) -> String {
        self.text
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_private_destination_skips_marker() {
        let msg = InboundMessage::new(Destination::private("alice"), "alice", "bolt");
        assert!(!msg.requires_marker());

        let msg = InboundMessage::new(Destination::channel("#mtg"), "alice", "!bolt");
        assert!(msg.requires_marker());
    }

    #[test]
    fn test_candidate_literal_flag() {
        let c = Candidate::new(0, "Help").literal(true);
        assert!(c.is_literal());
        assert_eq!(c.text(), "Help");
        assert_eq!(c.to_string(), "Help");
    }
}
