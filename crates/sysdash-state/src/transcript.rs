//! Append-only chat transcript.

use chrono::{DateTime, Utc};
use sysdash_core::ChatEntry;
use tracing::debug;

/// Ordered log of the session's chat exchanges.
///
/// Entries are never reordered, deduplicated or evicted; the transcript
/// lives as long as the interactive session.
#[derive(Debug, Default, Clone)]
pub struct ChatTranscript {
    entries: Vec<ChatEntry>,
}

impl ChatTranscript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transcript seeded with an assistant greeting. An empty greeting seeds
    /// nothing.
    pub fn with_greeting(greeting: &str) -> Self {
        let mut transcript = Self::new();
        if !greeting.trim().is_empty() {
            transcript.append_remote(greeting, Utc::now());
        }
        transcript
    }

    /// Append a user entry. Empty or whitespace-only text is rejected.
    ///
    /// Returns whether an entry was appended.
    pub fn append_local(&mut self, text: &str) -> bool {
        if text.trim().is_empty() {
            debug!("Rejected empty chat message");
            return false;
        }
        self.entries.push(ChatEntry::user(text));
        true
    }

    /// Append an assistant entry.
    pub fn append_remote(&mut self, text: impl Into<String>, timestamp: DateTime<Utc>) {
        self.entries.push(ChatEntry::assistant(text, timestamp));
    }

    pub fn all(&self) -> &[ChatEntry] {
        &self.entries
    }

    pub fn last(&self) -> Option<&ChatEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
