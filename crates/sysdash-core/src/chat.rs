//! Chat transcript entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Author of a chat entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// Typed locally and sent to the backend.
    User,
    /// Reply received from the backend.
    Assistant,
}

impl std::fmt::Display for ChatRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

/// One immutable transcript entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatEntry {
    role: ChatRole,
    content: String,
    created_at: DateTime<Utc>,
}

impl ChatEntry {
    pub fn new(role: ChatRole, content: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            role,
            content: content.into(),
            created_at,
        }
    }

    /// Entry typed by the local user, stamped now.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content, Utc::now())
    }

    /// Entry received from the backend.
    pub fn assistant(content: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self::new(ChatRole::Assistant, content, created_at)
    }

    pub fn role(&self) -> ChatRole {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
