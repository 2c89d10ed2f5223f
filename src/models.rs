//! Core data types that flow between ingestion, retrieval and sessions.

use serde::{Deserialize, Serialize};

/// A bounded span of a page's text, embedded and retrieved independently.
///
/// Consecutive passages from the same page overlap; `char_start` locates
/// the passage inside its page so adjacency can be reconstructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passage {
    pub text: String,
    /// Zero-based page the passage was cut from.
    pub source_page: usize,
    /// Position of the passage within the whole document, starting at 0.
    pub sequence_position: usize,
    /// Character offset of the passage within its page text.
    pub char_start: usize,
}

impl Passage {
    /// Length in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Author of a chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One message in a session's chat history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}
