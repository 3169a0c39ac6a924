//! UI-agnostic conversation state
//!
//! These types are shared by every front end (TUI, console) and by the chat
//! backends, and don't depend on any rendering framework.

use serde::{Deserialize, Serialize};

/// A single turn in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
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

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// History sent back to the backend plus the in-flight flag.
///
/// History is append-only between resets and only ever grows by a
/// question/answer pair, so it never holds an orphaned user turn.
#[derive(Debug, Default, Clone)]
pub struct ConversationState {
    history: Vec<ChatMessage>,
    awaiting_response: bool,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn is_awaiting_response(&self) -> bool {
        self.awaiting_response
    }

    pub(crate) fn set_awaiting_response(&mut self, awaiting: bool) {
        self.awaiting_response = awaiting;
    }

    /// Record a completed turn
    pub(crate) fn push_turn(&mut self, question: &str, answer: &str) {
        self.history.push(ChatMessage::user(question));
        self.history.push(ChatMessage::assistant(answer));
    }

    pub(crate) fn clear(&mut self) {
        self.history.clear();
        self.awaiting_response = false;
    }
}
