//! Rendering seam between the chat logic and whatever draws it

use crate::state::{ChatMessage, ChatRole};

/// Handle for a typing placeholder, returned by [`TranscriptView::show_typing`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypingId(u64);

impl TypingId {
    /// For views that hand out their own ids
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

/// Everything the widget needs from a front end
pub trait TranscriptView {
    fn append_message(&mut self, role: ChatRole, text: &str);

    fn show_typing(&mut self) -> TypingId;

    /// Remove only the placeholder `id`; unknown ids are ignored
    fn remove_typing(&mut self, id: TypingId);

    fn set_input_enabled(&mut self, enabled: bool);

    fn clear(&mut self);
}

/// One visible entry in the transcript
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bubble {
    Message(ChatMessage),
    Typing(TypingId),
}

impl Bubble {
    pub fn message(&self) -> Option<&ChatMessage> {
        match self {
            Bubble::Message(msg) => Some(msg),
            Bubble::Typing(_) => None,
        }
    }
}

/// In-memory transcript; the TUI renders it each frame
#[derive(Debug, Clone)]
pub struct Transcript {
    bubbles: Vec<Bubble>,
    next_typing_id: u64,
    input_enabled: bool,
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

impl Transcript {
    pub fn new() -> Self {
        Self {
            bubbles: Vec::new(),
            next_typing_id: 0,
            input_enabled: true,
        }
    }

    pub fn bubbles(&self) -> &[Bubble] {
        &self.bubbles
    }

    /// Chat messages in display order, skipping placeholders
    pub fn messages(&self) -> impl Iterator<Item = &ChatMessage> {
        self.bubbles.iter().filter_map(Bubble::message)
    }

    pub fn is_typing(&self) -> bool {
        self.bubbles.iter().any(|b| matches!(b, Bubble::Typing(_)))
    }

    pub fn is_input_enabled(&self) -> bool {
        self.input_enabled
    }

    pub fn len(&self) -> usize {
        self.bubbles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bubbles.is_empty()
    }
}

impl TranscriptView for Transcript {
    fn append_message(&mut self, role: ChatRole, text: &str) {
        self.bubbles.push(Bubble::Message(ChatMessage {
            role,
            content: text.to_string(),
        }));
    }

    fn show_typing(&mut self) -> TypingId {
        let id = TypingId::from_raw(self.next_typing_id);
        self.next_typing_id += 1;
        self.bubbles.push(Bubble::Typing(id));
        id
    }

    fn remove_typing(&mut self, id: TypingId) {
        self.bubbles.retain(|b| *b != Bubble::Typing(id));
    }

    fn set_input_enabled(&mut self, enabled: bool) {
        self.input_enabled = enabled;
    }

    fn clear(&mut self) {
        self.bubbles.clear();
    }
}
