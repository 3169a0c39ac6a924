//! Line-oriented transcript for `ask` and `repl`

use colored::*;
use std::io::Write;

use crate::state::ChatRole;
use crate::view::{TranscriptView, TypingId};

/// Prints bubbles as they arrive instead of keeping them
pub struct ConsoleView<W: Write> {
    out: W,
    muted: bool,
    echo_user: bool,
    next_typing_id: u64,
    typing_shown: Option<TypingId>,
}

impl<W: Write> ConsoleView<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            muted: false,
            echo_user: true,
            next_typing_id: 0,
            typing_shown: None,
        }
    }

    /// Suppress output until `set_muted(false)`
    pub fn muted(mut self) -> Self {
        self.muted = true;
        self
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    /// Don't repeat user input that is already on screen
    pub fn without_user_echo(mut self) -> Self {
        self.echo_user = false;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write(&mut self, text: &str) {
        if self.muted {
            return;
        }
        if let Err(e) = self.out.write_all(text.as_bytes()).and_then(|_| self.out.flush()) {
            tracing::debug!(error = %e, "Failed to write to console");
        }
    }
}

impl<W: Write> TranscriptView for ConsoleView<W> {
    fn append_message(&mut self, role: ChatRole, text: &str) {
        let line = match role {
            ChatRole::User if !self.echo_user => return,
            ChatRole::User => format!("{} {}\n\n", "You:".cyan().bold(), text),
            ChatRole::Assistant => format!("{} {}\n\n", "AI:".yellow().bold(), text),
        };
        self.write(&line);
    }

    fn show_typing(&mut self) -> TypingId {
        let id = TypingId::from_raw(self.next_typing_id);
        self.next_typing_id += 1;
        self.typing_shown = Some(id);
        self.write(&format!("{}", "Thinking...".dimmed().italic()));
        id
    }

    fn remove_typing(&mut self, id: TypingId) {
        if self.typing_shown == Some(id) {
            self.typing_shown = None;
            // Carriage return and erase the "Thinking..." line
            self.write("\r\x1b[2K");
        }
    }

    // stdin is only read between turns, so there is nothing to lock
    fn set_input_enabled(&mut self, _enabled: bool) {}

    fn clear(&mut self) {
        self.typing_shown = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(view: ConsoleView<Vec<u8>>) -> String {
        String::from_utf8(view.into_inner()).unwrap()
    }

    #[test]
    fn test_prints_messages_in_order() {
        let mut view = ConsoleView::new(Vec::new());
        view.append_message(ChatRole::User, "question");
        let id = view.show_typing();
        view.remove_typing(id);
        view.append_message(ChatRole::Assistant, "answer");

        let out = output(view);
        let q = out.find("question").unwrap();
        let a = out.find("answer").unwrap();
        assert!(q < a);
        assert!(out.contains("Thinking..."));
        assert!(out.contains("\r\x1b[2K"));
    }

    #[test]
    fn test_muted_writes_nothing() {
        let mut view = ConsoleView::new(Vec::new()).muted();
        view.append_message(ChatRole::Assistant, "greeting");
        view.set_muted(false);
        view.append_message(ChatRole::Assistant, "answer");

        let out = output(view);
        assert!(!out.contains("greeting"));
        assert!(out.contains("answer"));
    }

    #[test]
    fn test_without_user_echo_skips_user() {
        let mut view = ConsoleView::new(Vec::new()).without_user_echo();
        view.append_message(ChatRole::User, "typed already");

        assert!(output(view).is_empty());
    }

    #[test]
    fn test_stale_typing_id_ignored() {
        let mut view = ConsoleView::new(Vec::new());
        let first = view.show_typing();
        view.remove_typing(first);
        view.remove_typing(first);

        let out = output(view);
        assert_eq!(out.matches("\r\x1b[2K").count(), 1);
    }
}
