use ratatui::widgets::{Paragraph, Wrap};
use tokio::task::JoinHandle;

use crate::error::ChatError;
use crate::state::ChatRole;
use crate::ui;
use crate::view::Transcript;
use crate::widget::{ChatWidget, PendingTurn, QUICK_QUESTIONS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

/// The spawned network call and the turn it answers
pub struct QueryTask {
    pending: PendingTurn,
    handle: JoinHandle<Result<String, ChatError>>,
}

pub struct App {
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub show_help: bool,

    // Input box
    pub input: String,
    pub cursor: usize, // cursor position in chars

    // Chat pane
    pub chat_scroll: u16,
    pub chat_height: u16, // inner height, set by the renderer
    pub chat_width: u16,  // inner width, set by the renderer
    pub animation_frame: u8, // 0-2 for ellipsis animation

    pub widget: ChatWidget<Transcript>,
    pub query_task: Option<QueryTask>,
    pub backend_label: String,
}

impl App {
    pub fn new(widget: ChatWidget<Transcript>, backend_label: impl Into<String>) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Editing,
            show_help: false,

            input: String::new(),
            cursor: 0,

            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            animation_frame: 0,

            widget,
            query_task: None,
            backend_label: backend_label.into(),
        }
    }

    pub fn input_enabled(&self) -> bool {
        self.widget.view().is_input_enabled()
    }

    /// Send whatever is in the input box
    pub fn submit_input(&mut self) {
        if !self.input_enabled() {
            return;
        }
        let question = std::mem::take(&mut self.input);
        self.cursor = 0;
        self.submit(&question);
    }

    /// Quick question by 0-based index; out of range is ignored
    pub fn ask_quick(&mut self, idx: usize) {
        if let Some(question) = QUICK_QUESTIONS.get(idx) {
            if self.input_enabled() {
                self.input.clear();
                self.cursor = 0;
                self.submit(question);
            }
        }
    }

    fn submit(&mut self, question: &str) {
        if let Some(pending) = self.widget.begin(question) {
            let handle = tokio::spawn(self.widget.request(&pending));
            self.query_task = Some(QueryTask { pending, handle });
            self.scroll_chat_to_bottom();
        }
    }

    /// Apply the answer once the request task has finished
    pub async fn poll_query(&mut self) {
        let finished = self
            .query_task
            .as_ref()
            .map(|task| task.handle.is_finished())
            .unwrap_or(false);
        if !finished {
            return;
        }

        if let Some(QueryTask { pending, handle }) = self.query_task.take() {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => Err(ChatError::Interrupted(e.to_string())),
            };
            self.widget.complete(pending, result);
            self.scroll_chat_to_bottom();
        }
    }

    /// Drop any in-flight request and start over from the greeting
    pub fn reset_conversation(&mut self) {
        if let Some(task) = self.query_task.take() {
            task.handle.abort();
            tracing::info!("Aborted in-flight request on reset");
        }
        self.widget.reset();
        self.chat_scroll = 0;
        self.animation_frame = 0;
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.widget.is_awaiting_response() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        let max = self.total_chat_lines().saturating_sub(self.visible_height());
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(max);
    }

    /// Scroll so the newest bubble (or the typing indicator) is visible
    pub fn scroll_chat_to_bottom(&mut self) {
        let total_lines = self.total_chat_lines();
        let visible_height = self.visible_height();
        self.chat_scroll = total_lines.saturating_sub(visible_height);
    }

    fn visible_height(&self) -> u16 {
        if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        }
    }

    /// Line count of the rendered transcript after wrapping
    fn total_chat_lines(&self) -> u16 {
        // Default to 50 columns until the first frame is drawn
        let wrap_width = if self.chat_width > 0 { self.chat_width } else { 50 };

        let lines = ui::chat_lines(self.widget.view(), self.animation_frame);
        let total_lines = Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .line_count(wrap_width);

        total_lines.min(u16::MAX as usize) as u16
    }

    /// Number of user turns shown, for the header
    pub fn question_count(&self) -> usize {
        self.widget
            .view()
            .messages()
            .filter(|m| m.role == ChatRole::User)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::ChatBackend;
    use crate::provider::Provider;
    use crate::state::ChatMessage;
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::time::Duration;

    struct EchoBackend;

    #[async_trait]
    impl ChatBackend for EchoBackend {
        async fn send(&self, question: &str, _history: &[ChatMessage]) -> Result<String, ChatError> {
            Ok(format!("echo: {}", question))
        }

        fn provider(&self) -> Provider {
            Provider::Hosted
        }

        fn apology(&self) -> String {
            "sorry".to_string()
        }
    }

    fn app() -> App {
        let widget = ChatWidget::new(Arc::new(EchoBackend), Transcript::new(), "hello");
        App::new(widget, "test")
    }

    async fn wait_for_answer(app: &mut App) {
        for _ in 0..100 {
            app.poll_query().await;
            if app.query_task.is_none() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("request task never finished");
    }

    #[tokio::test]
    async fn test_submit_input_round_trip() {
        let mut app = app();
        app.input = "ping".to_string();
        app.cursor = 4;

        app.submit_input();
        assert!(app.input.is_empty());
        assert_eq!(app.cursor, 0);
        assert!(!app.input_enabled());

        wait_for_answer(&mut app).await;

        assert!(app.input_enabled());
        assert_eq!(
            app.widget.history(),
            &[ChatMessage::user("ping"), ChatMessage::assistant("echo: ping")]
        );
    }

    #[tokio::test]
    async fn test_quick_question_submits() {
        let mut app = app();
        app.ask_quick(0);
        wait_for_answer(&mut app).await;

        assert_eq!(app.widget.history()[0].content, QUICK_QUESTIONS[0]);
        assert_eq!(app.question_count(), 1);
    }

    #[tokio::test]
    async fn test_quick_question_out_of_range_ignored() {
        let mut app = app();
        app.ask_quick(QUICK_QUESTIONS.len());
        assert!(app.query_task.is_none());
        assert_eq!(app.question_count(), 0);
    }

    #[tokio::test]
    async fn test_reset_aborts_pending_request() {
        let mut app = app();
        app.input = "ping".to_string();
        app.submit_input();

        app.reset_conversation();

        assert!(app.query_task.is_none());
        assert!(app.input_enabled());
        assert!(app.widget.history().is_empty());
        assert_eq!(app.widget.view().len(), 1);
    }

    #[tokio::test]
    async fn test_scroll_to_bottom_counts_word_wrapped_lines() {
        let mut app = app();
        app.chat_width = 10;
        app.chat_height = 3;

        app.widget.submit("aaaaaa bbbbbb").await;
        app.scroll_chat_to_bottom();

        // greeting 3 + "You:"/2 wrapped/blank 4 + "AI:"/"echo:"/"aaaaaa"/"bbbbbb"/blank 5
        assert_eq!(app.chat_scroll, 12 - 3);
    }

    #[test]
    fn test_tick_only_animates_while_waiting() {
        let mut app = app();
        app.tick_animation();
        assert_eq!(app.animation_frame, 0);
    }

    #[test]
    fn test_scroll_down_clamped() {
        let mut app = app();
        app.chat_height = 10;
        app.chat_width = 40;
        app.scroll_down(50);
        // Greeting alone fits on screen
        assert_eq!(app.chat_scroll, 0);
    }
}
