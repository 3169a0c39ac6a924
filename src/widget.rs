//! The chat widget: one question at a time, optimistic user bubble, one
//! answer or one apology per accepted question.

use futures_util::future::{BoxFuture, FutureExt};
use std::sync::Arc;
use std::time::Duration;

use crate::ai::ChatBackend;
use crate::config::DEFAULT_TIMEOUT_SECS;
use crate::error::ChatError;
use crate::state::{ChatMessage, ChatRole, ConversationState};
use crate::view::{TranscriptView, TypingId};

/// Canned prompts offered next to the input box
pub const QUICK_QUESTIONS: [&str; 4] = [
    "What are your skills?",
    "Tell me about your work experience.",
    "What projects have you worked on?",
    "What is your educational background?",
];

/// A question that has been shown to the user and is waiting for an answer
#[derive(Debug)]
pub struct PendingTurn {
    question: String,
    history: Vec<ChatMessage>,
    typing: TypingId,
    generation: u64,
}

/// Call `backend`, giving up after `timeout`.
///
/// Dropping the backend future on expiry cancels the request.
pub async fn resolve(
    backend: &dyn ChatBackend,
    question: &str,
    history: &[ChatMessage],
    timeout: Duration,
) -> Result<String, ChatError> {
    match tokio::time::timeout(timeout, backend.send(question, history)).await {
        Ok(result) => result,
        Err(_) => Err(ChatError::Timeout(timeout)),
    }
}

pub struct ChatWidget<V: TranscriptView> {
    state: ConversationState,
    view: V,
    backend: Arc<dyn ChatBackend>,
    greeting: String,
    timeout: Duration,
    // Bumped by reset so answers to a cleared conversation are dropped
    generation: u64,
}

impl<V: TranscriptView> ChatWidget<V> {
    /// The view starts out showing just the greeting
    pub fn new(backend: Arc<dyn ChatBackend>, view: V, greeting: impl Into<String>) -> Self {
        let mut widget = Self {
            state: ConversationState::new(),
            view,
            backend,
            greeting: greeting.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            generation: 0,
        };
        widget.reset();
        widget
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn history(&self) -> &[ChatMessage] {
        self.state.history()
    }

    pub fn is_awaiting_response(&self) -> bool {
        self.state.is_awaiting_response()
    }

    /// Ask `question` and wait for the turn to finish
    pub async fn submit(&mut self, question: &str) {
        if let Some(pending) = self.begin(question) {
            let result = self.request(&pending).await;
            self.complete(pending, result);
        }
    }

    /// First half of `submit`: validate, show the user bubble, lock input.
    ///
    /// Returns `None` for blank input or while another request is in flight.
    pub fn begin(&mut self, question: &str) -> Option<PendingTurn> {
        let question = question.trim();
        if question.is_empty() {
            return None;
        }
        if self.state.is_awaiting_response() {
            tracing::debug!("Ignoring submission while a request is in flight");
            return None;
        }

        self.view.append_message(ChatRole::User, question);
        self.state.set_awaiting_response(true);
        self.view.set_input_enabled(false);
        let typing = self.view.show_typing();

        tracing::info!(
            provider = %self.backend.provider(),
            question_len = question.len(),
            "Submitting question"
        );

        Some(PendingTurn {
            question: question.to_string(),
            history: self.state.history().to_vec(),
            typing,
            generation: self.generation,
        })
    }

    /// Owned future for the network call, suitable for `tokio::spawn`
    pub fn request(&self, pending: &PendingTurn) -> BoxFuture<'static, Result<String, ChatError>> {
        let backend = Arc::clone(&self.backend);
        let question = pending.question.clone();
        let history = pending.history.clone();
        let timeout = self.timeout;

        async move { resolve(backend.as_ref(), &question, &history, timeout).await }.boxed()
    }

    /// Second half of `submit`: apply the outcome of `request`
    pub fn complete(&mut self, pending: PendingTurn, result: Result<String, ChatError>) {
        if pending.generation != self.generation {
            tracing::debug!("Discarding answer for a conversation that was reset");
            return;
        }

        match result {
            Ok(text) => self.on_success(pending, text),
            Err(error) => self.on_failure(pending, error),
        }
    }

    pub fn on_success(&mut self, pending: PendingTurn, text: String) {
        self.view.remove_typing(pending.typing);
        self.view.append_message(ChatRole::Assistant, &text);
        self.state.push_turn(&pending.question, &text);
        self.finish();

        tracing::info!(answer_len = text.len(), history_len = self.state.history().len(), "Answer received");
    }

    /// History is left alone so the same question can be asked again fresh
    pub fn on_failure(&mut self, pending: PendingTurn, error: ChatError) {
        let class = if error.is_transport() {
            "transport"
        } else {
            "malformed_response"
        };
        tracing::warn!(
            provider = %self.backend.provider(),
            class,
            kind = error.kind(),
            error = %error,
            "Chat request failed"
        );

        self.view.remove_typing(pending.typing);
        self.view
            .append_message(ChatRole::Assistant, &self.backend.apology());
        self.finish();
    }

    /// Empty history, transcript showing only the greeting
    pub fn reset(&mut self) {
        self.generation += 1;
        self.state.clear();
        self.view.clear();
        self.view.append_message(ChatRole::Assistant, &self.greeting);
        self.view.set_input_enabled(true);
    }

    fn finish(&mut self) {
        self.state.set_awaiting_response(false);
        self.view.set_input_enabled(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::GeminiClient;
    use crate::context::ContextDocument;
    use crate::provider::Provider;
    use crate::view::{Bubble, Transcript};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const GREETING: &str = "Hi there!";
    const APOLOGY: &str = "Sorry, something went wrong.";

    /// Replays canned results and records every call
    struct ScriptedBackend {
        replies: Mutex<Vec<Result<String, ChatError>>>,
        calls: Mutex<Vec<(String, Vec<ChatMessage>)>>,
    }

    impl ScriptedBackend {
        fn new(replies: Vec<Result<String, ChatError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into_iter().rev().collect()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<(String, Vec<ChatMessage>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatBackend for ScriptedBackend {
        async fn send(&self, question: &str, history: &[ChatMessage]) -> Result<String, ChatError> {
            self.calls
                .lock()
                .unwrap()
                .push((question.to_string(), history.to_vec()));
            self.replies
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(ChatError::malformed("no scripted reply")))
        }

        fn provider(&self) -> Provider {
            Provider::Hosted
        }

        fn apology(&self) -> String {
            APOLOGY.to_string()
        }
    }

    /// Never answers
    struct StalledBackend;

    #[async_trait]
    impl ChatBackend for StalledBackend {
        async fn send(&self, _question: &str, _history: &[ChatMessage]) -> Result<String, ChatError> {
            std::future::pending().await
        }

        fn provider(&self) -> Provider {
            Provider::Gemini
        }

        fn apology(&self) -> String {
            APOLOGY.to_string()
        }
    }

    fn widget(backend: Arc<dyn ChatBackend>) -> ChatWidget<Transcript> {
        ChatWidget::new(backend, Transcript::new(), GREETING)
    }

    fn transcript_texts(widget: &ChatWidget<Transcript>) -> Vec<(ChatRole, String)> {
        widget
            .view()
            .messages()
            .map(|m| (m.role, m.content.clone()))
            .collect()
    }

    #[tokio::test]
    async fn test_blank_input_is_ignored() {
        let backend = ScriptedBackend::new(vec![]);
        let mut widget = widget(backend.clone());

        widget.submit("").await;
        widget.submit("   \n\t ").await;

        assert!(backend.calls().is_empty());
        assert!(widget.history().is_empty());
        assert_eq!(
            transcript_texts(&widget),
            vec![(ChatRole::Assistant, GREETING.to_string())]
        );
    }

    #[tokio::test]
    async fn test_success_appends_user_then_assistant() {
        let backend = ScriptedBackend::new(vec![Ok("I know Rust.".to_string())]);
        let mut widget = widget(backend.clone());

        widget.submit("  What do you know?  ").await;

        assert_eq!(
            transcript_texts(&widget),
            vec![
                (ChatRole::Assistant, GREETING.to_string()),
                (ChatRole::User, "What do you know?".to_string()),
                (ChatRole::Assistant, "I know Rust.".to_string()),
            ]
        );
        assert_eq!(
            widget.history(),
            &[
                ChatMessage::user("What do you know?"),
                ChatMessage::assistant("I know Rust."),
            ]
        );
        assert!(!widget.view().is_typing());
        assert!(widget.view().is_input_enabled());
    }

    #[tokio::test]
    async fn test_failure_keeps_history_and_shows_apology() {
        let backend = ScriptedBackend::new(vec![
            Ok("first answer".to_string()),
            Err(ChatError::Status {
                status: 503,
                body: String::new(),
            }),
        ]);
        let mut widget = widget(backend.clone());

        widget.submit("first").await;
        let before = widget.history().len();
        widget.submit("second").await;

        assert_eq!(widget.history().len(), before);
        let texts = transcript_texts(&widget);
        assert_eq!(texts[texts.len() - 2], (ChatRole::User, "second".to_string()));
        assert_eq!(texts[texts.len() - 1], (ChatRole::Assistant, APOLOGY.to_string()));
        assert!(widget.view().is_input_enabled());
        assert!(!widget.is_awaiting_response());
    }

    #[tokio::test]
    async fn test_retry_after_failure_sends_fresh_history() {
        let backend = ScriptedBackend::new(vec![
            Err(ChatError::malformed("bad")),
            Ok("answer".to_string()),
        ]);
        let mut widget = widget(backend.clone());

        widget.submit("same question").await;
        widget.submit("same question").await;

        let calls = backend.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].1.is_empty());
        assert!(calls[1].1.is_empty());
        assert_eq!(widget.history().len(), 2);
    }

    #[tokio::test]
    async fn test_history_passed_to_backend() {
        let backend = ScriptedBackend::new(vec![Ok("a1".to_string()), Ok("a2".to_string())]);
        let mut widget = widget(backend.clone());

        widget.submit("q1").await;
        widget.submit("q2").await;

        let calls = backend.calls();
        assert_eq!(
            calls[1],
            (
                "q2".to_string(),
                vec![ChatMessage::user("q1"), ChatMessage::assistant("a1")]
            )
        );
    }

    #[tokio::test]
    async fn test_input_disabled_only_while_pending() {
        let backend = ScriptedBackend::new(vec![Ok("done".to_string())]);
        let mut widget = widget(backend);
        assert!(widget.view().is_input_enabled());

        let pending = widget.begin("question").unwrap();
        assert!(!widget.view().is_input_enabled());
        assert!(widget.is_awaiting_response());
        assert!(widget.view().is_typing());

        let result = widget.request(&pending).await;
        assert!(!widget.view().is_input_enabled());

        widget.complete(pending, result);
        assert!(widget.view().is_input_enabled());
        assert!(!widget.is_awaiting_response());
    }

    #[tokio::test]
    async fn test_second_begin_refused_while_pending() {
        let backend = ScriptedBackend::new(vec![Ok("done".to_string())]);
        let mut widget = widget(backend.clone());

        let pending = widget.begin("one").unwrap();
        assert!(widget.begin("two").is_none());

        let result = widget.request(&pending).await;
        widget.complete(pending, result);

        assert_eq!(backend.calls().len(), 1);
        let users: Vec<String> = widget
            .view()
            .messages()
            .filter(|m| m.role == ChatRole::User)
            .map(|m| m.content.clone())
            .collect();
        assert_eq!(users, vec!["one".to_string()]);
    }

    #[tokio::test]
    async fn test_reset_leaves_only_greeting() {
        let backend = ScriptedBackend::new(vec![Ok("a".to_string()), Err(ChatError::malformed("x"))]);
        let mut widget = widget(backend);

        widget.submit("q").await;
        widget.submit("q again").await;
        widget.reset();

        assert!(widget.history().is_empty());
        assert_eq!(
            widget.view().bubbles(),
            &[Bubble::Message(ChatMessage::assistant(GREETING))]
        );
    }

    #[tokio::test]
    async fn test_answer_after_reset_is_discarded() {
        let backend = ScriptedBackend::new(vec![Ok("late".to_string())]);
        let mut widget = widget(backend);

        let pending = widget.begin("question").unwrap();
        let result = widget.request(&pending).await;
        widget.reset();
        widget.complete(pending, result);

        assert!(widget.history().is_empty());
        assert_eq!(widget.view().len(), 1);
        assert!(widget.view().is_input_enabled());
    }

    #[tokio::test]
    async fn test_timeout_takes_failure_path() {
        let mut widget = widget(Arc::new(StalledBackend)).with_timeout(Duration::from_millis(20));

        widget.submit("anyone there?").await;

        let texts = transcript_texts(&widget);
        assert_eq!(texts.last().unwrap(), &(ChatRole::Assistant, APOLOGY.to_string()));
        assert!(widget.history().is_empty());
        assert!(widget.view().is_input_enabled());
    }

    #[tokio::test]
    async fn test_resolve_reports_timeout() {
        let err = resolve(&StalledBackend, "q", &[], Duration::from_millis(10))
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Timeout(d) if d == Duration::from_millis(10)));
    }

    #[tokio::test]
    async fn test_gemini_skills_scenario() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{ "content": { "parts": [{ "text": "I have skills in X." }] } }]
            })))
            .mount(&server)
            .await;

        let backend = GeminiClient::new("key", ContextDocument::new("résumé", "Sam"))
            .with_base_url(&server.uri());
        let mut widget = widget(Arc::new(backend));

        widget.submit("What are your skills?").await;

        let texts = transcript_texts(&widget);
        assert_eq!(
            &texts[1..],
            &[
                (ChatRole::User, "What are your skills?".to_string()),
                (ChatRole::Assistant, "I have skills in X.".to_string()),
            ]
        );
        assert_eq!(
            widget.history(),
            &[
                ChatMessage::user("What are your skills?"),
                ChatMessage::assistant("I have skills in X."),
            ]
        );
    }

    #[tokio::test]
    async fn test_gemini_rate_limited_scenario() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let backend = GeminiClient::new("key", ContextDocument::new("résumé", "Sam"))
            .with_base_url(&server.uri());
        let apology = backend.apology();
        let mut widget = widget(Arc::new(backend));

        widget.submit("What are your skills?").await;

        let texts = transcript_texts(&widget);
        assert_eq!(
            &texts[1..],
            &[
                (ChatRole::User, "What are your skills?".to_string()),
                (ChatRole::Assistant, apology),
            ]
        );
        assert!(widget.history().is_empty());
    }
}
