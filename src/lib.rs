pub mod ai;
pub mod app;
pub mod config;
pub mod console;
pub mod context;
pub mod error;
pub mod handler;
pub mod provider;
pub mod state;
pub mod tui;
pub mod ui;
pub mod view;
pub mod widget;

// Re-export main types for convenience
pub use ai::{build_backend, ChatBackend, GeminiClient, HealthStatus, HostedApiClient};
pub use config::Config;
pub use console::ConsoleView;
pub use context::ContextDocument;
pub use error::ChatError;
pub use provider::Provider;
pub use state::{ChatMessage, ChatRole, ConversationState};
pub use view::{Bubble, Transcript, TranscriptView, TypingId};
pub use widget::{ChatWidget, PendingTurn, QUICK_QUESTIONS};
