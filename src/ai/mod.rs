pub mod gemini;
pub mod hosted;

pub use gemini::GeminiClient;
pub use hosted::{HealthStatus, HostedApiClient};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Response;
use serde::de::DeserializeOwned;
use std::sync::Arc;

use crate::config::Config;
use crate::context::ContextDocument;
use crate::error::ChatError;
use crate::provider::Provider;
use crate::state::ChatMessage;

/// One question in, one answer out.
///
/// The widget only ever talks to this trait, so it stays unaware of which
/// request shape goes over the wire.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Ask `question`; `history` holds the completed turns before it.
    async fn send(&self, question: &str, history: &[ChatMessage]) -> Result<String, ChatError>;

    fn provider(&self) -> Provider;

    /// Text shown in place of an answer when `send` fails
    fn apology(&self) -> String;
}

/// Build the backend selected in `config`
pub fn build_backend(config: &Config, context: ContextDocument) -> Result<Arc<dyn ChatBackend>> {
    match config.provider() {
        Provider::Gemini => {
            let api_key = config.gemini_api_key().ok_or_else(|| {
                anyhow!("Gemini API key not configured. Set GEMINI_API_KEY or add gemini_api_key to the config file.")
            })?;
            if context.is_empty() {
                tracing::warn!("Context document is empty; answers will not be grounded in a résumé");
            }
            let client = GeminiClient::new(api_key, context)
                .with_base_url(&config.gemini_base_url())
                .with_model(&config.gemini_model())
                .with_generation(config.temperature(), config.max_output_tokens());
            Ok(Arc::new(client))
        }
        Provider::Hosted => Ok(Arc::new(HostedApiClient::new(&config.api_base_url()))),
    }
}

/// Turn a non-2xx response into `ChatError::Status`, otherwise decode the body.
///
/// The body is read as text first so a decoding problem is reported as a
/// malformed response rather than a transport failure.
pub(crate) async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ChatError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ChatError::Status {
            status: status.as_u16(),
            body,
        });
    }

    let body = response
        .text()
        .await
        .map_err(|e| ChatError::Transport(e.without_url()))?;
    serde_json::from_str(&body).map_err(|e| ChatError::malformed(e.to_string()))
}
