use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{read_json, ChatBackend};
use crate::error::ChatError;
use crate::provider::Provider;
use crate::state::ChatMessage;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

#[derive(Serialize)]
struct HostedRequest<'a> {
    message: &'a str,
    conversation_history: &'a [ChatMessage],
}

#[derive(Deserialize)]
struct HostedResponse {
    response: Option<String>,
    #[serde(default)]
    sources: Vec<String>,
}

/// Body of `GET /health` on the chat API server
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub gemini_configured: bool,
    #[serde(default)]
    pub rag_initialized: bool,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// Hosted-API backend: a local server that owns the prompt and retrieval
#[derive(Clone)]
pub struct HostedApiClient {
    client: Client,
    base_url: String,
}

impl HostedApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn health(&self) -> Result<HealthStatus, ChatError> {
        let url = format!("{}/health", self.base_url);
        let response = self.client.get(&url).send().await?;
        read_json(response).await
    }
}

#[async_trait]
impl ChatBackend for HostedApiClient {
    async fn send(&self, question: &str, history: &[ChatMessage]) -> Result<String, ChatError> {
        let url = format!("{}/chat", self.base_url);
        let request = HostedRequest {
            message: question,
            conversation_history: history,
        };

        tracing::debug!(url = %url, history_len = history.len(), "Sending chat request");

        let response = self.client.post(&url).json(&request).send().await?;
        let hosted_response: HostedResponse = read_json(response).await?;

        if !hosted_response.sources.is_empty() {
            tracing::debug!(sources = ?hosted_response.sources, "Answer grounded on sources");
        }

        hosted_response
            .response
            .ok_or_else(|| ChatError::malformed("missing response field"))
    }

    fn provider(&self) -> Provider {
        Provider::Hosted
    }

    fn apology(&self) -> String {
        format!(
            "Sorry, I'm having trouble connecting to the server. Please make sure the backend is running on {}",
            self.base_url
        )
    }
}
