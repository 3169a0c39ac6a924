use std::time::Duration;
use thiserror::Error;

/// Why a chat turn could not be answered.
///
/// Every variant ends in the same apology bubble; the distinction only shows
/// up in the log.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Connection refused, DNS failure, reset mid-request
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Body was not JSON or the expected field was missing
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("no response after {0:?}")]
    Timeout(Duration),

    /// The request task panicked or was cancelled
    #[error("request interrupted: {0}")]
    Interrupted(String),
}

impl ChatError {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse(message.into())
    }

    /// Short label used as a structured log field
    pub fn kind(&self) -> &'static str {
        match self {
            ChatError::Transport(_) => "transport",
            ChatError::Status { .. } => "status",
            ChatError::MalformedResponse(_) => "malformed_response",
            ChatError::Timeout(_) => "timeout",
            ChatError::Interrupted(_) => "interrupted",
        }
    }

    /// True for anything that happened before a usable body arrived
    pub fn is_transport(&self) -> bool {
        !matches!(self, ChatError::MalformedResponse(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_labels() {
        let status = ChatError::Status {
            status: 429,
            body: "slow down".to_string(),
        };
        assert_eq!(status.kind(), "status");
        assert!(status.is_transport());

        let malformed = ChatError::malformed("missing candidates");
        assert_eq!(malformed.kind(), "malformed_response");
        assert!(!malformed.is_transport());

        assert_eq!(ChatError::Timeout(Duration::from_secs(1)).kind(), "timeout");
    }

    #[test]
    fn test_status_display_includes_code() {
        let err = ChatError::Status {
            status: 503,
            body: "unavailable".to_string(),
        };
        assert_eq!(err.to_string(), "backend returned 503: unavailable");
    }
}
