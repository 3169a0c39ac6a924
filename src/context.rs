//! Static knowledge document used by the direct-inference backend

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Used when no subject name is configured
pub const DEFAULT_SUBJECT: &str = "the candidate";

/// Résumé/biography text prepended to every direct-inference prompt
#[derive(Debug, Clone, Default)]
pub struct ContextDocument {
    text: String,
    subject: String,
}

impl ContextDocument {
    pub fn new(text: impl Into<String>, subject: impl Into<String>) -> Self {
        let subject = subject.into();
        Self {
            text: text.into(),
            subject: if subject.trim().is_empty() {
                DEFAULT_SUBJECT.to_string()
            } else {
                subject
            },
        }
    }

    /// Read the document from a plain text or markdown file
    pub fn load(path: &Path, subject: &str) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read context document {:?}", path))?;
        tracing::debug!(path = %path.display(), bytes = text.len(), "Loaded context document");
        Ok(Self::new(text, subject))
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Context document, then the answering instructions, then the question
    pub fn build_prompt(&self, question: &str) -> String {
        let mut prompt = String::new();

        prompt.push_str(self.text.trim_end());
        prompt.push_str("\n\n");

        prompt.push_str(&format!(
            "Based on the information above about {}, please answer the following question \
             in a professional, friendly, and concise manner. Speak in first person as if you are {}.",
            self.subject, self.subject
        ));
        prompt.push_str("\n\nQuestion: ");
        prompt.push_str(question);
        prompt.push_str("\n\nAnswer:");

        prompt
    }
}
