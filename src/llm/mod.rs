pub mod client;
pub mod openai;

pub use client::ChatClient;
pub use openai::OpenAiTransport;

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Lazy sequence of non-empty text fragments from one streaming request.
pub type FragmentStream = BoxStream<'static, String>;

/// Opens one streaming completion request per call.
#[async_trait]
pub trait CompletionTransport: Send + Sync {
    async fn open_stream(&self, messages: &[ChatMessage]) -> Result<FragmentStream, LlmError>;
}

/// Outcome of [`ChatClient::complete`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    Text(String),
    /// Every attempt came back empty.
    ExhaustedRetries { retries: u32 },
}

impl Completion {
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Completion::ExhaustedRetries { .. })
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Completion::Text(text) => Some(text),
            Completion::ExhaustedRetries { .. } => None,
        }
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            Completion::Text(text) => Some(text),
            Completion::ExhaustedRetries { .. } => None,
        }
    }

    /// The answer, or the human-readable failure message older callers expect.
    pub fn into_legacy_string(self) -> String {
        match self {
            Completion::Text(text) => text,
            Completion::ExhaustedRetries { retries } => exhausted_message(retries),
        }
    }
}

pub fn exhausted_message(retries: u32) -> String {
    format!(
        "LLM connection failed after {} retries. Model output is empty. Please wait 1 minute and try again.",
        retries
    )
}

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("Invalid header value: {0}")]
    InvalidHeader(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_serializes_lowercase_role() {
        let json = serde_json::to_value(ChatMessage::system("be brief")).unwrap();
        assert_eq!(json, serde_json::json!({"role": "system", "content": "be brief"}));
    }

    #[test]
    fn test_legacy_string_for_exhausted() {
        let completion = Completion::ExhaustedRetries { retries: 5 };
        assert!(completion.is_exhausted());
        assert_eq!(completion.text(), None);
        assert_eq!(
            completion.into_legacy_string(),
            "LLM connection failed after 5 retries. Model output is empty. Please wait 1 minute and try again."
        );
    }

    #[test]
    fn test_legacy_string_passes_text_through() {
        let completion = Completion::Text("hello".into());
        assert_eq!(completion.text(), Some("hello"));
        assert_eq!(completion.into_legacy_string(), "hello");
    }
}
