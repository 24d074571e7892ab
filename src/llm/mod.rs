//! Text generation seam
//!
//! The coaching service only needs "messages in, text out", either as one
//! answer or as a stream of fragments. Gemini is the production backend;
//! the mock keeps the service runnable without an API key.

use crate::Result;
use async_trait::async_trait;
use futures::stream::{self, Stream};
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use tokio::sync::Mutex;

pub mod gemini;
pub use gemini::GeminiClient;

/// Stream of answer fragments, in order
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PromptRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PromptMessage {
    pub role: PromptRole,
    pub content: String,
}

impl PromptMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: PromptRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: PromptRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: PromptRole::Assistant,
            content: content.into(),
        }
    }
}

/// One generation call. `None` overrides fall back to the backend settings.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub messages: Vec<PromptMessage>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl GenerationRequest {
    pub fn new(messages: Vec<PromptMessage>) -> Self {
        Self {
            messages,
            temperature: None,
            max_tokens: None,
        }
    }

    /// Single user prompt with no system message
    pub fn from_prompt(prompt: impl Into<String>) -> Self {
        Self::new(vec![PromptMessage::user(prompt)])
    }

    pub fn system_prompt(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == PromptRole::System)
            .map(|m| m.content.as_str())
    }
}

/// Text generation backend
#[async_trait]
pub trait TextGenerator: Send + Sync {
    fn name(&self) -> &'static str;

    async fn generate(&self, request: GenerationRequest) -> Result<String>;

    async fn generate_stream(&self, request: GenerationRequest) -> Result<TextStream>;
}

pub const MOCK_REPLY: &str = "말씀해 주셔서 감사해요. 지금 상황을 조금 더 구체적으로 들려주시면 함께 다음 걸음을 찾아볼게요.";

/// Canned generator for development & testing.
/// Remembers the last request so callers can inspect the assembled prompt.
pub struct MockGenerator {
    reply: String,
    last_request: Mutex<Option<GenerationRequest>>,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self::with_reply(MOCK_REPLY)
    }

    pub fn with_reply(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            last_request: Mutex::new(None),
        }
    }

    pub async fn last_request(&self) -> Option<GenerationRequest> {
        self.last_request.lock().await.clone()
    }
}

impl Default for MockGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn generate(&self, request: GenerationRequest) -> Result<String> {
        *self.last_request.lock().await = Some(request);
        Ok(self.reply.clone())
    }

    async fn generate_stream(&self, request: GenerationRequest) -> Result<TextStream> {
        *self.last_request.lock().await = Some(request);

        // word-sized fragments, whitespace kept so the pieces rejoin exactly
        let fragments: Vec<Result<String>> = self
            .reply
            .split_inclusive(' ')
            .map(|piece| Ok(piece.to_string()))
            .collect();

        Ok(Box::pin(stream::iter(fragments)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_mock_generate_records_request() {
        let mock = MockGenerator::with_reply("좋아요");
        let request = GenerationRequest::new(vec![
            PromptMessage::system("persona"),
            PromptMessage::user("질문"),
        ]);

        let answer = mock.generate(request.clone()).await.unwrap();

        assert_eq!(answer, "좋아요");
        assert_eq!(mock.last_request().await, Some(request));
    }

    #[tokio::test]
    async fn test_mock_stream_rejoins_to_reply() {
        let mock = MockGenerator::new();
        let stream = mock
            .generate_stream(GenerationRequest::from_prompt("질문"))
            .await
            .unwrap();

        let fragments: Vec<String> = stream.map(|f| f.unwrap()).collect().await;

        assert!(fragments.len() > 1);
        assert_eq!(fragments.concat(), MOCK_REPLY);
    }

    #[test]
    fn test_system_prompt_lookup() {
        let request = GenerationRequest::new(vec![
            PromptMessage::user("질문"),
            PromptMessage::system("persona"),
        ]);
        assert_eq!(request.system_prompt(), Some("persona"));
        assert_eq!(GenerationRequest::from_prompt("x").system_prompt(), None);
    }
}
