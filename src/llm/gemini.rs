//! Gemini API client
//!
//! Blocking answers go through `:generateContent`, streamed answers through
//! `:streamGenerateContent?alt=sse`. Uses a long-lived reqwest::Client for
//! connection pooling.

use super::{GenerationRequest, PromptRole, TextGenerator, TextStream};
use crate::error::CoachError;
use crate::Result;
use async_trait::async_trait;
use futures::stream::{self, Stream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::pin::Pin;
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Coaching talk regularly mentions conflict and stress; the default filters
/// block too much of it.
const SAFETY_CATEGORIES: &[&str] = &[
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub base_url: String,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            temperature: 0.7,
            max_output_tokens: 2048,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

/// Reusable Gemini client (connection-pooled)
pub struct GeminiClient {
    client: Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(CoachError::Config("GEMINI_API_KEY not configured".to_string()));
        }

        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .build()?;

        Ok(Self { client, config })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn endpoint(&self, method: &str) -> String {
        let base = format!("{}/{}:{}", self.config.base_url, self.config.model, method);
        if method == "streamGenerateContent" {
            format!("{}?alt=sse&key={}", base, self.config.api_key)
        } else {
            format!("{}?key={}", base, self.config.api_key)
        }
    }

    fn build_request(&self, request: &GenerationRequest) -> GeminiRequest {
        build_gemini_request(
            request,
            request.temperature.unwrap_or(self.config.temperature),
            request.max_tokens.unwrap_or(self.config.max_output_tokens),
        )
    }

    async fn post(&self, method: &str, request: &GenerationRequest) -> Result<reqwest::Response> {
        let body = self.build_request(request);

        info!(
            model = %self.config.model,
            method,
            messages = request.messages.len(),
            "Calling Gemini API"
        );

        let response = self
            .client
            .post(self.endpoint(method))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!("Gemini API request failed: {}", e);
                CoachError::Generation(format!("Gemini API error: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!(%status, "Gemini API error response: {}", error_text);
            return Err(CoachError::Generation(format!(
                "Gemini API error ({}): {}",
                status, error_text
            )));
        }

        Ok(response)
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn generate(&self, request: GenerationRequest) -> Result<String> {
        let response = self.post("generateContent", &request).await?;

        let gemini_response: GeminiResponse = response.json().await.map_err(|e| {
            error!("Failed to parse Gemini response: {}", e);
            CoachError::Generation(format!("Gemini parse error: {}", e))
        })?;

        let candidate = gemini_response
            .candidates
            .first()
            .ok_or_else(|| CoachError::Generation("No response from Gemini API".to_string()))?;

        if candidate.finish_reason.as_deref() == Some("SAFETY") {
            warn!("Gemini answer stopped by safety filter");
        }

        let answer = candidate_text(candidate);
        if answer.is_empty() {
            return Err(CoachError::Generation("Empty response from Gemini".to_string()));
        }

        if let Some(usage) = &gemini_response.usage_metadata {
            debug!(
                prompt_tokens = usage.prompt_token_count,
                answer_tokens = usage.candidates_token_count,
                "Gemini token usage"
            );
        }

        info!(chars = answer.chars().count(), "Gemini response received");
        Ok(answer)
    }

    async fn generate_stream(&self, request: GenerationRequest) -> Result<TextStream> {
        let response = self.post("streamGenerateContent", &request).await?;

        let body = response.bytes_stream().map(|chunk| chunk.map(|b| b.to_vec()));
        Ok(sse_text_stream(Box::pin(body)))
    }
}

//
// ========== Request Construction ==========
//

fn build_gemini_request(request: &GenerationRequest, temperature: f32, max_output_tokens: u32) -> GeminiRequest {
    let mut system_parts = Vec::new();
    let mut contents = Vec::new();

    for message in &request.messages {
        let role = match message.role {
            PromptRole::System => {
                system_parts.push(Part {
                    text: message.content.clone(),
                });
                continue;
            }
            PromptRole::User => "user",
            PromptRole::Assistant => "model",
        };

        contents.push(Content {
            role: Some(role.to_string()),
            parts: vec![Part {
                text: message.content.clone(),
            }],
        });
    }

    GeminiRequest {
        contents,
        generation_config: GenerationConfig {
            temperature,
            max_output_tokens,
        },
        system_instruction: (!system_parts.is_empty()).then_some(SystemInstruction { parts: system_parts }),
        safety_settings: SAFETY_CATEGORIES
            .iter()
            .map(|category| SafetySetting {
                category: category.to_string(),
                threshold: "BLOCK_NONE".to_string(),
            })
            .collect(),
    }
}

fn candidate_text(candidate: &Candidate) -> String {
    candidate
        .content
        .as_ref()
        .map(|c| c.parts.iter().map(|p| p.text.as_str()).collect::<String>())
        .unwrap_or_default()
}

//
// ========== SSE Decoding ==========
//

type ByteStream = Pin<Box<dyn Stream<Item = reqwest::Result<Vec<u8>>> + Send>>;

struct SseState {
    body: ByteStream,
    buffer: Vec<u8>,
    pending: VecDeque<Result<String>>,
    finished: bool,
}

impl SseState {
    /// Move every complete line out of the buffer
    fn drain_lines(&mut self) {
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            if let Some(fragment) = parse_sse_line(line.trim_end_matches(['\r', '\n'])) {
                self.pending.push_back(fragment);
            }
        }
    }
}

/// Decode one `data:` line into a text fragment. Blank and non-data lines yield nothing.
fn parse_sse_line(line: &str) -> Option<Result<String>> {
    let payload = line.strip_prefix("data:")?.trim();
    if payload.is_empty() || payload == "[DONE]" {
        return None;
    }

    let chunk: GeminiResponse = match serde_json::from_str(payload) {
        Ok(chunk) => chunk,
        Err(e) => return Some(Err(CoachError::Serialization(e))),
    };

    let text = chunk.candidates.first().map(candidate_text).unwrap_or_default();
    (!text.is_empty()).then_some(Ok(text))
}

fn sse_text_stream(body: ByteStream) -> TextStream {
    let state = SseState {
        body,
        buffer: Vec::new(),
        pending: VecDeque::new(),
        finished: false,
    };

    let fragments = stream::unfold(state, |mut st| async move {
        loop {
            if let Some(item) = st.pending.pop_front() {
                return Some((item, st));
            }
            if st.finished {
                return None;
            }

            match st.body.next().await {
                Some(Ok(chunk)) => {
                    st.buffer.extend_from_slice(&chunk);
                    st.drain_lines();
                }
                Some(Err(e)) => {
                    error!("Gemini stream interrupted: {}", e);
                    st.finished = true;
                    return Some((Err(CoachError::Http(e)), st));
                }
                None => {
                    st.finished = true;
                    st.buffer.push(b'\n');
                    st.drain_lines();
                }
            }
        }
    });

    Box::pin(fragments)
}

//
// ========== Wire Types ==========
//

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction>,
    safety_settings: Vec<SafetySetting>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct SafetySetting {
    category: String,
    threshold: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: i32,
    #[serde(default)]
    candidates_token_count: i32,
}
