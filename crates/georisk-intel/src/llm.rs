use std::panic::AssertUnwindSafe;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::IntelError;

/// Strict-JSON contract for per-signal semantic analysis (§6b).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SemanticAnalysis {
    pub relevance_score: f64,
    pub confidence_score: f64,
    pub matched_themes: Vec<String>,
    pub reasoning: String,
}

impl SemanticAnalysis {
    /// Neutral fallback returned when the LLM call fails or its output
    /// cannot be parsed — never propagated as an error (§6).
    pub fn neutral_fallback() -> Self {
        Self {
            relevance_score: 0.5,
            confidence_score: 0.3,
            matched_themes: Vec::new(),
            reasoning: "semantic analysis unavailable; neutral fallback applied".to_string(),
        }
    }
}

/// One entry of the batch-validation response (§6c).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SignalValidation {
    pub signal_index: usize,
    pub validation_confidence: f64,
    pub is_corroborated: bool,
    pub is_contradicted: bool,
    pub corroborating_indices: Vec<usize>,
    pub contradicting_indices: Vec<usize>,
    pub evidence_quality: String,
    pub validation_reasoning: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchValidationResult {
    pub validations: Vec<SignalValidation>,
    pub overall_coherence: f64,
    pub contradiction_count: u32,
    pub corroboration_count: u32,
    pub analysis_summary: String,
}

impl BatchValidationResult {
    /// Neutral fallback (§6): confidence 0.7, no corroboration/contradiction.
    pub fn neutral_fallback(signal_count: usize) -> Self {
        Self {
            validations: (0..signal_count)
                .map(|signal_index| SignalValidation {
                    signal_index,
                    validation_confidence: 0.7,
                    is_corroborated: false,
                    is_contradicted: false,
                    corroborating_indices: Vec::new(),
                    contradicting_indices: Vec::new(),
                    evidence_quality: "unknown".to_string(),
                    validation_reasoning: "batch validation unavailable; neutral fallback applied"
                        .to_string(),
                })
                .collect(),
            overall_coherence: 0.5,
            contradiction_count: 0,
            corroboration_count: 0,
            analysis_summary: "batch validation unavailable".to_string(),
        }
    }
}

/// Pluggable LLM adapter used for query refinement, semantic relevance
/// scoring, batch validation, and theme-impact summaries. HTTP-based
/// rather than a CLI subprocess, since the service contract here is a
/// chat completion endpoint, not a local tool invocation.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, system_prompt: &str, user_prompt: &str, model: &str) -> Result<String, IntelError>;

    /// Models tried in order until one responds without a not-found error
    /// (§9's model cascade).
    fn model_cascade(&self) -> &[String];

    async fn complete_with_cascade(&self, system_prompt: &str, user_prompt: &str) -> Option<String> {
        for model in self.model_cascade() {
            match self.complete(system_prompt, user_prompt, model).await {
                Ok(text) => return Some(text),
                Err(error) => {
                    tracing::warn!(model = %model, error = %error, "llm model failed; trying next in cascade");
                }
            }
        }
        None
    }
}

/// Extracts a JSON object from a possibly code-fenced LLM response.
/// Tries a whole-string parse first, then strips ```json fences, then
/// finds the first balanced `{...}` block — mirroring the teacher's
/// markdown-then-brace-matching extraction order.
pub fn extract_json_object(text: &str) -> Option<serde_json::Value> {
    if let Ok(value) = serde_json::from_str(text.trim()) {
        return Some(value);
    }
    if let Some(fenced) = extract_from_markdown_block(text) {
        if let Ok(value) = serde_json::from_str(&fenced) {
            return Some(value);
        }
    }
    extract_first_object(text).and_then(|s| serde_json::from_str(&s).ok())
}

fn extract_from_markdown_block(text: &str) -> Option<String> {
    let start = text.find("```")?;
    let after_fence = &text[start + 3..];
    let after_fence = after_fence.strip_prefix("json").unwrap_or(after_fence);
    let after_fence = after_fence.strip_prefix('\n').unwrap_or(after_fence);
    let end = after_fence.find("```")?;
    Some(after_fence[..end].trim().to_string())
}

fn extract_first_object(text: &str) -> Option<String> {
    let bytes = text.as_bytes();
    let start = text.find('{')?;
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, &byte) in bytes[start..].iter().enumerate() {
        if escaped {
            escaped = false;
            continue;
        }
        match byte {
            b'\\' if in_string => escaped = true,
            b'"' => in_string = !in_string,
            b'{' if !in_string => depth += 1,
            b'}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(text[start..start + offset + 1].to_string());
                }
            }
            _ => {}
        }
    }
    None
}

/// Builds a `reqwest::Client`. Wrapped in `catch_unwind` because some
/// corporate proxy configurations panic inside the TLS backend rather
/// than returning a `reqwest::Error`.
pub fn build_http_client(timeout: Duration) -> reqwest::Client {
    let builder = reqwest::Client::builder().timeout(timeout);
    std::panic::catch_unwind(AssertUnwindSafe(|| builder.build()))
        .ok()
        .and_then(|r| r.ok())
        .unwrap_or_default()
}

#[derive(Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Deserialize)]
struct AnthropicContentBlock {
    text: String,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContentBlock>,
}

#[derive(Deserialize)]
struct AnthropicErrorBody {
    error: AnthropicErrorDetail,
}

#[derive(Deserialize)]
struct AnthropicErrorDetail {
    #[serde(rename = "type")]
    error_type: String,
    message: String,
}

/// HTTP client for an Anthropic-shaped chat completion endpoint.
pub struct AnthropicClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    models: Vec<String>,
}

impl AnthropicClient {
    pub fn new(base_url: String, api_key: String, models: Vec<String>, timeout: Duration) -> Self {
        Self {
            http: build_http_client(timeout),
            base_url,
            api_key,
            models,
        }
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn complete(&self, system_prompt: &str, user_prompt: &str, model: &str) -> Result<String, IntelError> {
        let body = AnthropicRequest {
            model,
            max_tokens: 1024,
            system: system_prompt,
            messages: vec![AnthropicMessage {
                role: "user",
                content: user_prompt,
            }],
        };

        let response = self
            .http
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&body)
            .send()
            .await
            .map_err(|source| IntelError::Http {
                provider: "anthropic",
                source,
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body: Result<AnthropicErrorBody, _> = response.json().await;
            let message = body
                .map(|b| format!("{}: {}", b.error.error_type, b.error.message))
                .unwrap_or_else(|_| format!("status {status}"));
            return Err(IntelError::Parse(message));
        }

        let parsed: AnthropicResponse = response.json().await.map_err(|source| IntelError::Http {
            provider: "anthropic",
            source,
        })?;

        Ok(parsed
            .content
            .into_iter()
            .map(|block| block.text)
            .collect::<Vec<_>>()
            .join(""))
    }

    fn model_cascade(&self) -> &[String] {
        &self.models
    }
}
