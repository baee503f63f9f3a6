//! LLM 어댑터 - OpenAI 호환 Chat Completions
//!
//! `invoke(prompt) -> {content}` 단일 호출만 제공합니다.
//! 재시도는 하지 않으며, 실패는 호출자에게 한 번 전달됩니다.
//!
//! ref: https://console.groq.com/docs/openai

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::error::LlmError;

// ============================================================================
// LanguageModel Trait
// ============================================================================

/// LLM 응답
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmResponse {
    pub content: String,
}

/// LLM 트레이트
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// 프롬프트 하나를 보내고 응답 텍스트를 받음
    async fn invoke(&self, prompt: &str) -> Result<LlmResponse, LlmError>;

    /// 모델 이름
    fn name(&self) -> &str;
}

// ============================================================================
// ChatCompletionsModel
// ============================================================================

/// OpenAI 호환 `/chat/completions` 클라이언트 (Groq 기본)
#[derive(Debug, Clone)]
pub struct ChatCompletionsModel {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    temperature: f32,
}

impl ChatCompletionsModel {
    /// 설정으로 생성
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| LlmError::Request(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// 응답 본문에서 첫 번째 choice의 content 추출
fn parse_completion(body: &str) -> Result<LlmResponse, LlmError> {
    let parsed: ChatResponse =
        serde_json::from_str(body).map_err(|e| LlmError::MalformedResponse(e.to_string()))?;

    let content = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| LlmError::MalformedResponse("response has no choices".to_string()))?;

    Ok(LlmResponse { content })
}

#[async_trait]
impl LanguageModel for ChatCompletionsModel {
    async fn invoke(&self, prompt: &str) -> Result<LlmResponse, LlmError> {
        let api_key = self.api_key.as_deref().ok_or(LlmError::MissingApiKey)?;

        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
            stream: false,
        };

        tracing::debug!(
            "Invoking {} (prompt: {} chars)",
            self.model,
            prompt.chars().count()
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Request(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LlmError::Request(e.to_string()))?;

        if !status.is_success() {
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        parse_completion(&body)
    }

    fn name(&self) -> &str {
        &self.model
    }
}

// ============================================================================
// Tests
// ============================================================================
