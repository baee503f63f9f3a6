//! 임베딩 모듈 - OpenAI 호환 API를 통한 텍스트 벡터화
//!
//! 텍스트를 벡터로 변환하는 임베딩 프로바이더입니다.
//! API 키가 없으면 프로바이더를 만들지 않으며, 인덱스는 원문 폴백으로 동작합니다.
//!
//! ## 사용법
//! ```rust,ignore
//! let embedder = OpenAiEmbedding::from_env()?;
//! let embedding = embedder.embed("Hello, world!").await?;
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::non_empty_env;

// ============================================================================
// EmbeddingProvider Trait
// ============================================================================

/// 임베딩 프로바이더 트레이트
///
/// 텍스트를 벡터로 변환하는 인터페이스입니다.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// 단일 텍스트 임베딩
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// 배치 임베딩 (기본 구현: 순차 호출)
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// 임베딩 차원 수
    fn dimension(&self) -> usize;

    /// 프로바이더 이름
    fn name(&self) -> &str;
}

// ============================================================================
// OpenAI-compatible Embedding
// ============================================================================

/// 기본 엔드포인트
/// ref: https://platform.openai.com/docs/api-reference/embeddings
pub const DEFAULT_EMBEDDING_BASE_URL: &str = "https://api.openai.com/v1";

/// 기본 모델
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";

/// 기본 임베딩 차원 (ada-002)
pub const DEFAULT_DIMENSION: usize = 1536;

/// 한 번의 요청에 담는 최대 입력 수
const MAX_BATCH_SIZE: usize = 100;

/// OpenAI 호환 임베딩 구현체
#[derive(Debug)]
pub struct OpenAiEmbedding {
    api_key: String,
    base_url: String,
    model: String,
    client: reqwest::Client,
    dimension: usize,
}

impl OpenAiEmbedding {
    /// 새 임베딩 인스턴스 생성
    ///
    /// # Arguments
    /// * `api_key` - API 키
    /// * `base_url` - `/embeddings` 앞까지의 기본 URL
    pub fn new(api_key: String, base_url: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            client,
            dimension: DEFAULT_DIMENSION,
        })
    }

    /// 환경변수에서 API 키를 읽어 생성
    pub fn from_env() -> Result<Self> {
        let api_key = get_api_key()?;
        let base_url = non_empty_env("OPENAI_BASE_URL")
            .unwrap_or_else(|| DEFAULT_EMBEDDING_BASE_URL.to_string());
        Self::new(api_key, base_url)
    }

    async fn request(&self, input: &[String]) -> Result<Vec<Vec<f32>>> {
        let request = EmbedRequest {
            model: &self.model,
            input,
        };

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("Failed to send embedding request")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read response body")?;

        if !status.is_success() {
            if let Ok(error) = serde_json::from_str::<ApiErrorBody>(&body) {
                anyhow::bail!("Embedding API error ({}): {}", status, error.error.message);
            }
            anyhow::bail!("Embedding API error ({}): {}", status, body);
        }

        let parsed: EmbedResponse =
            serde_json::from_str(&body).context("Failed to parse embedding response")?;
        Ok(into_ordered_vectors(parsed))
    }
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// 응답 순서가 입력 순서와 다를 수 있으므로 index로 정렬
fn into_ordered_vectors(response: EmbedResponse) -> Vec<Vec<f32>> {
    let mut data = response.data;
    data.sort_by_key(|d| d.index);
    data.into_iter().map(|d| d.embedding).collect()
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        // 빈 텍스트 처리
        if text.trim().is_empty() {
            return Ok(vec![0.0; self.dimension]);
        }

        self.request(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("Embedding response contained no vectors"))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());

        for (i, batch) in texts.chunks(MAX_BATCH_SIZE).enumerate() {
            tracing::debug!(
                "Embedding batch {} ({} texts)",
                i + 1,
                batch.len()
            );
            results.extend(self.request(batch).await?);
        }

        Ok(results)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        &self.model
    }
}

// ============================================================================
// API Key Management
// ============================================================================

/// API 키 로드 (`OPENAI_API_KEY`)
pub fn get_api_key() -> Result<String> {
    non_empty_env("OPENAI_API_KEY").ok_or_else(|| {
        anyhow::anyhow!(
            "API key not found. Set OPENAI_API_KEY to enable semantic retrieval."
        )
    })
}

/// API 키 존재 여부 확인
pub fn has_api_key() -> bool {
    non_empty_env("OPENAI_API_KEY").is_some()
}

// ============================================================================
// Factory Function
// ============================================================================

/// 임베딩 프로바이더 생성
///
/// 키가 없거나 생성에 실패하면 `None` (원문 폴백 모드)
pub fn create_embedder() -> Option<Arc<dyn EmbeddingProvider>> {
    if !has_api_key() {
        tracing::info!("OPENAI_API_KEY not set, using raw text fallback for retrieval");
        return None;
    }

    match OpenAiEmbedding::from_env() {
        Ok(embedder) => {
            tracing::info!("Using embedding model {}", embedder.name());
            Some(Arc::new(embedder))
        }
        Err(e) => {
            tracing::warn!("Failed to create embedder, using raw fallback: {:#}", e);
            None
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_api_key() {
        // 환경변수 설정 여부에 따라 결과가 달라짐
        let _ = has_api_key();
    }

    #[test]
    fn test_response_reordered_by_index() {
        let body = r#"{
            "data": [
                {"embedding": [0.0, 1.0], "index": 1},
                {"embedding": [1.0, 0.0], "index": 0}
            ]
        }"#;
        let parsed: EmbedResponse = serde_json::from_str(body).unwrap();
        let vectors = into_ordered_vectors(parsed);
        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[test]
    fn test_base_url_trimmed() {
        let embedder =
            OpenAiEmbedding::new("fake_key".to_string(), "http://localhost:1234/v1/".to_string())
                .unwrap();
        assert_eq!(embedder.base_url, "http://localhost:1234/v1");
        assert_eq!(embedder.dimension(), DEFAULT_DIMENSION);
    }

    #[tokio::test]
    async fn test_empty_text_returns_zero_vector() {
        let embedder =
            OpenAiEmbedding::new("fake_key".to_string(), DEFAULT_EMBEDDING_BASE_URL.to_string())
                .unwrap();
        let embedding = embedder.embed("   ").await.unwrap();
        assert_eq!(embedding.len(), DEFAULT_DIMENSION);
        assert!(embedding.iter().all(|v| *v == 0.0));
    }
}
