//! 에러 타입
//!
//! 라이브러리 경계에서 사용하는 에러 열거형입니다.
//! CLI와 파이프라인은 `anyhow`로 감싸서 전파합니다.

use std::path::PathBuf;

use thiserror::Error;

/// 문서 수집 에러
///
/// 항목 단위로 보고되며, 나머지 항목의 처리는 계속됩니다.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    #[error("Failed to fetch {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("Failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to extract text from {name}: {message}")]
    Extract { name: String, message: String },
}

/// 세션 저장소 에러
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Session store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session store is corrupted: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Session not found: {0}")]
    NotFound(String),
}

/// LLM 호출 에러
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("GROQ_API_KEY is not set")]
    MissingApiKey,

    #[error("LLM request failed: {0}")]
    Request(String),

    #[error("LLM API error ({status}): {body}")]
    Status { status: u16, body: String },

    #[error("Malformed LLM response: {0}")]
    MalformedResponse(String),
}
