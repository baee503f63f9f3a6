//! 설정 모듈
//!
//! 환경변수에서 애플리케이션 설정을 읽어옵니다.
//!
//! | 환경변수 | 기본값 |
//! |---|---|
//! | `DOCQA_DATA_DIR` | `<data_local_dir>/.docqa` |
//! | `GROQ_API_KEY` | (없음) |
//! | `GROQ_BASE_URL` | `https://api.groq.com/openai/v1` |
//! | `DOCQA_MODEL` | `llama3-70b-8192` |
//! | `OPENAI_API_KEY` | (없음 - 임베딩 비활성, 원문 폴백) |
//! | `OPENAI_BASE_URL` | `https://api.openai.com/v1` |
//! | `DOCQA_BIND` | `127.0.0.1:8000` |

use std::path::PathBuf;

use crate::knowledge::ChunkConfig;

/// Groq OpenAI 호환 엔드포인트
/// ref: https://console.groq.com/docs/openai
pub const DEFAULT_LLM_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// 기본 모델
pub const DEFAULT_MODEL: &str = "llama3-70b-8192";

/// 기본 바인드 주소
pub const DEFAULT_BIND: &str = "127.0.0.1:8000";

/// 세션 파일 이름
const SESSIONS_FILE: &str = "chat_sessions.json";

// ============================================================================
// Data Directory
// ============================================================================

/// 데이터 디렉토리 경로 (~/.docqa/)
pub fn get_data_dir() -> PathBuf {
    if let Some(dir) = non_empty_env("DOCQA_DATA_DIR") {
        return PathBuf::from(dir);
    }

    dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".docqa")
}

// ============================================================================
// LLM Config
// ============================================================================

/// LLM 설정
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub api_key: Option<String>,
}

impl LlmConfig {
    /// 대화형 채팅용 (temperature 0.7)
    pub fn for_chat() -> Self {
        Self::from_env_with_temperature(0.7)
    }

    /// REST API용 (temperature 0.2)
    pub fn for_api() -> Self {
        Self::from_env_with_temperature(0.2)
    }

    fn from_env_with_temperature(temperature: f32) -> Self {
        Self {
            base_url: non_empty_env("GROQ_BASE_URL")
                .unwrap_or_else(|| DEFAULT_LLM_BASE_URL.to_string()),
            model: non_empty_env("DOCQA_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature,
            api_key: non_empty_env("GROQ_API_KEY"),
        }
    }
}

// ============================================================================
// App Config
// ============================================================================

/// 애플리케이션 설정
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// 데이터 디렉토리
    pub data_dir: PathBuf,
    /// 채팅 LLM 설정
    pub chat_llm: LlmConfig,
    /// REST API LLM 설정
    pub api_llm: LlmConfig,
    /// 채팅 청킹 설정 (1000/200)
    pub chat_chunks: ChunkConfig,
    /// REST API 청킹 설정 (800/80)
    pub api_chunks: ChunkConfig,
    /// 채팅 라우터 검색 개수
    pub chat_top_k: usize,
    /// REST API 검색 개수
    pub api_top_k: usize,
    /// REST 서버 바인드 주소
    pub bind: String,
}

impl AppConfig {
    /// 환경변수에서 설정 로드
    pub fn from_env() -> Self {
        Self {
            data_dir: get_data_dir(),
            chat_llm: LlmConfig::for_chat(),
            api_llm: LlmConfig::for_api(),
            chat_chunks: ChunkConfig::for_chat(),
            api_chunks: ChunkConfig::for_api(),
            chat_top_k: 3,
            api_top_k: 4,
            bind: non_empty_env("DOCQA_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string()),
        }
    }

    /// 세션 파일 경로
    pub fn sessions_path(&self) -> PathBuf {
        self.data_dir.join(SESSIONS_FILE)
    }

    /// LLM API 키 설정 여부
    pub fn has_llm_key(&self) -> bool {
        self.chat_llm.api_key.is_some()
    }
}

/// 비어있지 않은 환경변수 값
pub(crate) fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
