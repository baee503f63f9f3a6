//! Chat 모듈 - 대화형 문서 질의응답
//!
//! - Context: 세션별 최근 대화 윈도우
//! - Classifier: 문서 질문 판별 전략
//! - Prompt: 답변 길이 설정과 프롬프트 템플릿
//! - Router: 문서 기반 / 일반 지식 하이브리드 라우팅
//! - App: 세션 범위 채팅 컨트롤러

mod app;
mod classifier;
mod context;
mod prompt;
mod router;

// Re-exports
pub use app::{ChatApp, ChatState, ProcessSummary, SUMMARY_QUESTION};
pub use classifier::{KeywordClassifier, QueryClassifier, DOCUMENT_KEYWORDS};
pub use context::{ContextEntry, ContextWindow, ANSWER_PREVIEW_CHARS, MAX_ENTRIES, READ_WINDOW};
pub use prompt::{document_prompt, explainable_prompt, general_prompt, LengthPreference};
pub use router::{AnswerRequest, AnswerSource, HybridAnswerRouter, RoutedAnswer, DEFAULT_TOP_K};
