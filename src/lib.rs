//! docqa - 대화형 문서 질의응답 시스템
//!
//! 업로드한 문서(PDF, DOCX, EML, 웹 페이지)를 청킹/인덱싱하고,
//! 질문마다 문서 기반 답변과 일반 지식 답변 중 하나를 선택하는
//! 하이브리드 라우팅으로 LLM에 질의합니다.
//! 대화는 이름 있는 세션으로 JSON 파일에 저장되며,
//! 단발성 질의를 위한 REST API도 제공합니다.

pub mod chat;
pub mod cli;
pub mod collector;
pub mod config;
pub mod embedding;
pub mod error;
pub mod extractor;
pub mod knowledge;
pub mod llm;
pub mod scraper;
pub mod server;
pub mod session;

// Re-exports
pub use chat::{
    AnswerSource, ChatApp, ContextWindow, HybridAnswerRouter, KeywordClassifier, LengthPreference,
    QueryClassifier, RoutedAnswer,
};
pub use config::{get_data_dir, AppConfig, LlmConfig};
pub use embedding::{create_embedder, EmbeddingProvider, OpenAiEmbedding};
pub use error::{IngestError, LlmError, StoreError};
pub use extractor::{ContentExtractor, DocumentLoader, DocumentSource, LoadedDocument};
pub use knowledge::{ChunkConfig, Chunker, DocumentIndex, RecursiveSplitter};
pub use llm::{ChatCompletionsModel, LanguageModel, LlmResponse};
pub use scraper::{ScrapedContent, WebScraper};
pub use session::{Message, Role, Session, SessionStore};
