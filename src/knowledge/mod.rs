//! Knowledge 모듈 - 청킹 및 검색 인덱스
//!
//! - Chunker: 재귀 경계 인식 텍스트 분할
//! - Vector: 인메모리 코사인 유사도 검색
//! - Index: 임베딩 검색 또는 원문 폴백

mod chunker;
mod index;
mod vector;

// Re-exports
pub use chunker::{
    default_chunker, recursive_chunker, ChunkConfig, Chunker, RecursiveSplitter,
    DEFAULT_SEPARATORS,
};
pub use index::DocumentIndex;
pub use vector::{cosine_similarity, InMemoryVectorStore, SearchResult, VectorEntry, VectorStore};
