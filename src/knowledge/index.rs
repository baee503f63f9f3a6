//! 문서 인덱스 - 임베딩 검색 또는 원문 폴백
//!
//! 임베딩 프로바이더가 없거나 임베딩에 실패하면 원문 청크 목록으로 저하되며,
//! 이때 검색은 유사도 비교 없이 "앞에서 k개"를 반환합니다.

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::embedding::EmbeddingProvider;

use super::vector::{InMemoryVectorStore, VectorEntry, VectorStore};

/// 문서 인덱스 핸들
pub enum DocumentIndex {
    /// 임베딩 기반 유사도 검색
    Embedded {
        store: InMemoryVectorStore,
        embedder: Arc<dyn EmbeddingProvider>,
    },
    /// 원문 청크 (저하 모드)
    Raw(Vec<String>),
}

impl std::fmt::Debug for DocumentIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Embedded { store, embedder } => f
                .debug_struct("Embedded")
                .field("chunks", &store.len())
                .field("embedder", &embedder.name())
                .finish(),
            Self::Raw(chunks) => f.debug_tuple("Raw").field(&chunks.len()).finish(),
        }
    }
}

impl DocumentIndex {
    /// 청크로 인덱스 생성
    ///
    /// 임베딩 실패는 에러가 아니라 원문 폴백으로 처리합니다.
    pub async fn build(chunks: Vec<String>, embedder: Option<Arc<dyn EmbeddingProvider>>) -> Self {
        let Some(embedder) = embedder else {
            tracing::info!(
                "No embedding provider available, indexing {} raw chunks",
                chunks.len()
            );
            return Self::Raw(chunks);
        };

        match embed_chunks(&chunks, embedder.as_ref()).await {
            Ok(store) => {
                tracing::info!(
                    "Indexed {} chunks with {}",
                    store.len(),
                    embedder.name()
                );
                Self::Embedded { store, embedder }
            }
            Err(e) => {
                tracing::warn!("Embedding failed, falling back to raw chunks: {:#}", e);
                Self::Raw(chunks)
            }
        }
    }

    /// 질문과 가장 유사한 청크 k개 (유사도 내림차순)
    ///
    /// 원문 모드에서는 앞에서 k개를 그대로 반환합니다.
    pub async fn query(&self, question: &str, k: usize) -> Result<Vec<String>> {
        match self {
            Self::Raw(chunks) => Ok(chunks.iter().take(k).cloned().collect()),
            Self::Embedded { store, embedder } => {
                let query_embedding = embedder
                    .embed(question)
                    .await
                    .context("Failed to embed query")?;
                let results = store.search(&query_embedding, k).await?;
                Ok(results.into_iter().map(|r| r.chunk_text).collect())
            }
        }
    }

    /// 인덱싱된 청크 수
    pub fn len(&self) -> usize {
        match self {
            Self::Raw(chunks) => chunks.len(),
            Self::Embedded { store, .. } => store.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 원문 폴백 모드 여부
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Raw(_))
    }
}

async fn embed_chunks(
    chunks: &[String],
    embedder: &dyn EmbeddingProvider,
) -> Result<InMemoryVectorStore> {
    let store = InMemoryVectorStore::new();
    if chunks.is_empty() {
        return Ok(store);
    }

    let embeddings = embedder
        .embed_batch(chunks)
        .await
        .context("Failed to embed chunks")?;

    if embeddings.len() != chunks.len() {
        anyhow::bail!(
            "Embedding count mismatch: {} chunks, {} embeddings",
            chunks.len(),
            embeddings.len()
        );
    }

    let entries: Vec<VectorEntry> = chunks
        .iter()
        .zip(embeddings)
        .enumerate()
        .map(|(i, (chunk, embedding))| VectorEntry {
            chunk_index: i,
            chunk_text: chunk.clone(),
            embedding,
        })
        .collect();

    store.insert_batch(&entries).await?;
    Ok(store)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    /// 키워드 포함 여부로 2차원 벡터를 만드는 테스트용 임베딩
    struct KeywordEmbedding;

    #[async_trait]
    impl EmbeddingProvider for KeywordEmbedding {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let lower = text.to_lowercase();
            Ok(vec![
                if lower.contains("rust") { 1.0 } else { 0.0 },
                if lower.contains("python") { 1.0 } else { 0.0 },
            ])
        }

        fn dimension(&self) -> usize {
            2
        }

        fn name(&self) -> &str {
            "keyword-test"
        }
    }

    struct FailingEmbedding;

    #[async_trait]
    impl EmbeddingProvider for FailingEmbedding {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            anyhow::bail!("provider offline")
        }

        fn dimension(&self) -> usize {
            2
        }

        fn name(&self) -> &str {
            "failing-test"
        }
    }

    fn chunks() -> Vec<String> {
        vec![
            "python is dynamic".to_string(),
            "rust has ownership".to_string(),
            "neither here".to_string(),
            "more python".to_string(),
        ]
    }

    #[tokio::test]
    async fn test_raw_fallback_takes_first_k() {
        let index = DocumentIndex::build(chunks(), None).await;
        assert!(index.is_degraded());

        let results = index.query("rust", 3).await.unwrap();
        assert_eq!(
            results,
            vec!["python is dynamic", "rust has ownership", "neither here"]
        );
    }

    #[tokio::test]
    async fn test_embedded_query_ranks_by_similarity() {
        let index = DocumentIndex::build(chunks(), Some(Arc::new(KeywordEmbedding))).await;
        assert!(!index.is_degraded());
        assert_eq!(index.len(), 4);

        let results = index.query("tell me about rust", 1).await.unwrap();
        assert_eq!(results, vec!["rust has ownership"]);
    }

    #[tokio::test]
    async fn test_embedding_failure_degrades_to_raw() {
        let index = DocumentIndex::build(chunks(), Some(Arc::new(FailingEmbedding))).await;
        assert!(index.is_degraded());
        assert_eq!(index.len(), 4);
    }

    #[tokio::test]
    async fn test_empty_index() {
        let index = DocumentIndex::build(vec![], None).await;
        assert!(index.is_empty());
        assert!(index.query("anything", 3).await.unwrap().is_empty());
    }
}
