//! 단발성 질의 파이프라인
//!
//! 문서 수집 → 청킹 → 인덱싱 → 질문별 검색 → 설명형 프롬프트 → LLM.
//! 대화 컨텍스트나 라우팅 없이 모든 질문을 문서 조항으로 답합니다.

use std::sync::Arc;

use anyhow::{bail, Context, Result};

use crate::chat::explainable_prompt;
use crate::embedding::EmbeddingProvider;
use crate::extractor::{DocumentLoader, DocumentSource};
use crate::knowledge::{recursive_chunker, ChunkConfig, Chunker, DocumentIndex};
use crate::llm::LanguageModel;

/// 질문당 검색 조항 수
pub const DEFAULT_CLAUSES: usize = 4;

/// REST 질의 파이프라인
pub struct QueryPipeline {
    loader: Arc<dyn DocumentLoader>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    llm: Arc<dyn LanguageModel>,
    chunk_config: ChunkConfig,
    top_k: usize,
}

impl QueryPipeline {
    pub fn new(
        loader: Arc<dyn DocumentLoader>,
        embedder: Option<Arc<dyn EmbeddingProvider>>,
        llm: Arc<dyn LanguageModel>,
    ) -> Self {
        Self {
            loader,
            embedder,
            llm,
            chunk_config: ChunkConfig::for_api(),
            top_k: DEFAULT_CLAUSES,
        }
    }

    pub fn with_chunk_config(mut self, config: ChunkConfig) -> Self {
        self.chunk_config = config;
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// 문서 하나에 대해 질문들에 답변 (입력 순서 유지)
    ///
    /// 어느 단계든 실패하면 전체 요청이 실패합니다.
    pub async fn run(&self, documents: &str, questions: &[String]) -> Result<Vec<String>> {
        let source = DocumentSource::parse(documents);
        let docs = self
            .loader
            .load(&source)
            .await
            .with_context(|| format!("Failed to load {}", documents))?;

        let full_text = docs
            .iter()
            .map(|d| d.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        if full_text.trim().is_empty() {
            bail!("No text could be extracted from {}", documents);
        }

        let chunks = recursive_chunker(self.chunk_config).chunk(&full_text);
        tracing::info!(
            "Answering {} question(s) over {} chunks",
            questions.len(),
            chunks.len()
        );

        let index = DocumentIndex::build(chunks, self.embedder.clone()).await;

        let mut answers = Vec::with_capacity(questions.len());
        for question in questions {
            let clauses = index.query(question, self.top_k).await?;
            let prompt = explainable_prompt(question, &clauses);
            let response = self.llm.invoke(&prompt).await?;
            answers.push(response.content.trim().to_string());
        }

        Ok(answers)
    }
}
