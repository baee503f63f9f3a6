//! 채팅 컨트롤러
//!
//! 현재 세션, 답변 길이 설정, 세션별 문서 인덱스를 [`ChatState`]로 묶고
//! 질문/문서 처리/세션 관리 연산을 제공합니다.
//!
//! 저장소 오류는 경고로 남기고 메모리 상태로 계속 동작합니다.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{bail, Result};

use crate::embedding::EmbeddingProvider;
use crate::error::StoreError;
use crate::extractor::{load_all, DocumentLoader, DocumentSource, IngestFailure};
use crate::knowledge::{recursive_chunker, ChunkConfig, Chunker, DocumentIndex};
use crate::llm::LanguageModel;
use crate::session::{ChatStats, Message, Session, SessionStore};

use super::prompt::LengthPreference;
use super::router::{AnswerRequest, HybridAnswerRouter, RoutedAnswer};

/// 요약 빠른 실행 질문
pub const SUMMARY_QUESTION: &str =
    "Please provide a comprehensive summary of all the uploaded documents";

/// 세션 범위 상태
#[derive(Debug)]
pub struct ChatState {
    pub session: Session,
    pub length: LengthPreference,
    /// 세션 id → 문서 인덱스 (메모리에만 유지)
    indexes: HashMap<String, DocumentIndex>,
}

/// 문서 처리 결과
#[derive(Debug)]
pub struct ProcessSummary {
    pub documents: usize,
    pub chunks: usize,
    /// 임베딩 없이 원문 폴백으로 인덱싱됨
    pub degraded: bool,
    pub failures: Vec<IngestFailure>,
}

/// 채팅 컨트롤러
pub struct ChatApp {
    store: SessionStore,
    router: HybridAnswerRouter,
    loader: Arc<dyn DocumentLoader>,
    chunker: Box<dyn Chunker>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    state: ChatState,
}

impl ChatApp {
    /// 가장 최근 세션으로 시작 (없으면 생성)
    pub fn new(
        store: SessionStore,
        llm: Arc<dyn LanguageModel>,
        loader: Arc<dyn DocumentLoader>,
        chunk_config: ChunkConfig,
        embedder: Option<Arc<dyn EmbeddingProvider>>,
    ) -> Self {
        let session = store.ensure_session().unwrap_or_else(|e| {
            tracing::warn!("Session store unavailable, using an unsaved session: {}", e);
            Session::new(uuid::Uuid::new_v4().to_string())
        });

        Self {
            store,
            router: HybridAnswerRouter::new(llm),
            loader,
            chunker: recursive_chunker(chunk_config),
            embedder,
            state: ChatState {
                session,
                length: LengthPreference::default(),
                indexes: HashMap::new(),
            },
        }
    }

    /// 라우터 교체 (분류기, k 설정 등)
    pub fn with_router(mut self, router: HybridAnswerRouter) -> Self {
        self.router = router;
        self
    }

    pub fn session(&self) -> &Session {
        &self.state.session
    }

    pub fn length(&self) -> LengthPreference {
        self.state.length
    }

    pub fn set_length(&mut self, length: LengthPreference) {
        self.state.length = length;
    }

    /// 현재 세션에 검색 가능한 문서가 있는지
    pub fn has_documents(&self) -> bool {
        self.state.session.has_processed_docs
            && self.state.indexes.contains_key(&self.state.session.id)
    }

    // ========================================================================
    // Chat
    // ========================================================================

    /// 질문하고 답변을 메시지 로그에 추가
    pub async fn ask(&mut self, question: &str) -> RoutedAnswer {
        let state = &mut self.state;
        state.session.messages.push(Message::user(question));

        let answer = self
            .router
            .answer(AnswerRequest {
                session_id: &state.session.id,
                question,
                documents: state.indexes.get(&state.session.id),
                has_documents: state.session.has_processed_docs,
                length: state.length,
            })
            .await;

        state
            .session
            .messages
            .push(Message::bot(answer.text.clone(), answer.source));
        self.persist();

        answer
    }

    /// 문서 요약 (처리된 문서가 없으면 None)
    pub async fn summarize_documents(&mut self) -> Option<RoutedAnswer> {
        if !self.has_documents() {
            return None;
        }
        Some(self.ask(SUMMARY_QUESTION).await)
    }

    /// 문서 수집 → 청킹 → 인덱싱
    ///
    /// 개별 항목 실패는 `failures`로 보고되고 나머지는 계속 처리됩니다.
    pub async fn process_documents(&mut self, sources: &[DocumentSource]) -> Result<ProcessSummary> {
        let report = load_all(self.loader.as_ref(), sources).await;
        let full_text = report.full_text();

        if report.is_empty() || full_text.trim().is_empty() {
            bail!(
                "No text could be extracted from {} source(s)",
                sources.len()
            );
        }

        let chunks = self.chunker.chunk(&full_text);
        tracing::info!(
            "Split {} document(s) into {} chunks with {}",
            report.documents.len(),
            chunks.len(),
            self.chunker.name()
        );

        let index = DocumentIndex::build(chunks, self.embedder.clone()).await;
        let summary = ProcessSummary {
            documents: report.documents.len(),
            chunks: index.len(),
            degraded: index.is_degraded(),
            failures: report.failures,
        };

        self.state
            .indexes
            .insert(self.state.session.id.clone(), index);
        self.state.session.has_processed_docs = true;
        self.persist();

        Ok(summary)
    }

    /// 대화 기록 삭제 (문서는 유지)
    pub fn clear_history(&mut self) {
        self.state.session.messages.clear();
        self.router.memory_mut().clear(&self.state.session.id);
        self.persist();
    }

    pub fn stats(&self) -> ChatStats {
        self.state.session.stats()
    }

    // ========================================================================
    // Sessions
    // ========================================================================

    pub fn list_sessions(&self) -> Result<Vec<Session>, StoreError> {
        self.store.list()
    }

    /// 새 세션을 만들고 전환
    pub fn new_session(&mut self) -> Result<&Session, StoreError> {
        self.state.session = self.store.create()?;
        Ok(&self.state.session)
    }

    /// 저장된 세션으로 전환
    pub fn switch_session(&mut self, id: &str) -> Result<&Session, StoreError> {
        let session = self
            .store
            .get(id)?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        tracing::info!("Switched to session {}", session.id);
        self.state.session = session;
        Ok(&self.state.session)
    }

    pub fn rename_session(&mut self, id: &str, new_name: &str) -> Result<Session, StoreError> {
        let renamed = self.store.rename(id, new_name)?;
        if self.state.session.id == id {
            self.state.session.display_name = renamed.display_name.clone();
        }
        Ok(renamed)
    }

    /// 세션 삭제 (마지막 세션이면 false)
    ///
    /// 현재 세션을 삭제하면 가장 최근 세션으로 전환합니다.
    pub fn delete_session(&mut self, id: &str) -> Result<bool, StoreError> {
        if !self.store.delete(id)? {
            return Ok(false);
        }

        self.state.indexes.remove(id);
        self.router.memory_mut().clear(id);

        if self.state.session.id == id {
            self.state.session = self.store.ensure_session()?;
        }
        Ok(true)
    }

    fn persist(&self) {
        let session = &self.state.session;
        if let Err(e) = self
            .store
            .update(&session.id, &session.messages, session.has_processed_docs)
        {
            tracing::warn!("Failed to save session {}: {}", session.id, e);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
