//! 하이브리드 답변 라우터
//!
//! 질문마다 문서 기반으로 답할지, 일반 지식으로 답할지 결정합니다.
//!
//! 1. 분류기로 문서 관련 질문인지 판단
//! 2. 문서가 있고 문서 질문이면 상위 k개 청크 검색
//! 3. 검색 결과가 비면 일반 지식 경로로 전환
//! 4. LLM 실패는 사과 문구로 바꿔 반환 (에러를 전파하지 않음)
//! 5. 모든 호출 결과를 컨텍스트 윈도우에 기록

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::knowledge::DocumentIndex;
use crate::llm::LanguageModel;

use super::classifier::{KeywordClassifier, QueryClassifier};
use super::context::ContextWindow;
use super::prompt::{document_prompt, general_prompt, LengthPreference};

/// 문서 경로 검색 개수
pub const DEFAULT_TOP_K: usize = 3;

/// 답변 출처
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnswerSource {
    #[serde(rename = "documents")]
    Documents,
    #[serde(rename = "general_knowledge")]
    General,
}

impl AnswerSource {
    pub fn label(&self) -> &'static str {
        match self {
            AnswerSource::Documents => "From Documents",
            AnswerSource::General => "General Knowledge",
        }
    }
}

/// 라우터 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutedAnswer {
    pub text: String,
    pub source: AnswerSource,
}

/// 라우터 입력
#[derive(Debug, Clone, Copy)]
pub struct AnswerRequest<'a> {
    pub session_id: &'a str,
    pub question: &'a str,
    /// 처리된 문서 인덱스
    pub documents: Option<&'a DocumentIndex>,
    /// 세션에서 문서 처리가 끝났는지
    pub has_documents: bool,
    pub length: LengthPreference,
}

/// 하이브리드 답변 라우터
pub struct HybridAnswerRouter {
    llm: Arc<dyn LanguageModel>,
    classifier: Box<dyn QueryClassifier>,
    memory: ContextWindow,
    top_k: usize,
}

impl HybridAnswerRouter {
    /// 키워드 분류기로 생성
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self::with_classifier(llm, Box::new(KeywordClassifier::default()))
    }

    pub fn with_classifier(llm: Arc<dyn LanguageModel>, classifier: Box<dyn QueryClassifier>) -> Self {
        Self {
            llm,
            classifier,
            memory: ContextWindow::new(),
            top_k: DEFAULT_TOP_K,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn memory(&self) -> &ContextWindow {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut ContextWindow {
        &mut self.memory
    }

    /// 질문에 답변 (실패하지 않음)
    pub async fn answer(&mut self, req: AnswerRequest<'_>) -> RoutedAnswer {
        let contextual = self.memory.build_context(req.session_id, req.question);

        let is_document_query = self.classifier.is_document_query(req.question);
        let index = req.documents.filter(|_| req.has_documents && is_document_query);

        let mut source = AnswerSource::General;
        let mut prompt = None;

        if let Some(index) = index {
            match index.query(req.question, self.top_k).await {
                Ok(chunks) if !chunks.is_empty() => {
                    tracing::debug!("Retrieved {} chunks for document answer", chunks.len());
                    prompt = Some(document_prompt(&contextual, &chunks, req.length));
                    source = AnswerSource::Documents;
                }
                Ok(_) => {
                    tracing::warn!("No relevant chunks found, answering from general knowledge");
                }
                Err(e) => {
                    tracing::warn!("Retrieval failed, answering from general knowledge: {:#}", e);
                }
            }
        }

        let prompt = prompt.unwrap_or_else(|| general_prompt(&contextual, req.length));
        tracing::debug!(
            "Invoking {} ({} chars, source: {:?})",
            self.llm.name(),
            prompt.len(),
            source
        );

        let answer = match self.llm.invoke(&prompt).await {
            Ok(response) => RoutedAnswer {
                text: response.content.trim().to_string(),
                source,
            },
            Err(e) => {
                tracing::warn!("LLM invocation failed: {}", e);
                RoutedAnswer {
                    text: format!(
                        "I apologize, but I encountered an error while processing your question: {}",
                        e
                    ),
                    source: AnswerSource::General,
                }
            }
        };

        self.memory.record(req.session_id, req.question, &answer.text);
        answer
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use crate::llm::LlmResponse;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// 프롬프트를 기록하는 LLM
    #[derive(Default)]
    struct RecordingLlm {
        prompts: Mutex<Vec<String>>,
    }

    impl RecordingLlm {
        fn last_prompt(&self) -> String {
            self.prompts.lock().unwrap().last().cloned().unwrap_or_default()
        }
    }

    #[async_trait]
    impl LanguageModel for RecordingLlm {
        async fn invoke(&self, prompt: &str) -> Result<LlmResponse, LlmError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(LlmResponse {
                content: "  stub answer \n".to_string(),
            })
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    struct FailingLlm;

    #[async_trait]
    impl LanguageModel for FailingLlm {
        async fn invoke(&self, _prompt: &str) -> Result<LlmResponse, LlmError> {
            Err(LlmError::Request("connection reset".to_string()))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    fn raw_index(chunks: &[&str]) -> DocumentIndex {
        DocumentIndex::Raw(chunks.iter().map(|c| c.to_string()).collect())
    }

    fn request<'a>(
        question: &'a str,
        documents: Option<&'a DocumentIndex>,
        has_documents: bool,
    ) -> AnswerRequest<'a> {
        AnswerRequest {
            session_id: "s1",
            question,
            documents,
            has_documents,
            length: LengthPreference::Medium,
        }
    }

    #[tokio::test]
    async fn test_document_query_uses_documents() {
        let llm = Arc::new(RecordingLlm::default());
        let mut router = HybridAnswerRouter::new(llm.clone());
        let index = raw_index(&["c1", "c2", "c3", "c4"]);

        let answer = router
            .answer(request("Summarize the document", Some(&index), true))
            .await;

        assert_eq!(answer.source, AnswerSource::Documents);
        assert_eq!(answer.text, "stub answer");

        let prompt = llm.last_prompt();
        assert!(prompt.contains("Document Content: c1\nc2\nc3\n"));
        assert!(!prompt.contains("c4"));
    }

    #[tokio::test]
    async fn test_without_documents_is_general() {
        let llm = Arc::new(RecordingLlm::default());
        let mut router = HybridAnswerRouter::new(llm.clone());
        let index = raw_index(&["c1"]);

        let answer = router
            .answer(request("Summarize the document", Some(&index), false))
            .await;
        assert_eq!(answer.source, AnswerSource::General);

        let answer = router.answer(request("What is in the file?", None, true)).await;
        assert_eq!(answer.source, AnswerSource::General);
        assert!(!llm.last_prompt().contains("Document Content"));
    }

    #[tokio::test]
    async fn test_non_document_question_is_general() {
        let llm = Arc::new(RecordingLlm::default());
        let mut router = HybridAnswerRouter::new(llm.clone());
        let index = raw_index(&["c1"]);

        let answer = router
            .answer(request("Who painted the Mona Lisa?", Some(&index), true))
            .await;
        assert_eq!(answer.source, AnswerSource::General);
    }

    #[tokio::test]
    async fn test_empty_retrieval_falls_back() {
        let llm = Arc::new(RecordingLlm::default());
        let mut router = HybridAnswerRouter::new(llm.clone());
        let index = raw_index(&[]);

        let answer = router
            .answer(request("What does the pdf say?", Some(&index), true))
            .await;

        assert_eq!(answer.source, AnswerSource::General);
        assert!(llm.last_prompt().starts_with("You are a helpful AI assistant."));
    }

    #[tokio::test]
    async fn test_llm_failure_becomes_apology() {
        let mut router = HybridAnswerRouter::new(Arc::new(FailingLlm));
        let index = raw_index(&["c1"]);

        let answer = router
            .answer(request("Summarize the document", Some(&index), true))
            .await;

        assert_eq!(answer.source, AnswerSource::General);
        assert_eq!(
            answer.text,
            "I apologize, but I encountered an error while processing your question: LLM request failed: connection reset"
        );

        // 실패한 답변도 기록됨
        let recent = router.memory().recent("s1");
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].answer, answer.text);
    }

    #[tokio::test]
    async fn test_context_is_prepended() {
        let llm = Arc::new(RecordingLlm::default());
        let mut router = HybridAnswerRouter::new(llm.clone());

        router.answer(request("First question", None, false)).await;
        router.answer(request("Second question", None, false)).await;

        let prompt = llm.last_prompt();
        assert!(prompt.contains(
            "Question: Previous conversation:\nQ: First question\nA: stub answer\n\nCurrent question: Second question"
        ));
        assert_eq!(router.memory().len("s1"), 2);
    }

    #[tokio::test]
    async fn test_length_instruction_selected() {
        let llm = Arc::new(RecordingLlm::default());
        let mut router = HybridAnswerRouter::new(llm.clone());

        let mut req = request("Explain gravity", None, false);
        req.length = LengthPreference::Long;
        router.answer(req).await;

        assert!(llm.last_prompt().contains(LengthPreference::Long.instruction()));
    }

    #[tokio::test]
    async fn test_custom_classifier() {
        struct Always;
        impl QueryClassifier for Always {
            fn is_document_query(&self, _question: &str) -> bool {
                true
            }
            fn name(&self) -> &'static str {
                "always"
            }
        }

        let llm = Arc::new(RecordingLlm::default());
        let mut router = HybridAnswerRouter::with_classifier(llm, Box::new(Always)).with_top_k(1);
        let index = raw_index(&["only", "second"]);

        let answer = router.answer(request("Hello there", Some(&index), true)).await;
        assert_eq!(answer.source, AnswerSource::Documents);
    }
}
