//! 프롬프트 템플릿
//!
//! 답변 길이 설정과 LLM에 보내는 프롬프트를 조립합니다.

use std::fmt;

use serde::{Deserialize, Serialize};

/// 답변 길이 설정
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthPreference {
    Short,
    #[default]
    Medium,
    Long,
}

impl LengthPreference {
    /// 문자열 해석 (알 수 없는 값은 Medium)
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "short" => LengthPreference::Short,
            "long" => LengthPreference::Long,
            _ => LengthPreference::Medium,
        }
    }

    /// 프롬프트에 들어가는 지시문
    pub fn instruction(&self) -> &'static str {
        match self {
            LengthPreference::Short => {
                "Provide a concise, helpful answer in 100-200 words with clear bullet points"
            }
            LengthPreference::Medium => {
                "Provide a well-structured, informative answer in 250-400 words with good detail and examples"
            }
            LengthPreference::Long => {
                "Provide a detailed, comprehensive answer in 400-600 words with examples, explanations, and thorough coverage"
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LengthPreference::Short => "short",
            LengthPreference::Medium => "medium",
            LengthPreference::Long => "long",
        }
    }
}

impl fmt::Display for LengthPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 일반 지식 프롬프트
///
/// `question`에는 컨텍스트 윈도우가 이미 적용된 질문이 들어옵니다.
pub fn general_prompt(question: &str, length: LengthPreference) -> String {
    format!(
        "You are a helpful AI assistant. Answer the following question using your general knowledge.\n\
         \n\
         Question: {}\n\
         \n\
         Instructions: {}\n\
         \n\
         Please provide a helpful, accurate, and well-formatted response:",
        question,
        length.instruction()
    )
}

/// 문서 기반 프롬프트
pub fn document_prompt(question: &str, chunks: &[String], length: LengthPreference) -> String {
    format!(
        "Based on the following document content, answer the question.\n\
         \n\
         Document Content: {}\n\
         \n\
         Question: {}\n\
         \n\
         Instructions: {}\n\
         \n\
         Answer based on the document content:",
        chunks.join("\n"),
        question,
        length.instruction()
    )
}

/// REST 파이프라인용 설명형 프롬프트
pub fn explainable_prompt(question: &str, clauses: &[String]) -> String {
    let context = clauses
        .iter()
        .map(|clause| format!("- {}", clause))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are an insurance policy analysis expert. Given the following question:\n\
         '{}'\n\
         and these relevant policy clauses:\n{}\n\
         Answer precisely and explain your decision with references to the clauses if possible. \
         Output only the answer text, not anything else.",
        question, context
    )
}
