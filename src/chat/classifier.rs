//! 질문 분류기
//!
//! 질문이 업로드된 문서에 관한 것인지 판단합니다.

/// 문서 관련 키워드
pub const DOCUMENT_KEYWORDS: [&str; 16] = [
    "document",
    "documents",
    "uploaded",
    "file",
    "files",
    "pdf",
    "content",
    "text",
    "summary",
    "summarize",
    "tell me about the",
    "what is in",
    "according to",
    "based on",
    "from the document",
    "in the file",
];

/// 질문 분류 전략
pub trait QueryClassifier: Send + Sync {
    /// 문서 기반 답변이 필요한 질문인지
    fn is_document_query(&self, question: &str) -> bool;

    /// 분류기 이름
    fn name(&self) -> &'static str;
}

/// 키워드 부분 문자열 매칭 분류기
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    keywords: Vec<String>,
}

impl KeywordClassifier {
    pub fn new(keywords: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.into().to_lowercase())
                .collect(),
        }
    }

    /// 매칭된 첫 키워드
    pub fn matched_keyword(&self, question: &str) -> Option<&str> {
        let lowered = question.to_lowercase();
        self.keywords
            .iter()
            .find(|k| lowered.contains(k.as_str()))
            .map(String::as_str)
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new(DOCUMENT_KEYWORDS)
    }
}

impl QueryClassifier for KeywordClassifier {
    fn is_document_query(&self, question: &str) -> bool {
        self.matched_keyword(question).is_some()
    }

    fn name(&self) -> &'static str {
        "keyword"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_match_is_case_insensitive() {
        let classifier = KeywordClassifier::default();
        assert!(classifier.is_document_query("Summarize the PDF please"));
        assert!(classifier.is_document_query("What is in the contract?"));
        assert!(classifier.is_document_query("According To section 3, who pays?"));
    }

    #[test]
    fn test_no_match() {
        let classifier = KeywordClassifier::default();
        assert!(!classifier.is_document_query("What is the capital of France?"));
        assert!(!classifier.is_document_query(""));
    }

    #[test]
    fn test_substring_without_tokenization() {
        let classifier = KeywordClassifier::default();
        // "context" 안의 "text"도 매칭
        assert_eq!(classifier.matched_keyword("give me context"), Some("text"));
        // 첫 매칭에서 멈춤
        assert_eq!(classifier.matched_keyword("documents"), Some("document"));
    }

    #[test]
    fn test_custom_keywords() {
        let classifier = KeywordClassifier::new(["Policy"]);
        assert!(classifier.is_document_query("what does the policy say"));
        assert!(!classifier.is_document_query("what does the pdf say"));
    }
}
