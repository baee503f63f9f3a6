//! 대화 컨텍스트 윈도우
//!
//! 세션별로 최근 질문/답변을 보관하고, 프롬프트 앞에 붙일
//! "Previous conversation" 블록을 만듭니다.
//!
//! - 세션당 최대 [`MAX_ENTRIES`]개 보관 (오래된 것부터 제거)
//! - 프롬프트에는 최근 [`READ_WINDOW`]개만 사용
//! - 답변은 [`ANSWER_PREVIEW_CHARS`]자에서 자르고 `...` 추가

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};

/// 세션당 최대 보관 개수
pub const MAX_ENTRIES: usize = 20;

/// 프롬프트 생성 시 읽는 개수
pub const READ_WINDOW: usize = 10;

/// 답변 미리보기 길이 (문자 단위)
pub const ANSWER_PREVIEW_CHARS: usize = 200;

const HEADER: &str = "Previous conversation:";

/// 질문/답변 한 쌍
#[derive(Debug, Clone)]
pub struct ContextEntry {
    pub question: String,
    pub answer: String,
    pub timestamp: DateTime<Utc>,
}

/// 세션별 롤링 버퍼
#[derive(Debug, Default)]
pub struct ContextWindow {
    sessions: HashMap<String, VecDeque<ContextEntry>>,
}

impl ContextWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// 교환 기록
    pub fn record(&mut self, session_id: &str, question: &str, answer: &str) {
        let buffer = self.sessions.entry(session_id.to_string()).or_default();

        buffer.push_back(ContextEntry {
            question: question.to_string(),
            answer: answer.to_string(),
            timestamp: Utc::now(),
        });

        while buffer.len() > MAX_ENTRIES {
            buffer.pop_front();
        }
    }

    /// 이전 대화를 포함한 질문 생성
    ///
    /// 기록이 없으면 질문을 그대로 반환합니다.
    pub fn build_context(&self, session_id: &str, question: &str) -> String {
        let recent = self.recent(session_id);
        if recent.is_empty() {
            return question.to_string();
        }

        let lines: Vec<String> = recent
            .iter()
            .map(|entry| format!("Q: {}\nA: {}", entry.question, preview(&entry.answer)))
            .collect();

        format!(
            "{}\n{}\n\nCurrent question: {}",
            HEADER,
            lines.join("\n"),
            question
        )
    }

    /// 최근 READ_WINDOW개 (오래된 것부터)
    pub fn recent(&self, session_id: &str) -> Vec<&ContextEntry> {
        match self.sessions.get(session_id) {
            Some(buffer) => {
                let skip = buffer.len().saturating_sub(READ_WINDOW);
                buffer.iter().skip(skip).collect()
            }
            None => Vec::new(),
        }
    }

    /// 보관 중인 개수
    pub fn len(&self, session_id: &str) -> usize {
        self.sessions.get(session_id).map(VecDeque::len).unwrap_or(0)
    }

    /// 세션 기록 삭제
    pub fn clear(&mut self, session_id: &str) {
        self.sessions.remove(session_id);
    }
}

/// 답변 미리보기 (200자 초과 시 잘라서 `...`)
fn preview(answer: &str) -> String {
    if answer.chars().count() > ANSWER_PREVIEW_CHARS {
        let cut: String = answer.chars().take(ANSWER_PREVIEW_CHARS).collect();
        format!("{}...", cut)
    } else {
        answer.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_window_returns_question() {
        let window = ContextWindow::new();
        assert_eq!(window.build_context("s1", "What is X?"), "What is X?");
    }

    #[test]
    fn test_build_context_format() {
        let mut window = ContextWindow::new();
        window.record("s1", "Q one", "A one");
        window.record("s1", "Q two", "A two");

        let ctx = window.build_context("s1", "Q three");
        assert_eq!(
            ctx,
            "Previous conversation:\nQ: Q one\nA: A one\nQ: Q two\nA: A two\n\nCurrent question: Q three"
        );
    }

    #[test]
    fn test_long_answer_truncated() {
        let mut window = ContextWindow::new();
        window.record("s1", "q", &"A".repeat(250));

        let ctx = window.build_context("s1", "next");
        let expected = format!("A: {}...\n", "A".repeat(200));
        assert!(ctx.contains(&expected));
        assert!(!ctx.contains(&"A".repeat(201)));
    }

    #[test]
    fn test_exactly_200_not_truncated() {
        let mut window = ContextWindow::new();
        window.record("s1", "q", &"B".repeat(200));

        let ctx = window.build_context("s1", "next");
        assert!(!ctx.contains("..."));
    }

    #[test]
    fn test_truncation_counts_characters() {
        let mut window = ContextWindow::new();
        window.record("s1", "q", &"가".repeat(201));

        let ctx = window.build_context("s1", "next");
        assert!(ctx.contains(&format!("A: {}...", "가".repeat(200))));
    }

    #[test]
    fn test_eviction_and_read_window() {
        let mut window = ContextWindow::new();
        for i in 0..25 {
            window.record("s1", &format!("question {}", i), &format!("answer {}", i));
        }

        assert_eq!(window.len("s1"), MAX_ENTRIES);

        let recent = window.recent("s1");
        assert_eq!(recent.len(), READ_WINDOW);
        assert_eq!(recent[0].question, "question 15");
        assert_eq!(recent[9].question, "question 24");

        let ctx = window.build_context("s1", "now");
        assert!(!ctx.contains("question 14\n"));
        assert_eq!(ctx.matches("Q: ").count(), READ_WINDOW);
    }

    #[test]
    fn test_sessions_are_isolated() {
        let mut window = ContextWindow::new();
        window.record("s1", "only in s1", "yes");

        assert_eq!(window.build_context("s2", "hello"), "hello");

        window.clear("s1");
        assert_eq!(window.len("s1"), 0);
    }
}
