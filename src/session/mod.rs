//! 세션 모듈 - 이름 있는 대화 스레드
//!
//! 세션은 메시지 로그와 문서 처리 여부를 가지며,
//! [`store::SessionStore`]가 JSON 파일 하나에 보관합니다.

pub mod store;

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

use crate::chat::AnswerSource;

pub use store::SessionStore;

/// 메시지 작성자
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Bot,
}

/// 대화 메시지 (추가 후 변경하지 않음)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub text: String,
    #[serde(default)]
    pub source: Option<AnswerSource>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            source: None,
        }
    }

    pub fn bot(text: impl Into<String>, source: AnswerSource) -> Self {
        Self {
            role: Role::Bot,
            text: text.into(),
            source: Some(source),
        }
    }
}

/// 대화 세션
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub has_processed_docs: bool,
}

impl Session {
    /// 새 세션 (이름: "Chat YYYY-MM-DD HH:MM")
    pub fn new(id: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            display_name: default_display_name(now),
            created_at: now,
            last_updated: now,
            messages: Vec::new(),
            has_processed_docs: false,
        }
    }

    /// 메시지 통계
    pub fn stats(&self) -> ChatStats {
        ChatStats::from_messages(&self.messages, self.has_processed_docs)
    }
}

/// 기본 세션 이름 (로컬 시각)
pub fn default_display_name(at: DateTime<Utc>) -> String {
    format!("Chat {}", at.with_timezone(&Local).format("%Y-%m-%d %H:%M"))
}

/// 대화 통계
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChatStats {
    pub questions: usize,
    pub responses: usize,
    pub document_based: usize,
    pub general_knowledge: usize,
    pub documents_processed: bool,
}

impl ChatStats {
    pub fn from_messages(messages: &[Message], documents_processed: bool) -> Self {
        let mut stats = ChatStats {
            documents_processed,
            ..Default::default()
        };

        for message in messages {
            match message.role {
                Role::User => stats.questions += 1,
                Role::Bot => {
                    stats.responses += 1;
                    match message.source {
                        Some(AnswerSource::Documents) => stats.document_based += 1,
                        Some(AnswerSource::General) => stats.general_knowledge += 1,
                        None => {}
                    }
                }
            }
        }

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_serialization() {
        let json = serde_json::to_value(Message::bot("hi", AnswerSource::General)).unwrap();
        assert_eq!(json["role"], "bot");
        assert_eq!(json["source"], "general_knowledge");

        let json = serde_json::to_value(Message::user("q")).unwrap();
        assert_eq!(json["role"], "user");
        assert!(json["source"].is_null());
    }

    #[test]
    fn test_default_display_name() {
        let session = Session::new("id".to_string());
        assert!(session.display_name.starts_with("Chat "));
        // "Chat " + "YYYY-MM-DD HH:MM"
        assert_eq!(session.display_name.len(), 5 + 16);
        assert!(session.messages.is_empty());
        assert!(!session.has_processed_docs);
    }

    #[test]
    fn test_stats() {
        let messages = vec![
            Message::user("q1"),
            Message::bot("a1", AnswerSource::Documents),
            Message::user("q2"),
            Message::bot("a2", AnswerSource::General),
            Message::user("q3"),
            Message::bot("a3", AnswerSource::General),
        ];

        let stats = ChatStats::from_messages(&messages, true);
        assert_eq!(stats.questions, 3);
        assert_eq!(stats.responses, 3);
        assert_eq!(stats.document_based, 1);
        assert_eq!(stats.general_knowledge, 2);
        assert!(stats.documents_processed);
    }
}
