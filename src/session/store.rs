//! JSON 세션 저장소
//!
//! 모든 세션을 id를 키로 하는 JSON 객체 하나에 저장합니다 (삽입 순서 유지).
//! 변경 연산은 매번 파일 전체를 읽고, 수정하고, 다시 씁니다.
//!
//! 같은 프로세스 안에서는 뮤텍스로 읽기-수정-쓰기를 직렬화합니다.
//! 여러 프로세스가 같은 파일을 쓰면 마지막 쓰기가 이깁니다 (단일 사용자 가정).

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use serde_json::{Map, Value};

use crate::error::StoreError;

use super::{Message, Session};

type Records = Map<String, Value>;

/// 세션 저장소
#[derive(Debug)]
pub struct SessionStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl SessionStore {
    /// 저장 파일 경로로 열기 (파일이 없으면 첫 쓰기 때 생성)
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        tracing::debug!("Session store: {:?}", path);
        Ok(Self {
            path,
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 새 세션 생성
    pub fn create(&self) -> Result<Session, StoreError> {
        let _guard = self.guard();
        let mut records = self.read_records()?;

        let session = Session::new(uuid::Uuid::new_v4().to_string());
        records.insert(session.id.clone(), serde_json::to_value(&session)?);
        self.write_records(&records)?;

        tracing::info!("Created session {} ({})", session.id, session.display_name);
        Ok(session)
    }

    /// 모든 세션 (최근 수정 순)
    pub fn list(&self) -> Result<Vec<Session>, StoreError> {
        let _guard = self.guard();
        let mut sessions = decode_all(self.read_records()?)?;
        sessions.sort_by(|a, b| b.last_updated.cmp(&a.last_updated));
        Ok(sessions)
    }

    /// 세션 조회
    pub fn get(&self, id: &str) -> Result<Option<Session>, StoreError> {
        let _guard = self.guard();
        let mut records = self.read_records()?;
        match records.remove(id) {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// 저장된 세션 수
    pub fn count(&self) -> Result<usize, StoreError> {
        let _guard = self.guard();
        Ok(self.read_records()?.len())
    }

    /// 이름 변경
    pub fn rename(&self, id: &str, new_name: &str) -> Result<Session, StoreError> {
        self.modify(id, |session| {
            session.display_name = new_name.to_string();
        })
    }

    /// 메시지와 문서 처리 여부 갱신
    pub fn update(
        &self,
        id: &str,
        messages: &[Message],
        has_processed_docs: bool,
    ) -> Result<Session, StoreError> {
        self.modify(id, |session| {
            session.messages = messages.to_vec();
            session.has_processed_docs = has_processed_docs;
            session.last_updated = Utc::now();
        })
    }

    /// 세션 삭제
    ///
    /// 마지막 남은 세션은 삭제하지 않고 `Ok(false)`를 반환합니다.
    pub fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let _guard = self.guard();
        let mut records = self.read_records()?;

        if !records.contains_key(id) {
            return Ok(false);
        }

        if records.len() <= 1 {
            tracing::warn!("Refusing to delete the only remaining session {}", id);
            return Ok(false);
        }

        records.remove(id);
        self.write_records(&records)?;

        tracing::info!("Deleted session {}", id);
        Ok(true)
    }

    /// 가장 최근 세션을 반환하거나, 없으면 새로 생성
    pub fn ensure_session(&self) -> Result<Session, StoreError> {
        match self.list()?.into_iter().next() {
            Some(session) => Ok(session),
            None => self.create(),
        }
    }

    // ========================================================================
    // Internal
    // ========================================================================

    fn guard(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn modify(&self, id: &str, apply: impl FnOnce(&mut Session)) -> Result<Session, StoreError> {
        let _guard = self.guard();
        let mut records = self.read_records()?;

        let value = records
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        let mut session: Session = serde_json::from_value(value.take())?;
        apply(&mut session);
        *value = serde_json::to_value(&session)?;

        self.write_records(&records)?;
        Ok(session)
    }

    fn read_records(&self) -> Result<Records, StoreError> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Records::new()),
            Err(e) => return Err(e.into()),
        };

        if data.trim().is_empty() {
            return Ok(Records::new());
        }

        Ok(serde_json::from_str(&data)?)
    }

    /// 임시 파일에 쓴 뒤 rename
    fn write_records(&self, records: &Records) -> Result<(), StoreError> {
        let tmp_path = self.path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(records)?;

        fs::write(&tmp_path, bytes)?;
        match fs::rename(&tmp_path, &self.path) {
            Ok(()) => Ok(()),
            Err(rename_err) => {
                if self.path.exists() {
                    fs::remove_file(&self.path)?;
                    fs::rename(&tmp_path, &self.path)?;
                    Ok(())
                } else {
                    Err(rename_err.into())
                }
            }
        }
    }
}

fn decode_all(records: Records) -> Result<Vec<Session>, StoreError> {
    records
        .into_iter()
        .map(|(_, value)| serde_json::from_value(value).map_err(StoreError::from))
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::AnswerSource;
    use tempfile::TempDir;

    fn open_store(dir: &TempDir) -> SessionStore {
        SessionStore::open(dir.path().join("nested").join("chat_sessions.json")).unwrap()
    }

    #[test]
    fn test_create_and_list() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        assert_eq!(store.count().unwrap(), 0);

        let a = store.create().unwrap();
        let b = store.create().unwrap();
        assert_ne!(a.id, b.id);

        let sessions = store.list().unwrap();
        assert_eq!(sessions.len(), 2);
        assert!(store.path().exists());
    }

    #[test]
    fn test_storage_keeps_insertion_order() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let ids: Vec<String> = (0..3).map(|_| store.create().unwrap().id).collect();

        let raw = fs::read_to_string(store.path()).unwrap();
        let records: Records = serde_json::from_str(&raw).unwrap();
        let keys: Vec<&String> = records.keys().collect();
        assert_eq!(keys, ids.iter().collect::<Vec<_>>());
    }

    #[test]
    fn test_list_sorted_by_last_updated() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let first = store.create().unwrap();
        let _second = store.create().unwrap();

        std::thread::sleep(std::time::Duration::from_millis(5));
        store.update(&first.id, &[Message::user("hi")], false).unwrap();

        let sessions = store.list().unwrap();
        assert_eq!(sessions[0].id, first.id);
    }

    #[test]
    fn test_rename_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let session = store.create().unwrap();
        let messages = vec![
            Message::user("q"),
            Message::bot("a", AnswerSource::Documents),
        ];
        store.update(&session.id, &messages, true).unwrap();

        store.rename(&session.id, "X").unwrap();

        let listed = store.list().unwrap();
        let found = listed.iter().find(|s| s.id == session.id).unwrap();
        assert_eq!(found.display_name, "X");
        assert_eq!(found.messages, messages);
        assert!(found.has_processed_docs);
    }

    #[test]
    fn test_unknown_id() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        store.create().unwrap();

        assert!(matches!(
            store.rename("missing", "X"),
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            store.update("missing", &[], false),
            Err(StoreError::NotFound(_))
        ));
        assert!(!store.delete("missing").unwrap());
        assert!(store.get("missing").unwrap().is_none());
    }

    #[test]
    fn test_delete_last_session_rejected() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let only = store.create().unwrap();

        assert!(!store.delete(&only.id).unwrap());
        assert_eq!(store.count().unwrap(), 1);

        let other = store.create().unwrap();
        assert!(store.delete(&only.id).unwrap());
        assert_eq!(store.count().unwrap(), 1);
        assert!(store.get(&other.id).unwrap().is_some());
    }

    #[test]
    fn test_persists_across_instances() {
        let dir = TempDir::new().unwrap();
        let id = {
            let store = open_store(&dir);
            let session = store.create().unwrap();
            store.rename(&session.id, "Kept").unwrap();
            session.id
        };

        let reopened = open_store(&dir);
        let session = reopened.get(&id).unwrap().unwrap();
        assert_eq!(session.display_name, "Kept");
    }

    #[test]
    fn test_ensure_session() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        let created = store.ensure_session().unwrap();
        let again = store.ensure_session().unwrap();
        assert_eq!(created.id, again.id);
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_corrupted_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chat_sessions.json");
        fs::write(&path, "{ not json").unwrap();

        let store = SessionStore::open(&path).unwrap();
        assert!(matches!(store.list(), Err(StoreError::Parse(_))));
    }
}
