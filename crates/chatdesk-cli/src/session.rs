//! Session flag persistence
//!
//! Each client session owns one small JSON file holding its flags, so a
//! resumed session keeps its `conversation_completed` state.

use chatdesk_core::{Error as CoreError, FlagStore};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// On-disk session record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionFile {
    pub id: String,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(default)]
    pub flags: BTreeMap<String, bool>,
}

/// Flag store backed by `<sessions_dir>/<id>.json`
pub struct FileFlagStore {
    path: PathBuf,
    record: Mutex<SessionFile>,
}

impl FileFlagStore {
    /// Get the sessions directory
    pub fn sessions_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("chatdesk")
            .join("sessions")
    }

    /// Create a new session with a fresh id
    pub fn new() -> std::io::Result<Self> {
        Self::create_in(&Self::sessions_dir(), &uuid::Uuid::new_v4().to_string())
    }

    /// Load an existing session
    pub fn load(id: &str) -> std::io::Result<Self> {
        Self::load_from(&Self::sessions_dir(), id)
    }

    pub fn create_in(dir: &Path, id: &str) -> std::io::Result<Self> {
        check_id(id)?;
        fs::create_dir_all(dir)?;
        let now = chrono::Utc::now().timestamp_millis();
        let store = Self {
            path: dir.join(format!("{}.json", id)),
            record: Mutex::new(SessionFile {
                id: id.to_string(),
                created_at: now,
                updated_at: now,
                flags: BTreeMap::new(),
            }),
        };
        store.write(&store.record.lock())?;
        Ok(store)
    }

    pub fn load_from(dir: &Path, id: &str) -> std::io::Result<Self> {
        check_id(id)?;
        let path = dir.join(format!("{}.json", id));
        if !path.exists() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Session not found: {}", id),
            ));
        }

        let content = fs::read_to_string(&path)?;
        let record: SessionFile = serde_json::from_str(&content)?;
        tracing::debug!("loaded session {} ({} flags)", record.id, record.flags.len());
        Ok(Self {
            path,
            record: Mutex::new(record),
        })
    }

    /// Get session ID
    pub fn id(&self) -> String {
        self.record.lock().id.clone()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, record: &SessionFile) -> std::io::Result<()> {
        let content = serde_json::to_string_pretty(record)?;
        fs::write(&self.path, content)
    }

    fn update(&self, apply: impl FnOnce(&mut BTreeMap<String, bool>)) -> chatdesk_core::Result<()> {
        let mut record = self.record.lock();
        apply(&mut record.flags);
        record.updated_at = chrono::Utc::now().timestamp_millis();
        self.write(&record)
            .map_err(|e| CoreError::Store(format!("{}: {}", self.path.display(), e)))
    }
}

/// Session ids are uuids; anything else never reaches the file system
fn check_id(id: &str) -> std::io::Result<()> {
    uuid::Uuid::parse_str(id).map(|_| ()).map_err(|_| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("Invalid session id: {}", id),
        )
    })
}

impl FlagStore for FileFlagStore {
    fn get_flag(&self, key: &str) -> chatdesk_core::Result<bool> {
        Ok(self.record.lock().flags.get(key).copied().unwrap_or(false))
    }

    fn set_flag(&self, key: &str, value: bool) -> chatdesk_core::Result<()> {
        self.update(|flags| {
            flags.insert(key.to_string(), value);
        })
    }

    fn remove_flag(&self, key: &str) -> chatdesk_core::Result<()> {
        self.update(|flags| {
            flags.remove(key);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatdesk_core::CONVERSATION_COMPLETED;

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("chatdesk-sessions-{}", uuid::Uuid::new_v4()))
    }

    fn new_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    #[test]
    fn test_flag_survives_reload() {
        let dir = temp_dir();
        let id = new_id();
        let store = FileFlagStore::create_in(&dir, &id).unwrap();
        assert!(!store.get_flag(CONVERSATION_COMPLETED).unwrap());
        assert!(store.path().ends_with(format!("{}.json", id)));
        store.set_flag(CONVERSATION_COMPLETED, true).unwrap();

        let resumed = FileFlagStore::load_from(&dir, &id).unwrap();
        assert!(resumed.get_flag(CONVERSATION_COMPLETED).unwrap());
        assert_eq!(resumed.id(), id);

        resumed.remove_flag(CONVERSATION_COMPLETED).unwrap();
        let again = FileFlagStore::load_from(&dir, &id).unwrap();
        assert!(!again.get_flag(CONVERSATION_COMPLETED).unwrap());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_unknown_session_is_not_found() {
        let dir = temp_dir();
        let err = FileFlagStore::load_from(&dir, &new_id()).err().unwrap();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }

    #[test]
    fn test_ids_outside_the_sessions_dir_are_rejected() {
        let dir = temp_dir();
        for id in ["../x", "../../etc/passwd", "abc", ""] {
            let err = FileFlagStore::load_from(&dir, id).err().unwrap();
            assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput, "{}", id);
            let err = FileFlagStore::create_in(&dir, id).err().unwrap();
            assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput, "{}", id);
        }
        assert!(!dir.exists());
    }
}
