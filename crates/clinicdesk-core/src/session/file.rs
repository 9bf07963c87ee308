use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use super::{SessionError, SessionStore, TOKEN_KEY, USER_KEY};
use crate::config::APP_NAME;

/// Session file name in the storage directory
const SESSION_FILE: &str = "session.json";

/// Session store backed by a JSON document on disk.
///
/// The document is a flat string-to-string map. It is read on every call,
/// so a login performed by another process is picked up by the next request.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store under the platform cache directory (`~/.cache/clinicdesk` on Linux).
    pub fn in_cache_dir() -> Result<Self, SessionError> {
        let cache_dir = dirs::cache_dir().ok_or(SessionError::NoStorageDir)?;
        Ok(Self::new(cache_dir.join(APP_NAME)))
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(SESSION_FILE)
    }

    fn load(&self) -> Result<BTreeMap<String, String>, SessionError> {
        let path = self.path();
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = std::fs::read_to_string(&path)?;
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&contents)?)
    }

    /// Replace the document in one rename so readers never see a partial file.
    fn save(&self, entries: &BTreeMap<String, String>) -> Result<(), SessionError> {
        let path = self.path();
        if entries.is_empty() {
            return remove_if_exists(&path);
        }
        std::fs::create_dir_all(&self.dir)?;
        let contents = serde_json::to_string_pretty(entries)?;
        let mut staged = NamedTempFile::new_in(&self.dir)?;
        staged.write_all(contents.as_bytes())?;
        staged.as_file().sync_all()?;
        staged.persist(&path).map_err(|e| e.error)?;
        Ok(())
    }
}

fn remove_if_exists(path: &Path) -> Result<(), SessionError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

impl SessionStore for FileSessionStore {
    fn get_token(&self) -> Result<Option<String>, SessionError> {
        Ok(self.load()?.remove(TOKEN_KEY))
    }

    fn get_user(&self) -> Result<Option<String>, SessionError> {
        Ok(self.load()?.remove(USER_KEY))
    }

    fn set_session(&self, token: &str, user: &str) -> Result<(), SessionError> {
        // A corrupt document is replaced rather than blocking login.
        let mut entries = match self.load() {
            Ok(entries) => entries,
            Err(SessionError::Corrupt(_)) => BTreeMap::new(),
            Err(e) => return Err(e),
        };
        entries.insert(TOKEN_KEY.to_string(), token.to_string());
        entries.insert(USER_KEY.to_string(), user.to_string());
        self.save(&entries)?;
        debug!(path = %self.path().display(), "Session saved");
        Ok(())
    }

    fn clear_session(&self) -> Result<(), SessionError> {
        let mut entries = match self.load() {
            Ok(entries) => entries,
            Err(SessionError::Corrupt(_)) => return remove_if_exists(&self.path()),
            Err(e) => return Err(e),
        };
        let had_token = entries.remove(TOKEN_KEY).is_some();
        let had_user = entries.remove(USER_KEY).is_some();
        if had_token || had_user {
            self.save(&entries)?;
            debug!(path = %self.path().display(), "Session cleared");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_means_signed_out() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path());
        assert_eq!(store.get_token().unwrap(), None);
        assert_eq!(store.get_user().unwrap(), None);
    }

    #[test]
    fn test_session_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        FileSessionStore::new(dir.path())
            .set_session("abc123", r#"{"role":"admin"}"#)
            .unwrap();

        let reopened = FileSessionStore::new(dir.path());
        assert_eq!(reopened.get_token().unwrap().as_deref(), Some("abc123"));
        assert_eq!(reopened.get_user().unwrap().as_deref(), Some(r#"{"role":"admin"}"#));
    }

    #[test]
    fn test_clear_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path());
        store.set_session("abc123", "{}").unwrap();
        assert!(store.path().exists());

        store.clear_session().unwrap();
        assert!(!store.path().exists());
        assert_eq!(store.get_token().unwrap(), None);

        // Second clear is a no-op
        store.clear_session().unwrap();
    }

    #[test]
    fn test_clear_keeps_unrelated_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path());
        std::fs::write(
            store.path(),
            r#"{"token":"t","user":"u","theme":"dark"}"#,
        )
        .unwrap();

        store.clear_session().unwrap();
        let contents = std::fs::read_to_string(store.path()).unwrap();
        assert!(contents.contains("theme"));
        assert!(!contents.contains("token"));
    }

    #[test]
    fn test_corrupt_file_reported_then_cleared() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path());
        std::fs::write(store.path(), "not json").unwrap();

        assert!(matches!(store.get_token(), Err(SessionError::Corrupt(_))));
        store.clear_session().unwrap();
        assert_eq!(store.get_token().unwrap(), None);
    }

    #[test]
    fn test_reads_are_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path());
        store.set_session("t1", "{}").unwrap();
        assert_eq!(store.get_token().unwrap().as_deref(), Some("t1"));

        // Another handle rotates the token behind our back
        FileSessionStore::new(dir.path()).set_session("t2", "{}").unwrap();
        assert_eq!(store.get_token().unwrap().as_deref(), Some("t2"));
    }

    #[test]
    fn test_set_session_replaces_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path());
        std::fs::write(store.path(), "not json").unwrap();

        store.set_session("abc123", "{}").unwrap();
        assert_eq!(store.get_token().unwrap().as_deref(), Some("abc123"));
    }

    #[test]
    fn test_set_session_propagates_read_errors() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path());
        // A directory in the file's place cannot be read as a document.
        std::fs::create_dir(store.path()).unwrap();

        assert!(matches!(store.set_session("abc123", "{}"), Err(SessionError::Io(_))));
        assert!(store.path().is_dir());
    }

    #[test]
    fn test_save_leaves_no_staging_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path());
        store.set_session("t1", "{}").unwrap();
        store.set_session("t2", "{}").unwrap();

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from(SESSION_FILE)]);
    }

    #[test]
    fn test_reader_never_sees_partial_write() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path());
        store.set_session("t0", "{}").unwrap();

        let writer_store = store.clone();
        let writer = std::thread::spawn(move || {
            for i in 1..=200 {
                writer_store.set_session(&format!("t{}", i), "{}").unwrap();
            }
        });

        for _ in 0..500 {
            let token = store.get_token().unwrap();
            assert!(token.is_some_and(|t| t.starts_with('t')));
        }
        writer.join().unwrap();
        assert_eq!(store.get_token().unwrap().as_deref(), Some("t200"));
    }
}
