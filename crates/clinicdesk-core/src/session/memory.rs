use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use super::{SessionError, SessionStore, TOKEN_KEY, USER_KEY};

/// In-process session store.
///
/// Holds the two session keys in a map behind a lock. Nothing survives a
/// restart.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with a token and no profile.
    pub fn with_token(token: &str) -> Self {
        let store = Self::new();
        store.write(TOKEN_KEY, token);
        store
    }

    fn read(&self, key: &str) -> Option<String> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn write(&self, key: &str, value: &str) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
    }

    /// Replace only the token, leaving the profile alone.
    ///
    /// The login flow always writes both keys; this exists so tests can
    /// rotate a token between two in-flight requests.
    pub fn set_token(&self, token: &str) {
        self.write(TOKEN_KEY, token);
    }
}

impl SessionStore for MemorySessionStore {
    fn get_token(&self) -> Result<Option<String>, SessionError> {
        Ok(self.read(TOKEN_KEY))
    }

    fn get_user(&self) -> Result<Option<String>, SessionError> {
        Ok(self.read(USER_KEY))
    }

    fn set_session(&self, token: &str, user: &str) -> Result<(), SessionError> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(TOKEN_KEY.to_string(), token.to_string());
        entries.insert(USER_KEY.to_string(), user.to_string());
        Ok(())
    }

    fn clear_session(&self) -> Result<(), SessionError> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.remove(TOKEN_KEY);
        entries.remove(USER_KEY);
        Ok(())
    }
}
