use keyring::Entry;
use tracing::debug;

use super::{SessionError, SessionStore, TOKEN_KEY, USER_KEY};
use crate::config::APP_NAME;

/// Session store backed by the OS keychain.
///
/// Each session key is its own keychain entry under a shared service name.
#[derive(Debug, Clone)]
pub struct KeyringSessionStore {
    service: String,
}

impl Default for KeyringSessionStore {
    fn default() -> Self {
        Self::new(APP_NAME)
    }
}

impl KeyringSessionStore {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, key: &str) -> Result<Entry, SessionError> {
        Ok(Entry::new(&self.service, key)?)
    }

    fn read(&self, key: &str) -> Result<Option<String>, SessionError> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn delete(&self, key: &str) -> Result<(), SessionError> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl SessionStore for KeyringSessionStore {
    fn get_token(&self) -> Result<Option<String>, SessionError> {
        self.read(TOKEN_KEY)
    }

    fn get_user(&self) -> Result<Option<String>, SessionError> {
        self.read(USER_KEY)
    }

    fn set_session(&self, token: &str, user: &str) -> Result<(), SessionError> {
        self.entry(TOKEN_KEY)?.set_password(token)?;
        self.entry(USER_KEY)?.set_password(user)?;
        debug!(service = %self.service, "Session stored in keychain");
        Ok(())
    }

    fn clear_session(&self) -> Result<(), SessionError> {
        // Attempt both deletes even if the first fails.
        let token = self.delete(TOKEN_KEY);
        let user = self.delete(USER_KEY);
        token.and(user)
    }
}
