//! Session storage for the signed-in principal.
//!
//! This module provides:
//! - `SessionStore`: the session-context trait the API client reads from
//! - `MemorySessionStore`: process-local store, used by tests and embedders
//! - `FileSessionStore`: JSON document in the cache directory
//! - `KeyringSessionStore`: OS keychain entries via keyring
//!
//! A session is two string values, the bearer token and an opaque cached
//! user profile. They are always written together and removed together.

pub mod file;
pub mod keychain;
pub mod memory;

pub use file::FileSessionStore;
pub use keychain::KeyringSessionStore;
pub use memory::MemorySessionStore;

use thiserror::Error;

/// Storage key of the bearer credential.
pub const TOKEN_KEY: &str = "token";

/// Storage key of the cached user profile blob.
pub const USER_KEY: &str = "user";

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Session storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("Keychain error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("Could not determine a directory for session storage")]
    NoStorageDir,
}

/// Point-in-time read of both session keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub token: Option<String>,
    pub user: Option<String>,
}

impl SessionSnapshot {
    pub fn is_signed_in(&self) -> bool {
        self.token.is_some()
    }
}

/// Persisted session context injected into the API client.
///
/// Every read must hit the backing storage so that a token written by one
/// caller is seen by the next request sent by any other. Clearing must be
/// idempotent: clearing an empty store succeeds and changes nothing.
pub trait SessionStore: Send + Sync {
    /// Current bearer token, if any.
    fn get_token(&self) -> Result<Option<String>, SessionError>;

    /// Current cached profile blob, if any.
    fn get_user(&self) -> Result<Option<String>, SessionError>;

    /// Store a token and its profile blob together.
    fn set_session(&self, token: &str, user: &str) -> Result<(), SessionError>;

    /// Remove both the token and the profile blob.
    fn clear_session(&self) -> Result<(), SessionError>;

    fn snapshot(&self) -> Result<SessionSnapshot, SessionError> {
        Ok(SessionSnapshot {
            token: self.get_token()?,
            user: self.get_user()?,
        })
    }
}
