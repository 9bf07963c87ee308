//! Response middleware composed by the API client.
//!
//! Middleware sees every error-status response before the error is handed
//! back to the caller. It can observe and cause side effects but cannot
//! change what the caller receives.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use reqwest::{Method, StatusCode};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::warn;

use crate::session::SessionStore;

/// Buffered invalidation events per subscriber
pub(crate) const INVALIDATION_CHANNEL_CAPACITY: usize = 16;

/// An error-status response as seen by middleware.
#[derive(Debug)]
pub struct FailureContext<'a> {
    pub method: &'a Method,
    pub path: &'a str,
    pub status: StatusCode,
    pub body: &'a Value,
}

pub trait ResponseMiddleware: Send + Sync {
    fn on_failure(&self, ctx: &FailureContext<'_>);
}

/// Emitted after the local session was dropped because the backend
/// rejected the credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidationEvent {
    pub method: String,
    pub path: String,
    pub occurred_at: DateTime<Utc>,
}

/// Clears the persisted session on a 401 and tells subscribers about it.
///
/// Navigation is left to whoever subscribes.
pub struct SessionInvalidation {
    store: Arc<dyn SessionStore>,
    events: broadcast::Sender<InvalidationEvent>,
}

impl SessionInvalidation {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        let (events, _) = broadcast::channel(INVALIDATION_CHANNEL_CAPACITY);
        Self { store, events }
    }

    pub(crate) fn with_sender(
        store: Arc<dyn SessionStore>,
        events: broadcast::Sender<InvalidationEvent>,
    ) -> Self {
        Self { store, events }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<InvalidationEvent> {
        self.events.subscribe()
    }

    pub(crate) fn sender(&self) -> broadcast::Sender<InvalidationEvent> {
        self.events.clone()
    }
}

impl ResponseMiddleware for SessionInvalidation {
    fn on_failure(&self, ctx: &FailureContext<'_>) {
        if ctx.status != StatusCode::UNAUTHORIZED {
            return;
        }

        warn!(method = %ctx.method, path = ctx.path, "Credential rejected, clearing session");
        if let Err(e) = self.store.clear_session() {
            warn!(error = %e, "Failed to clear session after rejection");
        }

        // No subscribers is fine.
        let _ = self.events.send(InvalidationEvent {
            method: ctx.method.to_string(),
            path: ctx.path.to_string(),
            occurred_at: Utc::now(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{MemorySessionStore, SessionSnapshot};
    use serde_json::json;

    fn failure<'a>(method: &'a Method, status: StatusCode, body: &'a Value) -> FailureContext<'a> {
        FailureContext {
            method,
            path: "/admin/doctors",
            status,
            body,
        }
    }

    #[test]
    fn test_unauthorized_clears_session_and_notifies() {
        let store = Arc::new(MemorySessionStore::new());
        store.set_session("abc123", "{}").unwrap();
        let policy = SessionInvalidation::new(store.clone());
        let mut events = policy.subscribe();

        let body = json!({"error": "unauthorized"});
        policy.on_failure(&failure(&Method::GET, StatusCode::UNAUTHORIZED, &body));

        assert_eq!(store.get_token().unwrap(), None);
        assert_eq!(store.get_user().unwrap(), None);
        let event = events.try_recv().unwrap();
        assert_eq!(event.method, "GET");
        assert_eq!(event.path, "/admin/doctors");
    }

    #[test]
    fn test_other_statuses_leave_session_alone() {
        let store = Arc::new(MemorySessionStore::new());
        store.set_session("xyz", "{}").unwrap();
        let policy = SessionInvalidation::new(store.clone());
        let mut events = policy.subscribe();

        let body = Value::Null;
        for status in [
            StatusCode::BAD_REQUEST,
            StatusCode::FORBIDDEN,
            StatusCode::NOT_FOUND,
            StatusCode::INTERNAL_SERVER_ERROR,
        ] {
            policy.on_failure(&failure(&Method::POST, status, &body));
        }

        assert_eq!(store.get_token().unwrap().as_deref(), Some("xyz"));
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn test_unauthorized_on_empty_store_without_subscribers() {
        let store = Arc::new(MemorySessionStore::new());
        let policy = SessionInvalidation::new(store.clone());

        let body = Value::Null;
        policy.on_failure(&failure(&Method::DELETE, StatusCode::UNAUTHORIZED, &body));
        assert_eq!(store.snapshot().unwrap(), SessionSnapshot::default());
    }
}
