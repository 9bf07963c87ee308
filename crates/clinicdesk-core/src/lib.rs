//! Core library for the clinic platform administration client.
//!
//! - `api`: session-aware HTTP client and its response middleware
//! - `session`: where the bearer token and cached profile live
//! - `auth`: login, logout, password recovery
//! - `resources`: super-admin, clinic-admin and public calls
//! - `config`: backend origin and persisted settings
//! - `format`: date/time display helpers

pub mod api;
pub mod auth;
pub mod config;
pub mod format;
pub mod resources;
pub mod session;

pub use api::{ApiClient, ApiError, ApiResponse, InvalidationEvent, RequestBody, RequestOptions};
pub use auth::{AuthApi, AuthError};
pub use config::{ClientConfig, Settings};
pub use session::{FileSessionStore, KeyringSessionStore, MemorySessionStore, SessionStore};
