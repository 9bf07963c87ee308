//! REST API client module for the clinic platform backend.
//!
//! This module provides the `ApiClient` through which every backend call
//! is made. It attaches the bearer token from the session store to each
//! request and, through its response middleware, drops the local session
//! when the backend answers 401.

pub mod client;
pub mod error;
pub mod middleware;
pub mod request;

pub use client::ApiClient;
pub use error::ApiError;
pub use middleware::{FailureContext, InvalidationEvent, ResponseMiddleware, SessionInvalidation};
pub use request::{ApiResponse, RequestBody, RequestOptions};
pub use reqwest::{Method, StatusCode};
