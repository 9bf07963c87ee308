//! Session-aware client for the clinic platform REST API.
//!
//! Every call goes through `ApiClient::request`, which reads the bearer
//! token from the session store immediately before sending and runs the
//! response middleware on error statuses.

use std::sync::Arc;

use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use super::middleware::{
    FailureContext, InvalidationEvent, ResponseMiddleware, SessionInvalidation,
    INVALIDATION_CHANNEL_CAPACITY,
};
use super::request::{decode_body, ApiResponse, RequestBody, RequestOptions};
use super::ApiError;
use crate::config::ClientConfig;
use crate::session::SessionStore;

/// API client bound to one backend origin and one session store.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    store: Arc<dyn SessionStore>,
    middleware: Vec<Arc<dyn ResponseMiddleware>>,
    invalidations: broadcast::Sender<InvalidationEvent>,
}

impl ApiClient {
    /// Create a client with the default 401 policy installed.
    pub fn new(config: &ClientConfig, store: Arc<dyn SessionStore>) -> Result<Self, ApiError> {
        let policy = SessionInvalidation::new(store.clone());
        let invalidations = policy.sender();
        let mut client = Self::build(config, store, invalidations)?;
        client.middleware.push(Arc::new(policy));
        Ok(client)
    }

    /// Create a client with no response middleware at all.
    pub fn without_default_middleware(
        config: &ClientConfig,
        store: Arc<dyn SessionStore>,
    ) -> Result<Self, ApiError> {
        let (invalidations, _) = broadcast::channel(INVALIDATION_CHANNEL_CAPACITY);
        Self::build(config, store, invalidations)
    }

    fn build(
        config: &ClientConfig,
        store: Arc<dyn SessionStore>,
        invalidations: broadcast::Sender<InvalidationEvent>,
    ) -> Result<Self, ApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(ApiError::Client)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            store,
            middleware: Vec::new(),
            invalidations,
        })
    }

    /// A 401 policy bound to this client's store and invalidation channel.
    ///
    /// Use it to re-install the policy on a client built with
    /// [`ApiClient::without_default_middleware`]; a `SessionInvalidation`
    /// built with [`SessionInvalidation::new`] publishes on its own channel
    /// instead.
    pub fn session_invalidation(&self) -> SessionInvalidation {
        SessionInvalidation::with_sender(self.store.clone(), self.invalidations.clone())
    }

    /// Append a response middleware; it runs after those already installed.
    pub fn with_middleware(mut self, middleware: Arc<dyn ResponseMiddleware>) -> Self {
        self.middleware.push(middleware);
        self
    }

    /// Receive an event each time a 401 drops the local session.
    pub fn subscribe_invalidations(&self) -> broadcast::Receiver<InvalidationEvent> {
        self.invalidations.subscribe()
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    // ===== Verbs =====

    pub async fn get(
        &self,
        path: &str,
        body: Option<RequestBody>,
        options: RequestOptions,
    ) -> Result<ApiResponse, ApiError> {
        self.request(Method::GET, path, body, options).await
    }

    pub async fn post(
        &self,
        path: &str,
        body: Option<RequestBody>,
        options: RequestOptions,
    ) -> Result<ApiResponse, ApiError> {
        self.request(Method::POST, path, body, options).await
    }

    pub async fn put(
        &self,
        path: &str,
        body: Option<RequestBody>,
        options: RequestOptions,
    ) -> Result<ApiResponse, ApiError> {
        self.request(Method::PUT, path, body, options).await
    }

    pub async fn patch(
        &self,
        path: &str,
        body: Option<RequestBody>,
        options: RequestOptions,
    ) -> Result<ApiResponse, ApiError> {
        self.request(Method::PATCH, path, body, options).await
    }

    pub async fn delete(
        &self,
        path: &str,
        body: Option<RequestBody>,
        options: RequestOptions,
    ) -> Result<ApiResponse, ApiError> {
        self.request(Method::DELETE, path, body, options).await
    }

    /// Send one request and settle it.
    ///
    /// The token is read after the request is assembled and before it is
    /// sent, with no suspension point in between.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<RequestBody>,
        options: RequestOptions,
    ) -> Result<ApiResponse, ApiError> {
        let mut builder = self.client.request(method.clone(), self.url(path));
        if !options.query.is_empty() {
            builder = builder.query(&options.query);
        }
        builder = match body {
            Some(RequestBody::Json(value)) => builder.json(&value),
            Some(RequestBody::Form(fields)) => builder.form(&fields),
            Some(RequestBody::Text(text)) => builder
                .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
                .body(text),
            None => builder,
        };

        let mut headers = caller_headers(&options)?;
        self.inject_token(&mut headers);
        let builder = builder.headers(headers);

        let response = builder.send().await?;
        let status = response.status();
        let response_headers = response.headers().clone();
        let failed = status.is_client_error() || status.is_server_error();
        let body = match response.bytes().await {
            Ok(bytes) => decode_body(&bytes),
            // The status line already arrived, so an error status still settles as one.
            Err(e) if failed => {
                warn!(error = %e, status = %status, path, "Failed to read error response body");
                Value::Null
            }
            Err(e) => return Err(e.into()),
        };
        debug!(method = %method, path, status = %status, "API response");

        if failed {
            let ctx = FailureContext {
                method: &method,
                path,
                status,
                body: &body,
            };
            for middleware in &self.middleware {
                middleware.on_failure(&ctx);
            }
            return Err(ApiError::Http { status, body });
        }

        Ok(ApiResponse {
            status,
            headers: response_headers,
            body,
        })
    }

    /// Set `Authorization: Bearer <token>` from the store, replacing any
    /// caller-supplied value. Leaves headers untouched when signed out.
    fn inject_token(&self, headers: &mut HeaderMap) {
        let token = match self.store.get_token() {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Failed to read session token, sending unauthenticated");
                None
            }
        };
        let Some(token) = token else {
            return;
        };

        match HeaderValue::from_str(&format!("Bearer {}", token)) {
            Ok(mut value) => {
                value.set_sensitive(true);
                headers.insert(header::AUTHORIZATION, value);
            }
            Err(_) => {
                warn!("Stored token is not a valid header value, sending unauthenticated");
                headers.remove(header::AUTHORIZATION);
            }
        }
    }
}

fn caller_headers(options: &RequestOptions) -> Result<HeaderMap, ApiError> {
    let mut headers = HeaderMap::new();
    for (name, value) in &options.headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| ApiError::InvalidRequest(format!("invalid header name: {}", name)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| ApiError::InvalidRequest(format!("invalid value for header {}", name)))?;
        headers.insert(name, value);
    }
    if let Some(ref content_type) = options.content_type {
        let value = HeaderValue::from_str(content_type)
            .map_err(|_| ApiError::InvalidRequest(format!("invalid content type: {}", content_type)))?;
        headers.insert(header::CONTENT_TYPE, value);
    }
    Ok(headers)
}

// ============================================================================
// Tests
// ============================================================================
