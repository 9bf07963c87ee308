use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// The backend answered with an error status. The same shape is used for
    /// every status, 401 included.
    #[error("Request failed with status {status}: {}", body_preview(.body))]
    Http { status: StatusCode, body: Value },

    /// No response was obtained.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Render a response body for an error message, truncated to avoid
/// dumping large payloads into logs.
fn body_preview(body: &Value) -> String {
    let text = match body {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    };
    if text.len() <= MAX_ERROR_BODY_LENGTH {
        text
    } else {
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated, {} total bytes)", &text[..end], text.len())
    }
}

impl ApiError {
    /// Response status, or `None` when no response was obtained.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            ApiError::Network(e) => e.status(),
            _ => None,
        }
    }

    /// Response payload of an error status.
    pub fn body(&self) -> Option<&Value> {
        match self {
            ApiError::Http { body, .. } => Some(body),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }

    /// Best-effort human message from a JSON error payload
    /// (`{"error": ...}` or `{"message": ...}`), falling back to the status line.
    pub fn user_message(&self) -> String {
        if let Some(body) = self.body() {
            for key in ["message", "error"] {
                if let Some(msg) = body.get(key).and_then(Value::as_str) {
                    return msg.to_string();
                }
            }
            if let Value::String(s) = body {
                if !s.trim().is_empty() {
                    return s.clone();
                }
            }
        }
        self.to_string()
    }
}
