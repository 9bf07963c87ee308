//! Sign-in, sign-out and password recovery.
//!
//! Login is the only place a session is written. Logout is purely local;
//! the backend keeps no server-side session to tear down.

use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, info};

use crate::api::{ApiClient, ApiError, RequestBody, RequestOptions};
use crate::resources::id_segment;
use crate::session::SessionError;

/// Minimum accepted length for a new password
pub const MIN_PASSWORD_LENGTH: usize = 6;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Login response did not contain a token")]
    MissingToken,

    #[error("{0}")]
    Validation(String),

    #[error("Cached user profile is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: Option<String>,
    #[serde(default)]
    user: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoginOutcome {
    pub token: String,
    pub user: Value,
}

pub struct AuthApi<'a> {
    client: &'a ApiClient,
}

impl<'a> AuthApi<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Authenticate and persist the token together with the returned profile.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, AuthError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::Validation("Email and password are required".to_string()));
        }

        let response = self
            .client
            .post(
                "/auth/login",
                Some(RequestBody::Json(json!({ "email": email, "password": password }))),
                RequestOptions::default(),
            )
            .await?;

        let login: LoginResponse = response.into_json().map_err(AuthError::Api)?;
        let token = login
            .token
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingToken)?;

        let user_blob = serde_json::to_string(&login.user)?;
        self.client.store().set_session(&token, &user_blob)?;
        info!(email, "Signed in");

        Ok(LoginOutcome {
            token,
            user: login.user,
        })
    }

    pub fn logout(&self) -> Result<(), AuthError> {
        self.client.store().clear_session()?;
        debug!("Signed out");
        Ok(())
    }

    /// The cached profile written at login, if signed in.
    pub fn current_user(&self) -> Result<Option<Value>, AuthError> {
        match self.client.store().get_user()? {
            Some(blob) => Ok(Some(serde_json::from_str(&blob)?)),
            None => Ok(None),
        }
    }

    /// Ask the backend to email a password reset link.
    pub async fn forgot_password(&self, email: &str) -> Result<Value, AuthError> {
        let email = email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(AuthError::Validation("A valid email address is required".to_string()));
        }

        let response = self
            .client
            .post(
                "/auth/forgot-password",
                Some(RequestBody::Json(json!({ "email": email }))),
                RequestOptions::default(),
            )
            .await?;
        Ok(response.body)
    }

    /// Set a new password using the token from the reset link.
    pub async fn reset_password(
        &self,
        reset_token: &str,
        new_password: &str,
    ) -> Result<Value, AuthError> {
        let reset_token = reset_token.trim();
        if reset_token.is_empty() {
            return Err(AuthError::Validation("Reset token is missing".to_string()));
        }
        let reset_token = id_segment(reset_token)
            .map_err(|_| AuthError::Validation("Reset token is malformed".to_string()))?;
        if new_password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::Validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }

        let response = self
            .client
            .post(
                &format!("/auth/reset-password/{}", reset_token),
                Some(RequestBody::Json(json!({ "password": new_password }))),
                RequestOptions::default(),
            )
            .await?;
        Ok(response.body)
    }
}
