use serde_json::Value;

use crate::api::{ApiClient, ApiError, RequestOptions};

/// Lookups that need no session.
pub struct PublicApi<'a> {
    client: &'a ApiClient,
}

impl<'a> PublicApi<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn list_specialities(&self) -> Result<Value, ApiError> {
        let response = self
            .client
            .get("/public/specialities", None, RequestOptions::default())
            .await?;
        Ok(response.body)
    }
}
