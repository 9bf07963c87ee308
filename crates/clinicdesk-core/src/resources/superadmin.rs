use serde_json::Value;

use super::id_segment;
use crate::api::{ApiClient, ApiError, RequestBody, RequestOptions};

/// Platform-level provisioning of clinics and their administrators.
pub struct SuperAdminApi<'a> {
    client: &'a ApiClient,
}

impl<'a> SuperAdminApi<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn list_clinics(&self) -> Result<Value, ApiError> {
        let response = self
            .client
            .get("/super-admin/clinics", None, RequestOptions::default())
            .await?;
        Ok(response.body)
    }

    pub async fn create_clinic(&self, clinic: Value) -> Result<Value, ApiError> {
        let response = self
            .client
            .post("/super-admin/clinics", Some(RequestBody::Json(clinic)), RequestOptions::default())
            .await?;
        Ok(response.body)
    }

    pub async fn update_clinic(&self, clinic_id: &str, clinic: Value) -> Result<Value, ApiError> {
        let path = format!("/super-admin/clinics/{}", id_segment(clinic_id)?);
        let response = self
            .client
            .put(&path, Some(RequestBody::Json(clinic)), RequestOptions::default())
            .await?;
        Ok(response.body)
    }

    pub async fn delete_clinic(&self, clinic_id: &str) -> Result<Value, ApiError> {
        let path = format!("/super-admin/clinics/{}", id_segment(clinic_id)?);
        let response = self
            .client
            .delete(&path, None, RequestOptions::default())
            .await?;
        Ok(response.body)
    }

    pub async fn list_admins(&self) -> Result<Value, ApiError> {
        let response = self
            .client
            .get("/super-admin/admins", None, RequestOptions::default())
            .await?;
        Ok(response.body)
    }

    /// Create a clinic administrator account.
    pub async fn create_admin(&self, admin: Value) -> Result<Value, ApiError> {
        let response = self
            .client
            .post("/super-admin/admins", Some(RequestBody::Json(admin)), RequestOptions::default())
            .await?;
        Ok(response.body)
    }

    pub async fn delete_admin(&self, admin_id: &str) -> Result<Value, ApiError> {
        let path = format!("/super-admin/admins/{}", id_segment(admin_id)?);
        let response = self
            .client
            .delete(&path, None, RequestOptions::default())
            .await?;
        Ok(response.body)
    }
}
