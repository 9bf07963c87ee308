use chrono::NaiveDate;
use serde_json::{json, Value};
use tracing::info;

use super::{id_segment, ResourceError, SlotGeneration};
use crate::api::{ApiClient, ApiError, RequestBody, RequestOptions};

/// Clinic administrator calls: doctors, slots, appointments, patient history.
pub struct AdminApi<'a> {
    client: &'a ApiClient,
}

impl<'a> AdminApi<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn list_doctors(&self) -> Result<Value, ApiError> {
        let response = self
            .client
            .get("/admin/doctors", None, RequestOptions::default())
            .await?;
        Ok(response.body)
    }

    pub async fn create_doctor(&self, doctor: Value) -> Result<Value, ApiError> {
        let response = self
            .client
            .post("/admin/doctors", Some(RequestBody::Json(doctor)), RequestOptions::default())
            .await?;
        Ok(response.body)
    }

    pub async fn update_doctor(&self, doctor_id: &str, doctor: Value) -> Result<Value, ApiError> {
        let path = format!("/admin/doctors/{}", id_segment(doctor_id)?);
        let response = self
            .client
            .put(&path, Some(RequestBody::Json(doctor)), RequestOptions::default())
            .await?;
        Ok(response.body)
    }

    pub async fn set_doctor_availability(
        &self,
        doctor_id: &str,
        available: bool,
    ) -> Result<Value, ApiError> {
        let path = format!("/admin/doctors/{}/availability", id_segment(doctor_id)?);
        let response = self
            .client
            .patch(
                &path,
                Some(RequestBody::Json(json!({ "available": available }))),
                RequestOptions::default(),
            )
            .await?;
        Ok(response.body)
    }

    pub async fn delete_doctor(&self, doctor_id: &str) -> Result<Value, ApiError> {
        let path = format!("/admin/doctors/{}", id_segment(doctor_id)?);
        let response = self
            .client
            .delete(&path, None, RequestOptions::default())
            .await?;
        Ok(response.body)
    }

    /// Slots of one doctor, optionally narrowed to a single day.
    pub async fn list_slots(
        &self,
        doctor_id: &str,
        date: Option<NaiveDate>,
    ) -> Result<Value, ApiError> {
        let path = format!("/admin/doctors/{}/slots", id_segment(doctor_id)?);
        let mut options = RequestOptions::default();
        if let Some(date) = date {
            options = options.query("date", date.format("%Y-%m-%d").to_string());
        }
        let response = self.client.get(&path, None, options).await?;
        Ok(response.body)
    }

    /// Validate the parameters locally, then hand generation to the backend.
    pub async fn generate_slots(&self, generation: &SlotGeneration) -> Result<Value, ResourceError> {
        generation.validate()?;
        id_segment(&generation.doctor_id)?;

        let response = self
            .client
            .post(
                "/admin/slots/generate",
                Some(RequestBody::Json(generation.to_payload())),
                RequestOptions::default(),
            )
            .await?;
        info!(doctor_id = %generation.doctor_id, "Slot generation submitted");
        Ok(response.body)
    }

    pub async fn delete_slot(&self, slot_id: &str) -> Result<Value, ApiError> {
        let path = format!("/admin/slots/{}", id_segment(slot_id)?);
        let response = self
            .client
            .delete(&path, None, RequestOptions::default())
            .await?;
        Ok(response.body)
    }

    pub async fn list_appointments(&self, date: Option<NaiveDate>) -> Result<Value, ApiError> {
        let mut options = RequestOptions::default();
        if let Some(date) = date {
            options = options.query("date", date.format("%Y-%m-%d").to_string());
        }
        let response = self.client.get("/admin/appointments", None, options).await?;
        Ok(response.body)
    }

    pub async fn patient_history(&self, patient_id: &str) -> Result<Value, ApiError> {
        let path = format!("/admin/patients/{}/history", id_segment(patient_id)?);
        let response = self
            .client
            .get(&path, None, RequestOptions::default())
            .await?;
        Ok(response.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::session::MemorySessionStore;
    use chrono::{NaiveTime, Weekday};
    use std::sync::Arc;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> ApiClient {
        let store = Arc::new(MemorySessionStore::with_token("abc123"));
        ApiClient::new(&ClientConfig::new(&server.uri()), store).expect("client creation")
    }

    #[tokio::test]
    async fn list_doctors_is_authenticated() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/admin/doctors"))
            .and(header("authorization", "Bearer abc123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"name": "Dr. Rao"}])))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let doctors = AdminApi::new(&client).list_doctors().await.unwrap();
        assert_eq!(doctors, json!([{"name": "Dr. Rao"}]));
    }

    #[tokio::test]
    async fn list_slots_passes_date_filter() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/admin/doctors/doc42/slots"))
            .and(query_param("date", "2025-03-07"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let date = NaiveDate::from_ymd_opt(2025, 3, 7);
        AdminApi::new(&client).list_slots("doc42", date).await.unwrap();
    }

    #[tokio::test]
    async fn generate_slots_posts_parameters() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/admin/slots/generate"))
            .and(body_json(json!({
                "doctorId": "doc42",
                "startDate": "2025-03-03",
                "endDate": "2025-03-07",
                "days": ["tue", "thu"],
                "startTime": "14:00",
                "endTime": "17:00",
                "duration": 20,
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"created": 18})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let generation = SlotGeneration {
            doctor_id: "doc42".to_string(),
            start_date: NaiveDate::from_ymd_opt(2025, 3, 3).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 3, 7).unwrap(),
            days: vec![Weekday::Tue, Weekday::Thu],
            start_time: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            slot_minutes: 20,
        };
        let created = AdminApi::new(&client).generate_slots(&generation).await.unwrap();
        assert_eq!(created, json!({"created": 18}));
    }

    #[tokio::test]
    async fn invalid_generation_never_reaches_backend() {
        let mock_server = MockServer::start().await;
        let client = client_for(&mock_server);
        let generation = SlotGeneration {
            doctor_id: "doc42".to_string(),
            start_date: NaiveDate::from_ymd_opt(2025, 3, 7).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 3, 3).unwrap(),
            days: vec![Weekday::Mon],
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            slot_minutes: 15,
        };

        let err = AdminApi::new(&client).generate_slots(&generation).await.unwrap_err();
        assert!(matches!(err, ResourceError::Invalid(_)));
        assert!(mock_server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn availability_toggle_and_history_paths() {
        let mock_server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/admin/doctors/doc42/availability"))
            .and(body_json(json!({"available": false})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"available": false})))
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/admin/patients/p-9/history"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"appointments": []})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let admin = AdminApi::new(&client);
        admin.set_doctor_availability("doc42", false).await.unwrap();
        let history = admin.patient_history("p-9").await.unwrap();
        assert_eq!(history, json!({"appointments": []}));
    }

    #[tokio::test]
    async fn bad_id_rejected_locally() {
        let mock_server = MockServer::start().await;
        let client = client_for(&mock_server);
        let err = AdminApi::new(&client).delete_doctor("1/../x").await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidRequest(_)));
    }
}
