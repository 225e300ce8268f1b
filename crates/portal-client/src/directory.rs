use async_trait::async_trait;
use tracing::debug;

use portal_core::ports::DirectoryService;
use portal_core::types::{DoctorRecord, FilterCriteria, NewDoctor};
use portal_core::{ServiceFailure, ServiceResult};

use crate::http::{bearer, list_payload, server_message, PortalClient};

pub const DOCTOR_ID_REQUIRED: &str = "Doctor id is required.";

fn doctors(payload: serde_json::Value) -> Vec<DoctorRecord> {
    list_payload(payload, "doctors")
        .iter()
        .map(DoctorRecord::from_value)
        .collect()
}

#[async_trait]
impl DirectoryService for PortalClient {
    async fn fetch_all(&self) -> ServiceResult<Vec<DoctorRecord>> {
        let payload = self.send(self.get(&["doctor"])).await?;
        Ok(doctors(payload))
    }

    async fn fetch_filtered(&self, criteria: &FilterCriteria) -> ServiceResult<Vec<DoctorRecord>> {
        let [name, time, specialty] = criteria.segments();
        debug!(name, time, specialty, "filtering doctors");
        let payload = self
            .send(self.get(&["doctor", "filter", name, time, specialty]))
            .await?;
        Ok(doctors(payload))
    }

    async fn create_doctor(&self, doctor: &NewDoctor, token: &str) -> ServiceResult<String> {
        let request = bearer(self.post(&["doctor"]), token).json(doctor);
        let payload = self.send(request).await?;
        Ok(server_message(&payload).unwrap_or_default())
    }

    async fn delete_doctor(&self, id: &str, token: &str) -> ServiceResult<String> {
        let id = id.trim();
        if id.is_empty() {
            return Err(ServiceFailure::new(DOCTOR_ID_REQUIRED));
        }
        let payload = self.send(bearer(self.delete(&["doctor", id]), token)).await?;
        Ok(server_message(&payload).unwrap_or_default())
    }
}
