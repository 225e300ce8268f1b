use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use portal_core::ports::PatientService;
use portal_core::session::Role;
use portal_core::types::{Appointment, Credentials, PatientProfile, PatientSignup};
use portal_core::{ServiceFailure, ServiceResult};

use crate::http::{bearer, list_payload, segment, server_message, token_payload, PortalClient};

/// Decode each element on its own; undecodable ones are skipped.
pub(crate) fn appointments(payload: Value) -> Vec<Appointment> {
    list_payload(payload, "appointments")
        .into_iter()
        .enumerate()
        .filter_map(|(position, item)| match serde_json::from_value(item) {
            Ok(appointment) => Some(appointment),
            Err(e) => {
                warn!(position, error = %e, "skipping undecodable appointment");
                None
            }
        })
        .collect()
}

#[async_trait]
impl PatientService for PortalClient {
    async fn signup(&self, signup: &PatientSignup) -> ServiceResult<String> {
        let payload = self
            .send(self.post(&["patient", "signup"]).json(signup))
            .await?;
        Ok(server_message(&payload).unwrap_or_default())
    }

    async fn login(&self, credentials: &Credentials) -> ServiceResult<String> {
        let payload = self
            .send(self.post(&["patient", "login"]).json(credentials))
            .await?;
        Ok(token_payload(&payload))
    }

    async fn profile(&self, token: &str) -> ServiceResult<PatientProfile> {
        let payload = self.send(bearer(self.get(&["patient", "me"]), token)).await?;
        let body = match payload {
            Value::Object(mut map) if map.get("patient").is_some_and(Value::is_object) => {
                map.remove("patient").unwrap_or_default()
            }
            other => other,
        };
        serde_json::from_value(body).map_err(|e| {
            warn!(error = %e, "undecodable patient profile");
            ServiceFailure::new("Unable to read patient details.")
        })
    }

    async fn appointments(
        &self,
        role: Role,
        patient_id: i64,
        token: &str,
    ) -> ServiceResult<Vec<Appointment>> {
        let id = patient_id.to_string();
        let request = bearer(
            self.get(&["patient", role.as_tag(), &id, "appointments"]),
            token,
        );
        Ok(appointments(self.send(request).await?))
    }

    async fn filter_appointments(
        &self,
        condition: Option<&str>,
        name: Option<&str>,
        token: &str,
    ) -> ServiceResult<Vec<Appointment>> {
        let request = bearer(
            self.get(&[
                "patient",
                "appointments",
                "filter",
                segment(condition),
                segment(name),
            ]),
            token,
        );
        Ok(appointments(self.send(request).await?))
    }
}
