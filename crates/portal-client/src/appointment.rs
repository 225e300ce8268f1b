use async_trait::async_trait;
use chrono::NaiveDate;

use portal_core::ports::AppointmentService;
use portal_core::types::Appointment;
use portal_core::ServiceResult;

use crate::http::{segment, PortalClient};
use crate::patient::appointments;

#[async_trait]
impl AppointmentService for PortalClient {
    /// The doctor's appointments on `date`. The token travels in the path.
    async fn for_day(
        &self,
        date: NaiveDate,
        patient_name: Option<&str>,
        token: &str,
    ) -> ServiceResult<Vec<Appointment>> {
        let date = date.format("%Y-%m-%d").to_string();
        let request = self.get(&["appointments", &date, segment(patient_name), token]);
        Ok(appointments(self.send(request).await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;
    use std::time::Duration;

    #[tokio::test]
    async fn day_query_path() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/appointments/2024-05-01/Ann/D")
            .with_body(r#"[{"id": 1, "patientName": "Ann"}]"#)
            .create_async()
            .await;
        let c = PortalClient::new(&server.url(), Duration::from_secs(5)).unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let list = c.for_day(day, Some(" Ann "), "D").await.unwrap();
        mock.assert_async().await;
        assert_eq!(list[0].patient_name.as_deref(), Some("Ann"));
    }

    #[tokio::test]
    async fn unfiltered_name_is_null() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/appointments/2024-05-01/null/D")
            .with_body(r#"{"appointments": []}"#)
            .create_async()
            .await;
        let c = PortalClient::new(&server.url(), Duration::from_secs(5)).unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert!(c.for_day(day, None, "D").await.unwrap().is_empty());
        mock.assert_async().await;
    }
}
