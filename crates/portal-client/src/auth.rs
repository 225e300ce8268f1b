use async_trait::async_trait;

use portal_core::ports::StaffAuthService;
use portal_core::types::{AdminCredentials, Credentials};
use portal_core::ServiceResult;

use crate::http::{token_payload, PortalClient};

#[async_trait]
impl StaffAuthService for PortalClient {
    async fn admin_login(&self, credentials: &AdminCredentials) -> ServiceResult<String> {
        let payload = self
            .send(self.post(&["admin", "login"]).json(credentials))
            .await?;
        Ok(token_payload(&payload))
    }

    async fn doctor_login(&self, credentials: &Credentials) -> ServiceResult<String> {
        let payload = self
            .send(self.post(&["doctor", "login"]).json(credentials))
            .await?;
        Ok(token_payload(&payload))
    }
}
