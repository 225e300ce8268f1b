//! Boundaries between the engine and the outside world.
//!
//! Service traits are implemented over HTTP by `portal-client`; the
//! interaction traits (`UserPrompt`, `ModalHost`, `BookingOverlay`) by
//! whatever front end hosts the dashboards. Every service call returns a
//! [`ServiceResult`]: callers never see transport details.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::ServiceResult;
use crate::session::Role;
use crate::types::{
    AdminCredentials, Appointment, Credentials, DoctorRecord, FilterCriteria, NewDoctor,
    PatientProfile, PatientSignup,
};

#[async_trait]
pub trait DirectoryService: Send + Sync {
    async fn fetch_all(&self) -> ServiceResult<Vec<DoctorRecord>>;

    async fn fetch_filtered(&self, criteria: &FilterCriteria) -> ServiceResult<Vec<DoctorRecord>>;

    /// Returns the server's confirmation message.
    async fn create_doctor(&self, doctor: &NewDoctor, token: &str) -> ServiceResult<String>;

    async fn delete_doctor(&self, id: &str, token: &str) -> ServiceResult<String>;
}

#[async_trait]
pub trait PatientService: Send + Sync {
    async fn signup(&self, signup: &PatientSignup) -> ServiceResult<String>;

    /// Returns the session token.
    async fn login(&self, credentials: &Credentials) -> ServiceResult<String>;

    async fn profile(&self, token: &str) -> ServiceResult<PatientProfile>;

    async fn appointments(
        &self,
        role: Role,
        patient_id: i64,
        token: &str,
    ) -> ServiceResult<Vec<Appointment>>;

    async fn filter_appointments(
        &self,
        condition: Option<&str>,
        name: Option<&str>,
        token: &str,
    ) -> ServiceResult<Vec<Appointment>>;
}

#[async_trait]
pub trait AppointmentService: Send + Sync {
    async fn for_day(
        &self,
        date: NaiveDate,
        patient_name: Option<&str>,
        token: &str,
    ) -> ServiceResult<Vec<Appointment>>;
}

#[async_trait]
pub trait StaffAuthService: Send + Sync {
    async fn admin_login(&self, credentials: &AdminCredentials) -> ServiceResult<String>;

    async fn doctor_login(&self, credentials: &Credentials) -> ServiceResult<String>;
}

/// Blocking user interaction: confirmations and notices.
pub trait UserPrompt: Send + Sync {
    fn confirm(&self, message: &str) -> bool;

    fn notify(&self, message: &str);
}

pub trait ModalHost: Send + Sync {
    fn open_modal(&self, name: &str);

    fn close_modal(&self, name: &str);
}

pub trait BookingOverlay: Send + Sync {
    fn show(&self, doctor: &DoctorRecord, patient: &PatientProfile);
}
