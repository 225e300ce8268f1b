//! Reqwest-backed implementations of the portal service ports.
//!
//! A single [`PortalClient`] implements [`DirectoryService`],
//! [`PatientService`], [`AppointmentService`] and [`StaffAuthService`].
//!
//! [`DirectoryService`]: portal_core::ports::DirectoryService
//! [`PatientService`]: portal_core::ports::PatientService
//! [`AppointmentService`]: portal_core::ports::AppointmentService
//! [`StaffAuthService`]: portal_core::ports::StaffAuthService

mod appointment;
mod auth;
mod directory;
pub mod error;
mod http;
mod patient;

pub use directory::DOCTOR_ID_REQUIRED;
pub use error::ClientError;
pub use http::{PortalClient, INVALID_JSON, NETWORK_ERROR};
