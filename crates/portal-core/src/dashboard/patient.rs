use tracing::warn;

use super::{message_or, DirectoryPage, FormOutcome, PageLoad, Portal};
use crate::error::{Result, ServiceFailure, ServiceResult};
use crate::session::{self, Role, SessionContext};
use crate::types::{Appointment, Credentials, PatientProfile, PatientSignup};

pub const SIGNUP_MODAL: &str = "patientSignup";
pub const LOGIN_MODAL: &str = "patientLogin";
const SIGNUP_OK: &str = "Signup successful. You can now log in.";
const SIGNUP_FAILED: &str = "Signup failed. Please try again.";
const LOGIN_FAILED: &str = "Invalid credentials. Please try again.";
const NO_PATIENT_SERVICE: &str = "Unable to reach the patient service right now. Please try again later.";

// ---------------------------------------------------------------------------
// Public patient dashboard
// ---------------------------------------------------------------------------

/// Browse and filter doctors, sign up, sign in.
pub struct PatientDashboard {
    portal: Portal,
    page: DirectoryPage,
}

impl PatientDashboard {
    pub async fn open(portal: &Portal) -> Result<PageLoad<PatientDashboard>> {
        let session = match portal.enter()? {
            PageLoad::Ready(session) => session,
            PageLoad::Redirected { notice, route } => {
                return Ok(PageLoad::Redirected { notice, route })
            }
        };
        let dashboard = PatientDashboard {
            portal: portal.clone(),
            page: DirectoryPage::build(portal, session),
        };
        dashboard.page.load().await;
        Ok(PageLoad::Ready(dashboard))
    }

    pub fn page(&self) -> &DirectoryPage {
        &self.page
    }

    pub async fn signup(&self, form: &PatientSignup) -> Result<FormOutcome> {
        let prompt = self.portal.prompt.as_ref();
        if let Err(e) = form.validate() {
            return Ok(FormOutcome::rejected(prompt, e.to_string()));
        }
        let Some(patients) = &self.portal.patients else {
            warn!("no patient service configured");
            return Ok(FormOutcome::rejected(prompt, NO_PATIENT_SERVICE));
        };

        match patients.signup(form).await {
            Ok(message) => {
                let message = message_or(&message, SIGNUP_OK);
                prompt.notify(&message);
                self.portal.modals.close_modal(SIGNUP_MODAL);
                self.page.load().await;
                Ok(FormOutcome::Saved { message })
            }
            Err(failure) => Ok(FormOutcome::rejected(
                prompt,
                message_or(&failure.message, SIGNUP_FAILED),
            )),
        }
    }

    /// Sign in and persist a `loggedPatient` session.
    pub async fn login(&self, credentials: &Credentials) -> Result<FormOutcome> {
        let prompt = self.portal.prompt.as_ref();
        if let Err(e) = credentials.validate() {
            return Ok(FormOutcome::rejected(prompt, e.to_string()));
        }
        let Some(patients) = &self.portal.patients else {
            warn!("no patient service configured");
            return Ok(FormOutcome::rejected(prompt, NO_PATIENT_SERVICE));
        };

        match patients.login(credentials).await {
            Ok(token) if !token.trim().is_empty() => {
                session::login(self.portal.store.as_ref(), Role::LoggedPatient, &token)?;
                self.portal.modals.close_modal(LOGIN_MODAL);
                Ok(FormOutcome::SignedIn {
                    route: self.portal.config.routes.logged_patient_home.clone(),
                })
            }
            Ok(_) => Ok(FormOutcome::rejected(prompt, super::staff::TOKEN_MISSING)),
            Err(failure) => Ok(FormOutcome::rejected(
                prompt,
                message_or(&failure.message, LOGIN_FAILED),
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Logged-in patient dashboard
// ---------------------------------------------------------------------------

pub struct LoggedPatientDashboard {
    portal: Portal,
    page: DirectoryPage,
}

impl LoggedPatientDashboard {
    /// Gate, fetch the profile once, then show the directory. A failed
    /// profile fetch is not fatal: booking retries it on demand.
    pub async fn open(portal: &Portal) -> Result<PageLoad<LoggedPatientDashboard>> {
        let session = match portal.enter()? {
            PageLoad::Ready(session) => session,
            PageLoad::Redirected { notice, route } => {
                return Ok(PageLoad::Redirected { notice, route })
            }
        };

        let fetched = match (&session, &portal.patients) {
            (SessionContext::LoggedPatient { token, .. }, Some(patients)) => {
                match patients.profile(token).await {
                    Ok(profile) => Some(profile),
                    Err(failure) => {
                        warn!(error = %failure, "could not load patient profile");
                        None
                    }
                }
            }
            _ => None,
        };
        let session = match fetched {
            Some(profile) => session.with_profile(profile),
            None => session,
        };

        let dashboard = LoggedPatientDashboard {
            portal: portal.clone(),
            page: DirectoryPage::build(portal, session),
        };
        dashboard.page.load().await;
        Ok(PageLoad::Ready(dashboard))
    }

    pub fn page(&self) -> &DirectoryPage {
        &self.page
    }

    pub fn profile(&self) -> Option<&PatientProfile> {
        self.page.session().profile()
    }

    fn token(&self) -> ServiceResult<&str> {
        self.page
            .session()
            .token()
            .ok_or_else(|| ServiceFailure::new(session::INVALID_SESSION_NOTICE))
    }

    /// The patient's own appointments.
    pub async fn appointments(&self) -> ServiceResult<Vec<Appointment>> {
        let token = self.token()?;
        let patients = self.patients()?;
        let id = self
            .profile()
            .and_then(|p| p.id)
            .ok_or_else(|| ServiceFailure::new("Patient profile is not available."))?;
        patients.appointments(Role::Patient, id, token).await
    }

    /// Filter by condition (e.g. `"pending"`, `"consulted"`) and/or doctor
    /// name. Blank values are unconstrained.
    pub async fn filter_appointments(
        &self,
        condition: Option<&str>,
        name: Option<&str>,
    ) -> ServiceResult<Vec<Appointment>> {
        let token = self.token()?;
        let patients = self.patients()?;
        let condition = condition.map(str::trim).filter(|s| !s.is_empty());
        let name = name.map(str::trim).filter(|s| !s.is_empty());
        patients.filter_appointments(condition, name, token).await
    }

    fn patients(&self) -> ServiceResult<&dyn crate::ports::PatientService> {
        self.portal
            .patients
            .as_deref()
            .ok_or_else(|| ServiceFailure::new(NO_PATIENT_SERVICE))
    }

    /// Drop the token; the visitor stays a public patient.
    pub fn logout(&self) -> Result<String> {
        session::logout_patient(self.portal.store.as_ref())?;
        Ok(self.portal.config.routes.patient_home.clone())
    }
}
