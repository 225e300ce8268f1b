use tracing::{info, warn};

use super::{message_or, DirectoryPage, FormOutcome, PageLoad, Portal};
use crate::error::Result;
use crate::header::ADD_DOCTOR_MODAL;
use crate::session::SessionContext;
use crate::types::NewDoctor;

pub const DOCTOR_ADDED: &str = "Doctor added successfully.";
pub const MISSING_ADMIN_SESSION: &str = "Missing or invalid admin session. Please log in again.";
const ADD_FAILED: &str = "Unable to add doctor.";

pub struct AdminDashboard {
    portal: Portal,
    page: DirectoryPage,
}

impl AdminDashboard {
    /// Gate the session and show the full directory.
    pub async fn open(portal: &Portal) -> Result<PageLoad<AdminDashboard>> {
        let session = match portal.enter()? {
            PageLoad::Ready(session) => session,
            PageLoad::Redirected { notice, route } => {
                return Ok(PageLoad::Redirected { notice, route })
            }
        };
        let dashboard = AdminDashboard {
            portal: portal.clone(),
            page: DirectoryPage::build(portal, session),
        };
        dashboard.page.load().await;
        Ok(PageLoad::Ready(dashboard))
    }

    pub fn page(&self) -> &DirectoryPage {
        &self.page
    }

    /// Submit the add-doctor form. On success the modal closes and the
    /// directory reloads with the current criteria.
    pub async fn add_doctor(&self, form: &NewDoctor) -> Result<FormOutcome> {
        let prompt = self.portal.prompt.as_ref();
        let token = match self.page.session() {
            SessionContext::Admin { token } => token,
            other => {
                warn!(role = %other.role(), "add doctor without an admin session");
                return Ok(FormOutcome::rejected(prompt, MISSING_ADMIN_SESSION));
            }
        };
        if let Err(e) = form.validate() {
            return Ok(FormOutcome::rejected(prompt, e.to_string()));
        }

        match self.portal.directory.create_doctor(form, token).await {
            Ok(_) => {
                info!(name = %form.name, "doctor added");
                self.portal.modals.close_modal(ADD_DOCTOR_MODAL);
                prompt.notify(DOCTOR_ADDED);
                self.page.controller().refresh().await;
                Ok(FormOutcome::Saved {
                    message: DOCTOR_ADDED.to_string(),
                })
            }
            Err(failure) => Ok(FormOutcome::rejected(
                prompt,
                message_or(&failure.message, ADD_FAILED),
            )),
        }
    }
}
