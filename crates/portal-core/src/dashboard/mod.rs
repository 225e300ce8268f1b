//! Page orchestrators. Each `open` runs the session gate first; nothing
//! role-conditioned is built for a redirected page.

pub mod admin;
pub mod doctor;
pub mod patient;
pub mod staff;

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::actions::{ActionOutcome, CardActions};
use crate::config::PortalConfig;
use crate::epoch::Dispatch;
use crate::error::Result;
use crate::filter::FilterController;
use crate::header::{render_header, HeaderView};
use crate::ports::{
    AppointmentService, BookingOverlay, DirectoryService, ModalHost, PatientService,
    StaffAuthService, UserPrompt,
};
use crate::session::{self, GateOutcome, SessionContext, SessionStore};
use crate::types::CriteriaUpdate;
use crate::view::DirectoryBoard;

pub use admin::AdminDashboard;
pub use doctor::{AppointmentRow, AppointmentTable, DoctorDashboard, TableView};
pub use patient::{LoggedPatientDashboard, PatientDashboard};

/// Everything a page needs from its host.
#[derive(Clone)]
pub struct Portal {
    pub config: PortalConfig,
    pub store: Arc<dyn SessionStore>,
    pub prompt: Arc<dyn UserPrompt>,
    pub modals: Arc<dyn ModalHost>,
    pub directory: Arc<dyn DirectoryService>,
    pub patients: Option<Arc<dyn PatientService>>,
    pub appointments: Option<Arc<dyn AppointmentService>>,
    pub staff: Option<Arc<dyn StaffAuthService>>,
    pub overlay: Option<Arc<dyn BookingOverlay>>,
}

impl Portal {
    pub fn new(
        config: PortalConfig,
        store: Arc<dyn SessionStore>,
        prompt: Arc<dyn UserPrompt>,
        modals: Arc<dyn ModalHost>,
        directory: Arc<dyn DirectoryService>,
    ) -> Self {
        Self {
            config,
            store,
            prompt,
            modals,
            directory,
            patients: None,
            appointments: None,
            staff: None,
            overlay: None,
        }
    }

    pub fn with_patients(mut self, patients: Arc<dyn PatientService>) -> Self {
        self.patients = Some(patients);
        self
    }

    pub fn with_appointments(mut self, appointments: Arc<dyn AppointmentService>) -> Self {
        self.appointments = Some(appointments);
        self
    }

    pub fn with_staff(mut self, staff: Arc<dyn StaffAuthService>) -> Self {
        self.staff = Some(staff);
        self
    }

    pub fn with_overlay(mut self, overlay: Arc<dyn BookingOverlay>) -> Self {
        self.overlay = Some(overlay);
        self
    }

    /// Run the validity gate. On redirect the notice is shown exactly once.
    pub(crate) fn enter(&self) -> Result<PageLoad<SessionContext>> {
        match session::gate(self.store.as_ref(), &self.config.routes)? {
            GateOutcome::Proceed(ctx) => Ok(PageLoad::Ready(ctx)),
            GateOutcome::Redirect { notice, route } => {
                self.prompt.notify(&notice);
                Ok(PageLoad::Redirected { notice, route })
            }
        }
    }
}

#[derive(Debug)]
pub enum PageLoad<P> {
    Ready(P),
    Redirected { notice: String, route: String },
}

impl<P> PageLoad<P> {
    pub fn map<Q>(self, f: impl FnOnce(P) -> Q) -> PageLoad<Q> {
        match self {
            PageLoad::Ready(p) => PageLoad::Ready(f(p)),
            PageLoad::Redirected { notice, route } => PageLoad::Redirected { notice, route },
        }
    }

    pub fn ready(self) -> Option<P> {
        match self {
            PageLoad::Ready(p) => Some(p),
            PageLoad::Redirected { .. } => None,
        }
    }
}

/// Result of a form submission. The message has already been shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormOutcome {
    Saved { message: String },
    /// Signed in; the host should navigate to `route`.
    SignedIn { route: String },
    Rejected { message: String },
}

impl FormOutcome {
    pub(crate) fn rejected(prompt: &dyn UserPrompt, message: impl Into<String>) -> Self {
        let message = message.into();
        prompt.notify(&message);
        FormOutcome::Rejected { message }
    }
}

/// Server message when present, `fallback` otherwise.
pub(crate) fn message_or(message: &str, fallback: &str) -> String {
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message.to_string()
    }
}

// ---------------------------------------------------------------------------
// DirectoryPage
// ---------------------------------------------------------------------------

/// The doctor directory shared by the admin and patient dashboards.
pub struct DirectoryPage {
    session: SessionContext,
    header: HeaderView,
    board: Arc<DirectoryBoard>,
    controller: FilterController,
    actions: CardActions,
}

impl DirectoryPage {
    pub(crate) fn build(portal: &Portal, session: SessionContext) -> Self {
        let board = Arc::new(DirectoryBoard::new());
        let controller = FilterController::new(
            portal.directory.clone(),
            board.clone(),
            session.role(),
            portal.config.search_debounce(),
        );
        let mut actions = CardActions::new(session.clone(), portal.prompt.clone(), board.clone())
            .with_directory(portal.directory.clone());
        if let Some(patients) = &portal.patients {
            actions = actions.with_patients(patients.clone());
        }
        if let Some(overlay) = &portal.overlay {
            actions = actions.with_overlay(overlay.clone());
        }
        Self {
            header: render_header(&session, &portal.config.routes),
            session,
            board,
            controller,
            actions,
        }
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn header(&self) -> &HeaderView {
        &self.header
    }

    pub fn board(&self) -> &DirectoryBoard {
        &self.board
    }

    pub fn controller(&self) -> &FilterController {
        &self.controller
    }

    pub async fn load(&self) -> Dispatch {
        self.controller.load_all().await
    }

    pub fn on_criteria_changed(&self, update: CriteriaUpdate) -> Option<JoinHandle<Dispatch>> {
        self.controller.on_criteria_changed(update)
    }

    /// Press the action button on the card for `doctor_id`. `None` if no
    /// such card is shown.
    pub async fn activate(&self, doctor_id: &str) -> Option<ActionOutcome> {
        let snapshot = self.board.snapshot()?;
        let card = snapshot.cards().iter().find(|c| c.doctor_id == doctor_id)?;
        let record = self.controller.record(doctor_id)?;
        Some(self.actions.activate(card, &record).await)
    }
}
