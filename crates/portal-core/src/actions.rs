use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::card::{BookingFlow, CardAction, CardView};
use crate::ports::{BookingOverlay, DirectoryService, PatientService, UserPrompt};
use crate::session::{Role, SessionContext};
use crate::types::DoctorRecord;
use crate::view::ListView;

pub const DELETE_FAILED: &str = "Failed to delete doctor.";
pub const LOGIN_FIRST: &str = "Patient needs to login first.";
pub const SIGN_IN_TO_BOOK: &str = "Please sign in to book.";
pub const BOOKING_FAILED: &str = "Unable to start booking. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ActionOutcome {
    /// The user declined the confirmation prompt.
    Cancelled,
    /// Card removed in place; the rest of the list is untouched.
    Removed { doctor_id: String },
    /// A message was shown to the user.
    Failed { message: String },
    SignInRequired,
    BookingOpened,
}

/// Executes the action a rendered card carries.
///
/// Every collaborator except the prompt is optional. A missing one is
/// logged and reported to the user as a failure.
pub struct CardActions {
    session: SessionContext,
    prompt: Arc<dyn UserPrompt>,
    view: Arc<dyn ListView>,
    directory: Option<Arc<dyn DirectoryService>>,
    patients: Option<Arc<dyn PatientService>>,
    overlay: Option<Arc<dyn BookingOverlay>>,
}

impl CardActions {
    pub fn new(session: SessionContext, prompt: Arc<dyn UserPrompt>, view: Arc<dyn ListView>) -> Self {
        Self {
            session,
            prompt,
            view,
            directory: None,
            patients: None,
            overlay: None,
        }
    }

    pub fn with_directory(mut self, directory: Arc<dyn DirectoryService>) -> Self {
        self.directory = Some(directory);
        self
    }

    pub fn with_patients(mut self, patients: Arc<dyn PatientService>) -> Self {
        self.patients = Some(patients);
        self
    }

    pub fn with_overlay(mut self, overlay: Arc<dyn BookingOverlay>) -> Self {
        self.overlay = Some(overlay);
        self
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub async fn activate(&self, card: &CardView, doctor: &DoctorRecord) -> ActionOutcome {
        match card.action {
            CardAction::Delete => self.delete(card, doctor).await,
            CardAction::BookNow(BookingFlow::SignInPrompt) => {
                let message = match self.session.role() {
                    Role::Patient => LOGIN_FIRST,
                    _ => SIGN_IN_TO_BOOK,
                };
                self.prompt.notify(message);
                ActionOutcome::SignInRequired
            }
            CardAction::BookNow(BookingFlow::Overlay) => self.book(doctor).await,
        }
    }

    async fn delete(&self, card: &CardView, doctor: &DoctorRecord) -> ActionOutcome {
        let question = match doctor.name.as_deref().filter(|n| !n.trim().is_empty()) {
            Some(name) => format!("Delete {name}?"),
            None => "Delete this doctor?".to_string(),
        };
        if !self.prompt.confirm(&question) {
            return ActionOutcome::Cancelled;
        }

        let Some(directory) = &self.directory else {
            warn!("no directory service for delete action");
            return self.fail(DELETE_FAILED);
        };
        let Some(token) = self.session.token() else {
            warn!(role = %self.session.role(), "delete attempted without a session token");
            return self.fail(DELETE_FAILED);
        };

        match directory.delete_doctor(&card.doctor_id, token).await {
            Ok(_) => {
                self.view.remove_card(&card.doctor_id);
                info!(doctor_id = %card.doctor_id, "doctor deleted");
                ActionOutcome::Removed {
                    doctor_id: card.doctor_id.clone(),
                }
            }
            Err(failure) if failure.message.trim().is_empty() => self.fail(DELETE_FAILED),
            Err(failure) => self.fail(&failure.message),
        }
    }

    async fn book(&self, doctor: &DoctorRecord) -> ActionOutcome {
        let Some(overlay) = &self.overlay else {
            warn!("no booking overlay available");
            return self.fail(BOOKING_FAILED);
        };

        let profile = match self.session.profile() {
            Some(profile) => profile.clone(),
            None => {
                let (Some(patients), Some(token)) = (&self.patients, self.session.token()) else {
                    warn!("cannot fetch patient profile for booking");
                    return self.fail(BOOKING_FAILED);
                };
                match patients.profile(token).await {
                    Ok(profile) => profile,
                    Err(failure) => {
                        warn!(error = %failure, "patient profile fetch failed");
                        return self.fail(BOOKING_FAILED);
                    }
                }
            }
        };

        overlay.show(doctor, &profile);
        ActionOutcome::BookingOpened
    }

    fn fail(&self, message: &str) -> ActionOutcome {
        self.prompt.notify(message);
        ActionOutcome::Failed {
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::render_card;
    use crate::error::{ServiceFailure, ServiceResult};
    use crate::types::{
        Appointment, Credentials, FilterCriteria, NewDoctor, PatientProfile, PatientSignup,
    };
    use crate::view::{DirectoryBoard, RenderedList};
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingPrompt {
        answer: bool,
        asked: Mutex<Vec<String>>,
        notices: Mutex<Vec<String>>,
    }

    impl RecordingPrompt {
        fn answering(answer: bool) -> Arc<Self> {
            Arc::new(Self {
                answer,
                ..Default::default()
            })
        }

        fn notices(&self) -> Vec<String> {
            self.notices.lock().unwrap().clone()
        }
    }

    impl UserPrompt for RecordingPrompt {
        fn confirm(&self, message: &str) -> bool {
            self.asked.lock().unwrap().push(message.to_string());
            self.answer
        }

        fn notify(&self, message: &str) {
            self.notices.lock().unwrap().push(message.to_string());
        }
    }

    struct DeletingDirectory {
        result: ServiceResult<String>,
        deleted: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl DirectoryService for DeletingDirectory {
        async fn fetch_all(&self) -> ServiceResult<Vec<DoctorRecord>> {
            unreachable!("delete must not reload")
        }

        async fn fetch_filtered(&self, _: &FilterCriteria) -> ServiceResult<Vec<DoctorRecord>> {
            unreachable!("delete must not reload")
        }

        async fn create_doctor(&self, _: &NewDoctor, _: &str) -> ServiceResult<String> {
            unreachable!()
        }

        async fn delete_doctor(&self, id: &str, token: &str) -> ServiceResult<String> {
            self.deleted
                .lock()
                .unwrap()
                .push((id.to_string(), token.to_string()));
            self.result.clone()
        }
    }

    struct ProfilePatients(ServiceResult<PatientProfile>);

    #[async_trait]
    impl PatientService for ProfilePatients {
        async fn signup(&self, _: &PatientSignup) -> ServiceResult<String> {
            unreachable!()
        }

        async fn login(&self, _: &Credentials) -> ServiceResult<String> {
            unreachable!()
        }

        async fn profile(&self, _: &str) -> ServiceResult<PatientProfile> {
            self.0.clone()
        }

        async fn appointments(&self, _: Role, _: i64, _: &str) -> ServiceResult<Vec<Appointment>> {
            unreachable!()
        }

        async fn filter_appointments(
            &self,
            _: Option<&str>,
            _: Option<&str>,
            _: &str,
        ) -> ServiceResult<Vec<Appointment>> {
            unreachable!()
        }
    }

    #[derive(Default)]
    struct RecordingOverlay {
        shown: Mutex<Vec<(String, String)>>,
    }

    impl BookingOverlay for RecordingOverlay {
        fn show(&self, doctor: &DoctorRecord, patient: &PatientProfile) {
            self.shown
                .lock()
                .unwrap()
                .push((doctor.id.clone(), patient.name.clone()));
        }
    }

    fn admin() -> SessionContext {
        SessionContext::Admin {
            token: "T".into(),
        }
    }

    fn logged_patient() -> SessionContext {
        SessionContext::LoggedPatient {
            token: "P".into(),
            profile: None,
        }
    }

    fn board_with(records: &[DoctorRecord], role: Role) -> Arc<DirectoryBoard> {
        let board = Arc::new(DirectoryBoard::new());
        board.replace(RenderedList::Cards {
            cards: records.iter().map(|r| render_card(r, role).unwrap()).collect(),
        });
        board
    }

    #[tokio::test]
    async fn admin_delete_removes_only_that_card() {
        let records = [DoctorRecord::new("d1", "Dr. Lee"), DoctorRecord::new("d2", "Dr. Kim")];
        let board = board_with(&records, Role::Admin);
        let prompt = RecordingPrompt::answering(true);
        let directory = Arc::new(DeletingDirectory {
            result: Ok("Doctor deleted successfully".into()),
            deleted: Mutex::new(vec![]),
        });
        let actions = CardActions::new(admin(), prompt.clone(), board.clone())
            .with_directory(directory.clone());

        let card = render_card(&records[0], Role::Admin).unwrap();
        let outcome = actions.activate(&card, &records[0]).await;

        assert_eq!(outcome, ActionOutcome::Removed { doctor_id: "d1".into() });
        assert_eq!(board.card_ids(), vec!["d2"]);
        assert_eq!(board.render_count(), 1);
        assert_eq!(*directory.deleted.lock().unwrap(), vec![("d1".to_string(), "T".to_string())]);
        assert_eq!(*prompt.asked.lock().unwrap(), vec!["Delete Dr. Lee?"]);
        assert!(prompt.notices().is_empty());
    }

    #[tokio::test]
    async fn declined_delete_calls_nothing() {
        let records = [DoctorRecord::new("d1", "Dr. Lee")];
        let board = board_with(&records, Role::Admin);
        let directory = Arc::new(DeletingDirectory {
            result: Ok(String::new()),
            deleted: Mutex::new(vec![]),
        });
        let actions = CardActions::new(admin(), RecordingPrompt::answering(false), board.clone())
            .with_directory(directory.clone());
        let card = render_card(&records[0], Role::Admin).unwrap();

        assert_eq!(actions.activate(&card, &records[0]).await, ActionOutcome::Cancelled);
        assert!(directory.deleted.lock().unwrap().is_empty());
        assert_eq!(board.card_ids(), vec!["d1"]);
    }

    #[tokio::test]
    async fn failed_delete_shows_server_message_and_keeps_card() {
        let records = [DoctorRecord::new("d1", "Dr. Lee")];
        let board = board_with(&records, Role::Admin);
        let prompt = RecordingPrompt::answering(true);
        let directory = Arc::new(DeletingDirectory {
            result: Err(ServiceFailure::with_status("Doctor not found", 404)),
            deleted: Mutex::new(vec![]),
        });
        let actions = CardActions::new(admin(), prompt.clone(), board.clone()).with_directory(directory);
        let card = render_card(&records[0], Role::Admin).unwrap();

        let outcome = actions.activate(&card, &records[0]).await;
        assert_eq!(outcome, ActionOutcome::Failed { message: "Doctor not found".into() });
        assert_eq!(prompt.notices(), vec!["Doctor not found"]);
        assert_eq!(board.card_ids(), vec!["d1"]);
    }

    #[tokio::test]
    async fn missing_directory_is_a_visible_failure() {
        let record = DoctorRecord::new("d1", "");
        let board = board_with(std::slice::from_ref(&record), Role::Admin);
        let prompt = RecordingPrompt::answering(true);
        let actions = CardActions::new(admin(), prompt.clone(), board);
        let card = render_card(&record, Role::Admin).unwrap();

        assert_eq!(
            actions.activate(&card, &record).await,
            ActionOutcome::Failed { message: DELETE_FAILED.into() }
        );
        assert_eq!(*prompt.asked.lock().unwrap(), vec!["Delete this doctor?"]);
    }

    #[tokio::test]
    async fn public_roles_are_asked_to_sign_in() {
        let record = DoctorRecord::new("d1", "Dr. Lee");
        for (ctx, expected) in [
            (SessionContext::Patient, LOGIN_FIRST),
            (SessionContext::Unauthenticated, SIGN_IN_TO_BOOK),
            (SessionContext::Doctor { token: "D".into() }, SIGN_IN_TO_BOOK),
        ] {
            let role = ctx.role();
            let prompt = RecordingPrompt::answering(true);
            let actions = CardActions::new(ctx, prompt.clone(), Arc::new(DirectoryBoard::new()));
            let card = render_card(&record, role).unwrap();
            assert_eq!(actions.activate(&card, &record).await, ActionOutcome::SignInRequired);
            assert_eq!(prompt.notices(), vec![expected]);
        }
    }

    #[tokio::test]
    async fn logged_patient_opens_overlay_with_profile() {
        let record = DoctorRecord::new("d1", "Dr. Lee");
        let overlay = Arc::new(RecordingOverlay::default());
        let profile = PatientProfile {
            name: "Ann".into(),
            ..Default::default()
        };
        let actions = CardActions::new(
            logged_patient(),
            RecordingPrompt::answering(true),
            Arc::new(DirectoryBoard::new()),
        )
        .with_patients(Arc::new(ProfilePatients(Ok(profile))))
        .with_overlay(overlay.clone());
        let card = render_card(&record, Role::LoggedPatient).unwrap();

        assert_eq!(actions.activate(&card, &record).await, ActionOutcome::BookingOpened);
        assert_eq!(*overlay.shown.lock().unwrap(), vec![("d1".to_string(), "Ann".to_string())]);
    }

    #[tokio::test]
    async fn cached_profile_skips_fetch() {
        let record = DoctorRecord::new("d1", "Dr. Lee");
        let overlay = Arc::new(RecordingOverlay::default());
        let ctx = logged_patient().with_profile(PatientProfile {
            name: "Cached".into(),
            ..Default::default()
        });
        let actions = CardActions::new(ctx, RecordingPrompt::answering(true), Arc::new(DirectoryBoard::new()))
            .with_overlay(overlay.clone());
        let card = render_card(&record, Role::LoggedPatient).unwrap();

        assert_eq!(actions.activate(&card, &record).await, ActionOutcome::BookingOpened);
        assert_eq!(overlay.shown.lock().unwrap()[0].1, "Cached");
    }

    #[tokio::test]
    async fn profile_failure_shows_generic_retry() {
        let record = DoctorRecord::new("d1", "Dr. Lee");
        let prompt = RecordingPrompt::answering(true);
        let overlay = Arc::new(RecordingOverlay::default());
        let actions = CardActions::new(logged_patient(), prompt.clone(), Arc::new(DirectoryBoard::new()))
            .with_patients(Arc::new(ProfilePatients(Err(ServiceFailure::with_status("nope", 401)))))
            .with_overlay(overlay.clone());
        let card = render_card(&record, Role::LoggedPatient).unwrap();

        assert_eq!(
            actions.activate(&card, &record).await,
            ActionOutcome::Failed { message: BOOKING_FAILED.into() }
        );
        assert_eq!(prompt.notices(), vec![BOOKING_FAILED]);
        assert!(overlay.shown.lock().unwrap().is_empty());
    }
}
