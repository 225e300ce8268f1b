use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{Local, NaiveDate};
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{PageLoad, Portal};
use crate::epoch::{Dispatch, Epoch, QueryEpochGuard};
use crate::error::{RenderFailure, Result, ServiceFailure, ServiceResult};
use crate::header::{render_header, HeaderView};
use crate::ports::AppointmentService;
use crate::scheduler::Scheduler;
use crate::session::{self, SessionContext};
use crate::types::{normalize_filter, Appointment, AppointmentStatus};

pub const NO_APPOINTMENTS: &str = "No Appointments found for today";
pub const APPOINTMENTS_FAILED: &str = "Unable to load appointments. Please try again later.";

const NAME_TIMER: &str = "patient-name";

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppointmentRow {
    pub appointment_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<i64>,
    pub patient_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// `HH:MM`, local to the appointment's date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    pub status: AppointmentStatus,
}

pub fn render_row(appointment: &Appointment) -> std::result::Result<AppointmentRow, RenderFailure> {
    let id = appointment.id.ok_or(RenderFailure::MissingId)?;
    let patient_name = appointment
        .patient_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or(RenderFailure::MissingPatient(id))?;

    Ok(AppointmentRow {
        appointment_id: id,
        patient_id: appointment.patient_id,
        patient_name: patient_name.to_string(),
        phone: appointment.patient_phone.clone(),
        email: appointment.patient_email.clone(),
        time: appointment
            .appointment_time
            .map(|t| t.format("%H:%M").to_string()),
        status: appointment.status,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TableView {
    Rows { rows: Vec<AppointmentRow> },
    /// Full-width single-row message.
    Message { message: String },
}

impl TableView {
    fn from_result(result: ServiceResult<Vec<Appointment>>) -> TableView {
        match result {
            Ok(list) if list.is_empty() => TableView::Message {
                message: NO_APPOINTMENTS.to_string(),
            },
            Ok(list) => TableView::Rows {
                rows: list
                    .iter()
                    .filter_map(|a| match render_row(a) {
                        Ok(row) => Some(row),
                        Err(e) => {
                            warn!(error = %e, "skipping appointment row");
                            None
                        }
                    })
                    .collect(),
            },
            Err(failure) => {
                warn!(error = %failure, "appointment query failed");
                TableView::Message {
                    message: APPOINTMENTS_FAILED.to_string(),
                }
            }
        }
    }
}

/// The patient table body.
#[derive(Debug, Default)]
pub struct AppointmentTable {
    view: Mutex<Option<TableView>>,
}

impl AppointmentTable {
    pub fn snapshot(&self) -> Option<TableView> {
        self.view.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    fn replace(&self, view: TableView) {
        *self.view.lock().unwrap_or_else(|p| p.into_inner()) = Some(view);
    }
}

// ---------------------------------------------------------------------------
// DoctorDashboard
// ---------------------------------------------------------------------------

struct Shared {
    date: Mutex<NaiveDate>,
    patient_name: Mutex<Option<String>>,
    epoch: QueryEpochGuard,
    service: Option<Arc<dyn AppointmentService>>,
    token: Option<String>,
    table: AppointmentTable,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|p| p.into_inner())
}

impl Shared {
    fn begin(&self) -> (Epoch, NaiveDate, Option<String>) {
        let date = *lock(&self.date);
        let name = lock(&self.patient_name).clone();
        (self.epoch.advance(), date, name)
    }

    async fn run(&self, epoch: Epoch, date: NaiveDate, name: Option<String>) -> Dispatch {
        debug!(epoch = epoch.value(), %date, name = ?name, "loading appointments");
        let result = match (&self.service, &self.token) {
            (Some(service), Some(token)) => service.for_day(date, name.as_deref(), token).await,
            (None, _) => {
                warn!("no appointment service configured");
                Err(ServiceFailure::new(APPOINTMENTS_FAILED))
            }
            (_, None) => Err(ServiceFailure::new(session::INVALID_SESSION_NOTICE)),
        };

        let dispatch = if self.epoch.is_current(epoch) {
            let view = TableView::from_result(result);
            self.epoch.commit(epoch, || self.table.replace(view))
        } else {
            Dispatch::Stale(epoch)
        };
        if !dispatch.is_rendered() {
            debug!(epoch = epoch.value(), "discarding stale appointment response");
        }
        dispatch
    }
}

/// Appointments for one day, searchable by patient name.
pub struct DoctorDashboard {
    portal: Portal,
    header: HeaderView,
    shared: Arc<Shared>,
    scheduler: Scheduler<&'static str>,
    debounce: Duration,
}

impl DoctorDashboard {
    /// Gate, then show today's appointments.
    pub async fn open(portal: &Portal) -> Result<PageLoad<DoctorDashboard>> {
        Self::open_on(portal, Local::now().date_naive()).await
    }

    pub async fn open_on(portal: &Portal, date: NaiveDate) -> Result<PageLoad<DoctorDashboard>> {
        let session = match portal.enter()? {
            PageLoad::Ready(session) => session,
            PageLoad::Redirected { notice, route } => {
                return Ok(PageLoad::Redirected { notice, route })
            }
        };
        let token = match &session {
            SessionContext::Doctor { token } => Some(token.clone()),
            other => {
                warn!(role = %other.role(), "doctor dashboard opened without a doctor session");
                None
            }
        };

        let dashboard = DoctorDashboard {
            header: render_header(&session, &portal.config.routes),
            portal: portal.clone(),
            shared: Arc::new(Shared {
                date: Mutex::new(date),
                patient_name: Mutex::new(None),
                epoch: QueryEpochGuard::new(),
                service: portal.appointments.clone(),
                token,
                table: AppointmentTable::default(),
            }),
            scheduler: Scheduler::new(),
            debounce: portal.config.search_debounce(),
        };
        dashboard.load().await;
        Ok(PageLoad::Ready(dashboard))
    }

    pub fn header(&self) -> &HeaderView {
        &self.header
    }

    pub fn table(&self) -> Option<TableView> {
        self.shared.table.snapshot()
    }

    pub fn date(&self) -> NaiveDate {
        *lock(&self.shared.date)
    }

    pub fn patient_name(&self) -> Option<String> {
        lock(&self.shared.patient_name).clone()
    }

    pub async fn load(&self) -> Dispatch {
        let (epoch, date, name) = self.shared.begin();
        self.shared.run(epoch, date, name).await
    }

    /// Patient-name search box; debounced like the directory search.
    pub fn on_search(&self, text: &str) {
        *lock(&self.shared.patient_name) = normalize_filter(Some(text));
        let shared = self.shared.clone();
        self.scheduler.schedule(NAME_TIMER, self.debounce, async move {
            let (epoch, date, name) = shared.begin();
            shared.run(epoch, date, name).await;
        });
    }

    /// Enter in the search box: query now, dropping any pending keystroke timer.
    pub async fn submit_search(&self, text: &str) -> Dispatch {
        *lock(&self.shared.patient_name) = normalize_filter(Some(text));
        self.scheduler.cancel(&NAME_TIMER);
        self.load().await
    }

    /// Date picker change. Loads at once and supersedes a pending search.
    pub fn select_date(&self, date: NaiveDate) -> JoinHandle<Dispatch> {
        *lock(&self.shared.date) = date;
        self.scheduler.cancel(&NAME_TIMER);
        let (epoch, date, name) = self.shared.begin();
        let shared = self.shared.clone();
        tokio::spawn(async move { shared.run(epoch, date, name).await })
    }

    pub fn show_today(&self) -> JoinHandle<Dispatch> {
        self.select_date(Local::now().date_naive())
    }

    pub fn logout(&self) -> Result<String> {
        session::logout(self.portal.store.as_ref())?;
        Ok(self.portal.config.routes.home.clone())
    }
}
