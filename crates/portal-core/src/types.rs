use chrono::NaiveDateTime;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::OnceLock;

use crate::error::{PortalError, Result};

/// Path segment the backend reads as "no constraint".
pub const NULL_SEGMENT: &str = "null";

// ---------------------------------------------------------------------------
// DoctorRecord
// ---------------------------------------------------------------------------

/// One entry of the doctor directory, as received from the Directory Service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoctorRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub availability: Vec<String>,
}

impl DoctorRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: Some(name.into()),
            specialty: None,
            email: None,
            availability: Vec::new(),
        }
    }

    pub fn with_specialty(mut self, specialty: impl Into<String>) -> Self {
        self.specialty = Some(specialty.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_availability<I, S>(mut self, slots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.availability = slots.into_iter().map(Into::into).collect();
        self
    }

    /// Decode one wire element without ever failing.
    ///
    /// Numeric ids are kept in decimal form. Anything the renderer must
    /// reject survives as an empty id or a blank slot label, so a response
    /// of N elements always yields N records.
    pub fn from_value(value: &Value) -> Self {
        let id = match value.get("id") {
            Some(Value::String(s)) => s.trim().to_string(),
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        };

        let text = |keys: &[&str]| {
            keys.iter()
                .find_map(|k| value.get(*k).and_then(Value::as_str))
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let availability = match value
            .get("availability")
            .or_else(|| value.get("availableTimes"))
        {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| item.as_str().unwrap_or("").trim().to_string())
                .collect(),
            Some(_) => vec![String::new()],
        };

        Self {
            id,
            name: text(&["name"]),
            specialty: text(&["specialty", "specialization", "speciality"]),
            email: text(&["email"]),
            availability,
        }
    }
}

// ---------------------------------------------------------------------------
// FilterCriteria
// ---------------------------------------------------------------------------

/// Trim a filter value; blank and unset both mean "no constraint".
pub fn normalize_filter(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Current directory filter. Fields are always stored normalized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterCriteria {
    search: Option<String>,
    time: Option<String>,
    specialty: Option<String>,
}

impl FilterCriteria {
    pub fn new(search: Option<&str>, time: Option<&str>, specialty: Option<&str>) -> Self {
        Self {
            search: normalize_filter(search),
            time: normalize_filter(time),
            specialty: normalize_filter(specialty),
        }
    }

    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    pub fn time(&self) -> Option<&str> {
        self.time.as_deref()
    }

    pub fn specialty(&self) -> Option<&str> {
        self.specialty.as_deref()
    }

    pub fn is_unconstrained(&self) -> bool {
        self.search.is_none() && self.time.is_none() && self.specialty.is_none()
    }

    /// Merge a partial update. Fields the update leaves out are kept.
    pub fn apply(&mut self, update: &CriteriaUpdate) {
        if let Some(v) = &update.search {
            self.search = normalize_filter(Some(v));
        }
        if let Some(v) = &update.time {
            self.time = normalize_filter(Some(v));
        }
        if let Some(v) = &update.specialty {
            self.specialty = normalize_filter(Some(v));
        }
    }

    /// `[name, time, specialty]` with unconstrained slots as [`NULL_SEGMENT`].
    pub fn segments(&self) -> [&str; 3] {
        [
            self.search().unwrap_or(NULL_SEGMENT),
            self.time().unwrap_or(NULL_SEGMENT),
            self.specialty().unwrap_or(NULL_SEGMENT),
        ]
    }
}

/// A requested change to [`FilterCriteria`]. `None` leaves a field untouched;
/// `Some("")` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CriteriaUpdate {
    pub search: Option<String>,
    pub time: Option<String>,
    pub specialty: Option<String>,
}

impl CriteriaUpdate {
    pub fn search(value: impl Into<String>) -> Self {
        Self {
            search: Some(value.into()),
            ..Default::default()
        }
    }

    pub fn time(value: impl Into<String>) -> Self {
        Self {
            time: Some(value.into()),
            ..Default::default()
        }
    }

    pub fn specialty(value: impl Into<String>) -> Self {
        Self {
            specialty: Some(value.into()),
            ..Default::default()
        }
    }

    pub fn with_time(mut self, value: impl Into<String>) -> Self {
        self.time = Some(value.into());
        self
    }

    pub fn with_specialty(mut self, value: impl Into<String>) -> Self {
        self.specialty = Some(value.into());
        self
    }

    /// Free-text edits arrive as keystrokes and are debounced.
    pub fn touches_search(&self) -> bool {
        self.search.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.search.is_none() && self.time.is_none() && self.specialty.is_none()
    }
}

// ---------------------------------------------------------------------------
// Patients and appointments
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientProfile {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Other(i32),
}

impl From<i32> for AppointmentStatus {
    fn from(code: i32) -> Self {
        match code {
            0 => AppointmentStatus::Scheduled,
            1 => AppointmentStatus::Completed,
            n => AppointmentStatus::Other(n),
        }
    }
}

impl From<AppointmentStatus> for i32 {
    fn from(status: AppointmentStatus) -> Self {
        match status {
            AppointmentStatus::Scheduled => 0,
            AppointmentStatus::Completed => 1,
            AppointmentStatus::Other(n) => n,
        }
    }
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppointmentStatus::Scheduled => write!(f, "scheduled"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Other(n) => write!(f, "status {n}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub doctor_id: Option<i64>,
    #[serde(default)]
    pub doctor_name: Option<String>,
    #[serde(default)]
    pub patient_id: Option<i64>,
    #[serde(default)]
    pub patient_name: Option<String>,
    #[serde(default)]
    pub patient_email: Option<String>,
    #[serde(default)]
    pub patient_phone: Option<String>,
    #[serde(default)]
    pub patient_address: Option<String>,
    #[serde(default)]
    pub appointment_time: Option<NaiveDateTime>,
    #[serde(default = "default_status")]
    pub status: AppointmentStatus,
}

fn default_status() -> AppointmentStatus {
    AppointmentStatus::Scheduled
}

// ---------------------------------------------------------------------------
// Form payloads
// ---------------------------------------------------------------------------

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
static MOBILE_RE: OnceLock<Regex> = OnceLock::new();

fn email_re() -> &'static Regex {
    EMAIL_RE.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap())
}

fn mobile_re() -> &'static Regex {
    MOBILE_RE.get_or_init(|| Regex::new(r"^\d{10}$").unwrap())
}

/// Body of `POST /doctor`, collected from the add-doctor form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDoctor {
    pub name: String,
    pub specialty: String,
    pub email: String,
    pub password: String,
    pub mobile: String,
    pub availability: Vec<String>,
}

impl NewDoctor {
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(PortalError::Validation(msg.to_string()));
        if self.name.trim().is_empty() {
            return invalid("Doctor name is required.");
        }
        if !email_re().is_match(self.email.trim()) {
            return invalid("A valid email address is required.");
        }
        if self.password.len() < 6 {
            return invalid("Password must be at least 6 characters.");
        }
        if !mobile_re().is_match(self.mobile.trim()) {
            return invalid("Phone number must be 10 digits.");
        }
        if self.availability.iter().all(|s| s.trim().is_empty()) {
            return invalid("Select at least one availability slot.");
        }
        Ok(())
    }
}

/// Login payload for doctors and patients.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into().trim().to_string(),
            password: password.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.email.is_empty() || self.password.is_empty() {
            return Err(PortalError::Validation(
                "Please enter both email and password.".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminCredentials {
    pub username: String,
    pub password: String,
}

impl AdminCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into().trim().to_string(),
            password: password.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.username.is_empty() || self.password.is_empty() {
            return Err(PortalError::Validation(
                "Please enter both username and password.".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientSignup {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: String,
    pub address: String,
}

impl PatientSignup {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(PortalError::Validation("Name is required.".into()));
        }
        if !email_re().is_match(self.email.trim()) {
            return Err(PortalError::Validation(
                "A valid email address is required.".into(),
            ));
        }
        if self.password.is_empty() {
            return Err(PortalError::Validation("Password is required.".into()));
        }
        if !self.phone.trim().is_empty() && !mobile_re().is_match(self.phone.trim()) {
            return Err(PortalError::Validation(
                "Phone number must be 10 digits.".into(),
            ));
        }
        Ok(())
    }
}
