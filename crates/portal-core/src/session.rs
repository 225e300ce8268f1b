use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde::Serialize;
use tracing::{info, warn};

use crate::config::Routes;
use crate::error::{PortalError, Result};
use crate::types::PatientProfile;
use crate::{io, paths};

pub const ROLE_KEY: &str = "userRole";
pub const TOKEN_KEY: &str = "token";
pub const AUTH_TOKEN_KEY: &str = "authToken";
pub const ADMIN_TOKEN_KEY: &str = "adminToken";
pub const DOCTOR_TOKEN_KEY: &str = "doctorToken";
pub const PATIENT_TOKEN_KEY: &str = "patientToken";

const ALL_TOKEN_KEYS: [&str; 5] = [
    TOKEN_KEY,
    AUTH_TOKEN_KEY,
    ADMIN_TOKEN_KEY,
    DOCTOR_TOKEN_KEY,
    PATIENT_TOKEN_KEY,
];

pub const INVALID_SESSION_NOTICE: &str = "Session expired or invalid login. Please log in again.";

// ─── Role ─────────────────────────────────────────────────────────────────

/// Capability class of the acting user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    Unauthenticated,
    Patient,
    LoggedPatient,
    Doctor,
    Admin,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Unauthenticated,
        Role::Patient,
        Role::LoggedPatient,
        Role::Doctor,
        Role::Admin,
    ];

    pub fn as_tag(&self) -> &'static str {
        match self {
            Role::Unauthenticated => "unauthenticated",
            Role::Patient => "patient",
            Role::LoggedPatient => "loggedPatient",
            Role::Doctor => "doctor",
            Role::Admin => "admin",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Role> {
        match tag.trim() {
            "unauthenticated" => Some(Role::Unauthenticated),
            "patient" => Some(Role::Patient),
            "loggedPatient" => Some(Role::LoggedPatient),
            "doctor" => Some(Role::Doctor),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    /// Roles that must carry a token.
    pub fn is_privileged(&self) -> bool {
        matches!(self, Role::LoggedPatient | Role::Doctor | Role::Admin)
    }

    fn token_alias(&self) -> Option<&'static str> {
        match self {
            Role::Admin => Some(ADMIN_TOKEN_KEY),
            Role::Doctor => Some(DOCTOR_TOKEN_KEY),
            Role::LoggedPatient => Some(PATIENT_TOKEN_KEY),
            Role::Unauthenticated | Role::Patient => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_tag())
    }
}

// ─── SessionStore ─────────────────────────────────────────────────────────

/// String key-value storage for session state. No expiry.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// Process-local store, used by tests and embedders without a filesystem.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let values = entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self {
            values: Mutex::new(values),
        }
    }

    fn values(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.values.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.values().remove(key);
        Ok(())
    }
}

/// Persists each session key as a file under `<root>/.medportal/session/`.
///
/// The directory is created lazily on the first `set`. Values are trimmed on
/// read; an empty file reads as absent.
pub struct FileSessionStore {
    root: PathBuf,
}

impl FileSessionStore {
    pub fn new(root: &Path) -> Self {
        FileSessionStore {
            root: root.to_path_buf(),
        }
    }

    pub fn dir(&self) -> PathBuf {
        paths::session_dir(&self.root)
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: &str) -> Option<String> {
        std::fs::read_to_string(paths::session_key_file(&self.root, key))
            .ok()
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        io::atomic_write(&paths::session_key_file(&self.root, key), value.as_bytes())
    }

    fn remove(&self, key: &str) -> Result<()> {
        io::remove_if_exists(&paths::session_key_file(&self.root, key))
    }
}

// ─── SessionContext ───────────────────────────────────────────────────────

/// The resolved session, passed explicitly into renderers and orchestrators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionContext {
    Unauthenticated,
    Patient,
    LoggedPatient {
        token: String,
        profile: Option<PatientProfile>,
    },
    Doctor {
        token: String,
    },
    Admin {
        token: String,
    },
}

impl SessionContext {
    /// Read role and token from `store`.
    ///
    /// A missing role tag resolves to the public patient role. An
    /// unrecognised tag also degrades to the public patient role, with a
    /// warning. A privileged role without a token is
    /// [`PortalError::SessionInvalid`].
    pub fn resolve(store: &dyn SessionStore) -> Result<SessionContext> {
        let role = match store.get(ROLE_KEY) {
            None => Role::Patient,
            Some(tag) => Role::from_tag(&tag).unwrap_or_else(|| {
                warn!(tag = %tag, "unknown role tag in session store, treating as public patient");
                Role::Patient
            }),
        };

        let token = role
            .token_alias()
            .and_then(|alias| store.get(alias))
            .or_else(|| store.get(TOKEN_KEY))
            .or_else(|| store.get(AUTH_TOKEN_KEY))
            .filter(|t| !t.trim().is_empty());

        match (role, token) {
            (Role::Unauthenticated, _) => Ok(SessionContext::Unauthenticated),
            (Role::Patient, _) => Ok(SessionContext::Patient),
            (Role::LoggedPatient, Some(token)) => Ok(SessionContext::LoggedPatient {
                token,
                profile: None,
            }),
            (Role::Doctor, Some(token)) => Ok(SessionContext::Doctor { token }),
            (Role::Admin, Some(token)) => Ok(SessionContext::Admin { token }),
            (role, None) => Err(PortalError::SessionInvalid {
                role: role.as_tag().to_string(),
            }),
        }
    }

    pub fn role(&self) -> Role {
        match self {
            SessionContext::Unauthenticated => Role::Unauthenticated,
            SessionContext::Patient => Role::Patient,
            SessionContext::LoggedPatient { .. } => Role::LoggedPatient,
            SessionContext::Doctor { .. } => Role::Doctor,
            SessionContext::Admin { .. } => Role::Admin,
        }
    }

    pub fn token(&self) -> Option<&str> {
        match self {
            SessionContext::Unauthenticated | SessionContext::Patient => None,
            SessionContext::LoggedPatient { token, .. }
            | SessionContext::Doctor { token }
            | SessionContext::Admin { token } => Some(token),
        }
    }

    pub fn profile(&self) -> Option<&PatientProfile> {
        match self {
            SessionContext::LoggedPatient { profile, .. } => profile.as_ref(),
            _ => None,
        }
    }

    /// Attach a fetched profile. Only a logged-in patient carries one.
    pub fn with_profile(self, profile: PatientProfile) -> SessionContext {
        match self {
            SessionContext::LoggedPatient { token, .. } => SessionContext::LoggedPatient {
                token,
                profile: Some(profile),
            },
            other => other,
        }
    }

    /// The context that replaces an invalidated one.
    pub fn invalidate(self) -> SessionContext {
        SessionContext::Unauthenticated
    }
}

// ─── Transitions ──────────────────────────────────────────────────────────

/// Persist a fresh login and return its context.
pub fn login(store: &dyn SessionStore, role: Role, token: &str) -> Result<SessionContext> {
    if role.is_privileged() && token.trim().is_empty() {
        return Err(PortalError::SessionInvalid {
            role: role.as_tag().to_string(),
        });
    }
    clear(store)?;
    store.set(ROLE_KEY, role.as_tag())?;
    if role.is_privileged() {
        store.set(TOKEN_KEY, token)?;
        if let Some(alias) = role.token_alias() {
            store.set(alias, token)?;
        }
    }
    info!(role = %role, "session started");
    SessionContext::resolve(store)
}

/// Remove role and every token alias.
pub fn clear(store: &dyn SessionStore) -> Result<()> {
    store.remove(ROLE_KEY)?;
    for key in ALL_TOKEN_KEYS {
        store.remove(key)?;
    }
    Ok(())
}

/// Admin / doctor logout: drop everything.
pub fn logout(store: &dyn SessionStore) -> Result<SessionContext> {
    clear(store)?;
    info!("session cleared");
    Ok(SessionContext::Unauthenticated)
}

/// Patient logout keeps the visitor on the public patient role.
pub fn logout_patient(store: &dyn SessionStore) -> Result<SessionContext> {
    clear(store)?;
    store.set(ROLE_KEY, Role::Patient.as_tag())?;
    info!("patient logged out");
    Ok(SessionContext::Patient)
}

/// Entering the landing view always starts from a clean session.
pub fn enter_landing(store: &dyn SessionStore) -> Result<()> {
    clear(store)
}

// ─── Validity gate ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    Proceed(SessionContext),
    /// The session was invalid and has been cleared. Show `notice` once and
    /// navigate to `route`; nothing role-conditioned may render.
    Redirect { notice: String, route: String },
}

/// Run once per page load, before any role-conditioned render.
pub fn gate(store: &dyn SessionStore, routes: &Routes) -> Result<GateOutcome> {
    let role_missing = store.get(ROLE_KEY).is_none();
    match SessionContext::resolve(store) {
        Ok(ctx) => {
            if role_missing {
                store.set(ROLE_KEY, Role::Patient.as_tag())?;
            }
            Ok(GateOutcome::Proceed(ctx))
        }
        Err(PortalError::SessionInvalid { role }) => {
            warn!(role = %role, "privileged role without token, clearing session");
            clear(store)?;
            Ok(GateOutcome::Redirect {
                notice: INVALID_SESSION_NOTICE.to_string(),
                route: routes.home.clone(),
            })
        }
        Err(e) => Err(e),
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────
