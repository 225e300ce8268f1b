use crate::error::Result;
use crate::{io, paths};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// Routes
// ---------------------------------------------------------------------------

/// Navigation targets used by redirects and header chrome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Routes {
    #[serde(default = "default_home")]
    pub home: String,
    #[serde(default = "default_admin_home")]
    pub admin_home: String,
    #[serde(default = "default_doctor_home")]
    pub doctor_home: String,
    #[serde(default = "default_patient_home")]
    pub patient_home: String,
    #[serde(default = "default_logged_patient_home")]
    pub logged_patient_home: String,
    #[serde(default = "default_appointments")]
    pub appointments: String,
    #[serde(default = "default_login")]
    pub login: String,
    #[serde(default = "default_signup")]
    pub signup: String,
}

fn default_home() -> String {
    "/".to_string()
}

fn default_admin_home() -> String {
    "/pages/adminDashboard.html".to_string()
}

fn default_doctor_home() -> String {
    "/pages/doctorDashboard.html".to_string()
}

fn default_patient_home() -> String {
    "/pages/patientDashboard.html".to_string()
}

fn default_logged_patient_home() -> String {
    "/pages/loggedPatientDashboard.html".to_string()
}

fn default_appointments() -> String {
    "/pages/appointments.html".to_string()
}

fn default_login() -> String {
    "/pages/login.html".to_string()
}

fn default_signup() -> String {
    "/pages/signup.html".to_string()
}

impl Default for Routes {
    fn default() -> Self {
        Self {
            home: default_home(),
            admin_home: default_admin_home(),
            doctor_home: default_doctor_home(),
            patient_home: default_patient_home(),
            logged_patient_home: default_logged_patient_home(),
            appointments: default_appointments(),
            login: default_login(),
            signup: default_signup(),
        }
    }
}

// ---------------------------------------------------------------------------
// PortalConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortalConfig {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_search_debounce_ms")]
    pub search_debounce_ms: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub routes: Routes,
}

fn default_api_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_search_debounce_ms() -> u64 {
    250
}

fn default_request_timeout_secs() -> u64 {
    10
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            search_debounce_ms: default_search_debounce_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            routes: Routes::default(),
        }
    }
}

impl PortalConfig {
    /// Load `<root>/.medportal/config.yaml`, falling back to defaults when
    /// the file does not exist.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: PortalConfig = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let data = serde_yaml::to_string(self)?;
        io::atomic_write(&paths::config_path(root), data.as_bytes())
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        let url = self.api_base_url.trim();
        if url.is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "api_base_url is empty".to_string(),
            });
        } else if !(url.starts_with("http://") || url.starts_with("https://")) {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!("api_base_url '{url}' must start with http:// or https://"),
            });
        }

        if self.search_debounce_ms == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "search_debounce_ms is 0: every keystroke issues a query".to_string(),
            });
        } else if self.search_debounce_ms > 2000 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "search_debounce_ms={} (>2000 feels unresponsive)",
                    self.search_debounce_ms
                ),
            });
        }

        if self.request_timeout_secs == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "request_timeout_secs must be greater than 0".to_string(),
            });
        }

        warnings
    }
}
