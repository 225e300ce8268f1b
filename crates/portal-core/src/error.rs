use thiserror::Error;

/// Uniform failure shape for every call that crosses the service boundary.
///
/// Transport errors, non-2xx statuses and undecodable bodies all collapse
/// into this one value; callers never branch on which of them happened.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ServiceFailure {
    pub message: String,
    /// HTTP status when the server answered, `None` for network failures.
    pub status: Option<u16>,
}

impl ServiceFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(message: impl Into<String>, status: u16) -> Self {
        Self {
            message: message.into(),
            status: Some(status),
        }
    }
}

pub type ServiceResult<T> = std::result::Result<T, ServiceFailure>;

/// A single doctor record that could not be turned into a card.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderFailure {
    #[error("record has no identifier")]
    MissingId,

    #[error("duplicate doctor id '{0}' in response")]
    DuplicateId(String),

    #[error("doctor '{id}' has a blank availability slot at index {slot}")]
    BlankSlot { id: String, slot: usize },

    #[error("appointment {0} has no patient")]
    MissingPatient(i64),
}

#[derive(Debug, Error)]
pub enum PortalError {
    #[error("session expired or invalid: role '{role}' requires a token")]
    SessionInvalid { role: String },

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Service(#[from] ServiceFailure),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PortalError>;
