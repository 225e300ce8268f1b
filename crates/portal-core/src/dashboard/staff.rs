//! Admin and doctor sign-in from the landing page.

use tracing::warn;

use super::{FormOutcome, Portal};
use crate::error::{Result, ServiceResult};
use crate::session::{self, Role};
use crate::types::{AdminCredentials, Credentials};

pub const TOKEN_MISSING: &str = "Login failed: token not returned by server.";
pub const INVALID_CREDENTIALS: &str = "Invalid credentials!";
pub const UNEXPECTED: &str = "An unexpected error occurred. Please try again.";

pub async fn admin_login(portal: &Portal, credentials: &AdminCredentials) -> Result<FormOutcome> {
    if let Err(e) = credentials.validate() {
        return Ok(FormOutcome::rejected(portal.prompt.as_ref(), e.to_string()));
    }
    let Some(staff) = &portal.staff else {
        warn!("no staff auth service configured");
        return Ok(FormOutcome::rejected(portal.prompt.as_ref(), UNEXPECTED));
    };
    let result = staff.admin_login(credentials).await;
    finish(portal, Role::Admin, result, &portal.config.routes.admin_home)
}

pub async fn doctor_login(portal: &Portal, credentials: &Credentials) -> Result<FormOutcome> {
    if let Err(e) = credentials.validate() {
        return Ok(FormOutcome::rejected(portal.prompt.as_ref(), e.to_string()));
    }
    let Some(staff) = &portal.staff else {
        warn!("no staff auth service configured");
        return Ok(FormOutcome::rejected(portal.prompt.as_ref(), UNEXPECTED));
    };
    let result = staff.doctor_login(credentials).await;
    finish(portal, Role::Doctor, result, &portal.config.routes.doctor_home)
}

fn finish(
    portal: &Portal,
    role: Role,
    result: ServiceResult<String>,
    route: &str,
) -> Result<FormOutcome> {
    let prompt = portal.prompt.as_ref();
    match result {
        Ok(token) if token.trim().is_empty() => Ok(FormOutcome::rejected(prompt, TOKEN_MISSING)),
        Ok(token) => {
            session::login(portal.store.as_ref(), role, &token)?;
            Ok(FormOutcome::SignedIn {
                route: route.to_string(),
            })
        }
        // The server answered, so the credentials were refused.
        Err(failure) if failure.status.is_some() => {
            Ok(FormOutcome::rejected(prompt, INVALID_CREDENTIALS))
        }
        Err(failure) => {
            warn!(error = %failure, role = %role, "staff login failed");
            Ok(FormOutcome::rejected(prompt, UNEXPECTED))
        }
    }
}
