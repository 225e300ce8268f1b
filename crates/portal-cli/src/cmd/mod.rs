pub mod account;
pub mod appointments;
pub mod config;
pub mod directory;
pub mod session;

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use portal_client::PortalClient;
use portal_core::config::PortalConfig;
use portal_core::dashboard::{
    AdminDashboard, DirectoryPage, FormOutcome, LoggedPatientDashboard, PageLoad,
    PatientDashboard, Portal,
};
use portal_core::session::{FileSessionStore, Role, SessionContext, SessionStore};

use crate::output::print_json;
use crate::terminal::Terminal;

/// Global flags every command sees.
pub struct Ctx {
    pub root: PathBuf,
    pub api_url: Option<String>,
    pub json: bool,
    pub yes: bool,
}

impl Ctx {
    pub fn config(&self) -> anyhow::Result<PortalConfig> {
        let mut config = PortalConfig::load(&self.root).context("failed to load config")?;
        if let Some(url) = &self.api_url {
            config.api_base_url = url.clone();
        }
        Ok(config)
    }

    pub fn store(&self) -> Arc<dyn SessionStore> {
        Arc::new(FileSessionStore::new(&self.root))
    }

    /// Wire every service and host collaborator.
    pub fn portal(&self) -> anyhow::Result<Portal> {
        let config = self.config()?;
        let client = Arc::new(
            PortalClient::new(&config.api_base_url, config.request_timeout())
                .context("failed to build HTTP client")?,
        );
        let terminal = Arc::new(Terminal::new(self.yes));
        Ok(Portal::new(
            config,
            self.store(),
            terminal.clone(),
            terminal.clone(),
            client.clone(),
        )
        .with_patients(client.clone())
        .with_appointments(client.clone())
        .with_staff(client)
        .with_overlay(terminal))
    }
}

pub fn block_on<F: Future>(future: F) -> anyhow::Result<F::Output> {
    let rt = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    Ok(rt.block_on(future))
}

/// The notice was already printed by the gate.
pub fn ready<P>(load: PageLoad<P>) -> anyhow::Result<P> {
    match load {
        PageLoad::Ready(page) => Ok(page),
        PageLoad::Redirected { route, .. } => {
            anyhow::bail!("session cleared; continue at {route}")
        }
    }
}

/// Messages were already shown on stderr; only the result is printed here.
pub fn report(outcome: FormOutcome, json: bool) -> anyhow::Result<()> {
    match outcome {
        FormOutcome::Rejected { .. } => anyhow::bail!("request rejected"),
        FormOutcome::SignedIn { route } => {
            if json {
                print_json(&serde_json::json!({ "signed_in": true, "route": route }))
            } else {
                println!("Signed in. Continue at {route}");
                Ok(())
            }
        }
        FormOutcome::Saved { message } => {
            if json {
                print_json(&serde_json::json!({ "saved": true, "message": message }))
            } else {
                Ok(())
            }
        }
    }
}

/// The role stored right now; an invalid session is left for the gate.
pub fn stored_role(store: &dyn SessionStore) -> Role {
    SessionContext::resolve(store)
        .map(|ctx| ctx.role())
        .unwrap_or(Role::Patient)
}

/// Whichever directory dashboard the stored role lands on.
pub enum Directory {
    Admin(AdminDashboard),
    Patient(PatientDashboard),
    LoggedPatient(LoggedPatientDashboard),
}

impl Directory {
    pub async fn open(portal: &Portal) -> anyhow::Result<Directory> {
        let load = match stored_role(portal.store.as_ref()) {
            Role::Admin => AdminDashboard::open(portal).await?.map(Directory::Admin),
            Role::LoggedPatient => {
                LoggedPatientDashboard::open(portal).await?.map(Directory::LoggedPatient)
            }
            Role::Doctor | Role::Patient | Role::Unauthenticated => {
                PatientDashboard::open(portal).await?.map(Directory::Patient)
            }
        };
        ready(load)
    }

    pub fn page(&self) -> &DirectoryPage {
        match self {
            Directory::Admin(d) => d.page(),
            Directory::Patient(d) => d.page(),
            Directory::LoggedPatient(d) => d.page(),
        }
    }
}
