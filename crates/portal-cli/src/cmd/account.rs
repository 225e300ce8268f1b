use clap::{Args, Subcommand};
use portal_core::dashboard::{staff, PatientDashboard};
use portal_core::types::{AdminCredentials, Credentials, PatientSignup};

use super::{block_on, ready, report, Ctx};

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum LoginSubcommand {
    /// Sign in as an administrator
    Admin {
        #[arg(long)]
        username: String,
        #[arg(long, env = "MEDPORTAL_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Sign in as a doctor
    Doctor {
        #[arg(long)]
        email: String,
        #[arg(long, env = "MEDPORTAL_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Sign in as a patient
    Patient {
        #[arg(long)]
        email: String,
        #[arg(long, env = "MEDPORTAL_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

#[derive(Args)]
pub struct SignupArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub email: String,
    #[arg(long, env = "MEDPORTAL_PASSWORD", hide_env_values = true)]
    pub password: String,
    #[arg(long)]
    pub phone: String,
    #[arg(long)]
    pub address: String,
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

pub fn login(ctx: &Ctx, subcmd: LoginSubcommand) -> anyhow::Result<()> {
    let portal = ctx.portal()?;
    let outcome = block_on(async {
        let outcome = match subcmd {
            LoginSubcommand::Admin { username, password } => {
                staff::admin_login(&portal, &AdminCredentials::new(username, password)).await?
            }
            LoginSubcommand::Doctor { email, password } => {
                staff::doctor_login(&portal, &Credentials::new(email, password)).await?
            }
            LoginSubcommand::Patient { email, password } => {
                // Patient sign-in lives on the public dashboard.
                let page = ready(PatientDashboard::open(&portal).await?)?;
                page.login(&Credentials::new(email, password)).await?
            }
        };
        anyhow::Ok(outcome)
    })??;
    report(outcome, ctx.json)
}

pub fn signup(ctx: &Ctx, args: SignupArgs) -> anyhow::Result<()> {
    let portal = ctx.portal()?;
    let form = PatientSignup {
        name: args.name,
        email: args.email,
        password: args.password,
        phone: args.phone,
        address: args.address,
    };
    let outcome = block_on(async {
        let page = ready(PatientDashboard::open(&portal).await?)?;
        anyhow::Ok(page.signup(&form).await?)
    })??;
    report(outcome, ctx.json)
}
