use clap::Args;
use portal_core::actions::ActionOutcome;
use portal_core::dashboard::admin::MISSING_ADMIN_SESSION;
use portal_core::dashboard::AdminDashboard;
use portal_core::session::Role;
use portal_core::types::{CriteriaUpdate, NewDoctor};
use portal_core::view::RenderedList;

use super::{block_on, ready, report, Ctx, Directory};
use crate::output::{print_json, print_table};

#[derive(Args)]
pub struct FilterArgs {
    /// Free-text match on doctor name
    #[arg(long)]
    pub search: Option<String>,
    /// Availability slot, e.g. "AM" or "PM"
    #[arg(long)]
    pub time: Option<String>,
    #[arg(long)]
    pub specialty: Option<String>,
}

#[derive(Args)]
pub struct NewDoctorArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub specialty: String,
    #[arg(long)]
    pub email: String,
    #[arg(long, env = "MEDPORTAL_DOCTOR_PASSWORD", hide_env_values = true)]
    pub password: String,
    #[arg(long)]
    pub mobile: String,
    /// Repeat for each slot
    #[arg(long = "slot", value_name = "SLOT")]
    pub availability: Vec<String>,
}

// ---------------------------------------------------------------------------
// doctors
// ---------------------------------------------------------------------------

pub fn list(ctx: &Ctx, filter: FilterArgs) -> anyhow::Result<()> {
    let portal = ctx.portal()?;
    let update = CriteriaUpdate {
        search: filter.search,
        time: filter.time,
        specialty: filter.specialty,
    };
    let shown = block_on(async {
        let directory = Directory::open(&portal).await?;
        let page = directory.page();
        if !update.is_empty() {
            // A one-shot command has no keystrokes to wait out.
            match page.on_criteria_changed(update) {
                Some(dispatch) => {
                    dispatch.await?;
                }
                None => {
                    page.controller().refresh().await;
                }
            }
        }
        anyhow::Ok(page.board().snapshot())
    })??;

    let Some(list) = shown else {
        anyhow::bail!("directory was never rendered");
    };
    print_list(&list, ctx.json)
}

fn print_list(list: &RenderedList, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(list);
    }
    match list {
        RenderedList::Placeholder { message } => println!("{message}"),
        RenderedList::Cards { cards } => {
            let rows = cards
                .iter()
                .map(|c| {
                    vec![
                        c.doctor_id.clone(),
                        c.title.clone(),
                        c.specialty.clone().unwrap_or_default(),
                        c.email.clone().unwrap_or_default(),
                        c.availability.clone().unwrap_or_default(),
                        c.action_label().to_string(),
                    ]
                })
                .collect::<Vec<_>>();
            print_table(
                &["ID", "NAME", "SPECIALTY", "EMAIL", "AVAILABILITY", "ACTION"],
                &rows,
            );
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// add-doctor / delete-doctor
// ---------------------------------------------------------------------------

pub fn add(ctx: &Ctx, args: NewDoctorArgs) -> anyhow::Result<()> {
    let portal = ctx.portal()?;
    let form = NewDoctor {
        name: args.name,
        specialty: args.specialty,
        email: args.email,
        password: args.password,
        mobile: args.mobile,
        availability: args.availability,
    };
    let outcome = block_on(async {
        let dashboard = ready(AdminDashboard::open(&portal).await?)?;
        anyhow::Ok(dashboard.add_doctor(&form).await?)
    })??;
    report(outcome, ctx.json)
}

pub fn delete(ctx: &Ctx, doctor_id: &str) -> anyhow::Result<()> {
    let portal = ctx.portal()?;
    let outcome = block_on(async {
        let dashboard = ready(AdminDashboard::open(&portal).await?)?;
        if dashboard.page().session().role() != Role::Admin {
            anyhow::bail!("{MISSING_ADMIN_SESSION}");
        }
        anyhow::Ok(dashboard.page().activate(doctor_id).await)
    })??;
    finish_action(ctx, doctor_id, outcome)
}

// ---------------------------------------------------------------------------
// book
// ---------------------------------------------------------------------------

pub fn book(ctx: &Ctx, doctor_id: &str) -> anyhow::Result<()> {
    let portal = ctx.portal()?;
    let outcome = block_on(async {
        let directory = Directory::open(&portal).await?;
        anyhow::Ok(directory.page().activate(doctor_id).await)
    })??;
    finish_action(ctx, doctor_id, outcome)
}

fn finish_action(ctx: &Ctx, doctor_id: &str, outcome: Option<ActionOutcome>) -> anyhow::Result<()> {
    let Some(outcome) = outcome else {
        anyhow::bail!("no doctor '{doctor_id}' in the directory");
    };
    if ctx.json {
        print_json(&outcome)?;
    }
    match outcome {
        ActionOutcome::Failed { .. } => anyhow::bail!("action on doctor '{doctor_id}' failed"),
        ActionOutcome::SignInRequired => anyhow::bail!("sign in as a patient to book"),
        ActionOutcome::Removed { doctor_id } if !ctx.json => {
            println!("Removed doctor {doctor_id}");
        }
        ActionOutcome::Cancelled if !ctx.json => println!("Cancelled."),
        _ => {}
    }
    Ok(())
}
