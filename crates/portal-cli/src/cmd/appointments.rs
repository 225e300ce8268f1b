use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::Args;
use portal_core::dashboard::{DoctorDashboard, LoggedPatientDashboard, TableView};
use portal_core::session::Role;
use portal_core::types::Appointment;

use super::{block_on, ready, stored_role, Ctx};
use crate::output::{print_json, print_table};

#[derive(Args)]
pub struct AppointmentArgs {
    /// Day to show, YYYY-MM-DD (doctor; default today)
    #[arg(long)]
    pub date: Option<String>,
    /// Patient name filter (doctor)
    #[arg(long)]
    pub patient: Option<String>,
    /// Condition filter such as "pending" or "consulted" (patient)
    #[arg(long)]
    pub condition: Option<String>,
    /// Doctor name filter (patient)
    #[arg(long)]
    pub doctor: Option<String>,
}

pub fn run(ctx: &Ctx, args: AppointmentArgs) -> anyhow::Result<()> {
    match stored_role(ctx.store().as_ref()) {
        Role::Doctor => doctor_day(ctx, args),
        Role::LoggedPatient => patient_list(ctx, args),
        role @ (Role::Admin | Role::Patient | Role::Unauthenticated) => {
            anyhow::bail!("appointments need a doctor or patient login (current role: {role})")
        }
    }
}

fn parse_date(raw: Option<&str>) -> anyhow::Result<NaiveDate> {
    match raw {
        None => Ok(Local::now().date_naive()),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .with_context(|| format!("invalid date '{s}', expected YYYY-MM-DD")),
    }
}

// ---------------------------------------------------------------------------
// Doctor: one day's table
// ---------------------------------------------------------------------------

fn doctor_day(ctx: &Ctx, args: AppointmentArgs) -> anyhow::Result<()> {
    let date = parse_date(args.date.as_deref())?;
    let portal = ctx.portal()?;
    let table = block_on(async {
        let dashboard = ready(DoctorDashboard::open_on(&portal, date).await?)?;
        if let Some(name) = args.patient.as_deref() {
            dashboard.submit_search(name).await;
        }
        anyhow::Ok(dashboard.table())
    })??;

    let Some(table) = table else {
        anyhow::bail!("appointment table was never rendered");
    };
    if ctx.json {
        return print_json(&table);
    }
    match table {
        TableView::Message { message } => println!("{message}"),
        TableView::Rows { rows } => {
            let rows = rows
                .into_iter()
                .map(|r| {
                    vec![
                        r.appointment_id.to_string(),
                        r.patient_name,
                        r.phone.unwrap_or_default(),
                        r.email.unwrap_or_default(),
                        r.time.unwrap_or_default(),
                        r.status.to_string(),
                    ]
                })
                .collect::<Vec<_>>();
            print_table(&["ID", "PATIENT", "PHONE", "EMAIL", "TIME", "STATUS"], &rows);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Patient: own appointments
// ---------------------------------------------------------------------------

fn patient_list(ctx: &Ctx, args: AppointmentArgs) -> anyhow::Result<()> {
    let portal = ctx.portal()?;
    let filtered = args.condition.is_some() || args.doctor.is_some();
    let result = block_on(async {
        let dashboard = ready(LoggedPatientDashboard::open(&portal).await?)?;
        let result = if filtered {
            dashboard
                .filter_appointments(args.condition.as_deref(), args.doctor.as_deref())
                .await
        } else {
            dashboard.appointments().await
        };
        anyhow::Ok(result)
    })??;
    let appointments = result?;
    print_appointments(&appointments, ctx.json)
}

fn print_appointments(appointments: &[Appointment], json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(&appointments);
    }
    if appointments.is_empty() {
        println!("No appointments found.");
        return Ok(());
    }
    let rows = appointments
        .iter()
        .map(|a| {
            vec![
                a.id.map(|id| id.to_string()).unwrap_or_default(),
                a.doctor_name.clone().unwrap_or_default(),
                a.appointment_time
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_default(),
                a.status.to_string(),
            ]
        })
        .collect::<Vec<_>>();
    print_table(&["ID", "DOCTOR", "TIME", "STATUS"], &rows);
    Ok(())
}
