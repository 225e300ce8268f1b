use anyhow::Context;
use portal_core::header::{follow, render_header};
use portal_core::session::{self, GateOutcome, SessionContext};
use serde::Serialize;

use super::Ctx;
use crate::output::{print_json, print_table};
use crate::terminal::Terminal;

#[derive(Serialize)]
struct SessionOutput<'a> {
    role: String,
    signed_in: bool,
    header: &'a portal_core::header::HeaderView,
}

/// Run the validity gate and print the role plus its navigation.
pub fn show(ctx: &Ctx) -> anyhow::Result<()> {
    let config = ctx.config()?;
    let store = ctx.store();
    let session = match session::gate(store.as_ref(), &config.routes)
        .context("failed to read session")?
    {
        GateOutcome::Proceed(session) => session,
        GateOutcome::Redirect { notice, route } => {
            eprintln!("{notice}");
            anyhow::bail!("session cleared; continue at {route}");
        }
    };
    let header = render_header(&session, &config.routes);

    if ctx.json {
        return print_json(&SessionOutput {
            role: session.role().to_string(),
            signed_in: session.token().is_some(),
            header: &header,
        });
    }

    println!("Role: {}", session.role());
    let rows = header
        .items
        .iter()
        .map(|item| vec![item.id.to_string(), item.label.to_string()])
        .collect::<Vec<_>>();
    print_table(&["ID", "NAV"], &rows);
    Ok(())
}

/// Admin and doctor logouts clear everything; a patient stays a visitor.
pub fn logout(ctx: &Ctx) -> anyhow::Result<()> {
    let config = ctx.config()?;
    let store = ctx.store();
    let (context, route) = match SessionContext::resolve(store.as_ref()) {
        Ok(SessionContext::LoggedPatient { .. }) => (
            session::logout_patient(store.as_ref())?,
            config.routes.patient_home,
        ),
        _ => (session::logout(store.as_ref())?, config.routes.home),
    };

    if ctx.json {
        print_json(&serde_json::json!({ "role": context.role().to_string(), "route": route }))
    } else {
        println!("Logged out. Continue at {route}");
        Ok(())
    }
}

/// Follow a header item by its id, as clicking it would.
pub fn nav(ctx: &Ctx, id: &str) -> anyhow::Result<()> {
    let config = ctx.config()?;
    let store = ctx.store();
    let session = match session::gate(store.as_ref(), &config.routes)? {
        GateOutcome::Proceed(session) => session,
        GateOutcome::Redirect { notice, route } => {
            eprintln!("{notice}");
            anyhow::bail!("session cleared; continue at {route}");
        }
    };
    let header = render_header(&session, &config.routes);
    let item = header
        .items
        .iter()
        .find(|item| item.id == id)
        .with_context(|| format!("no '{id}' item in the {} header", session.role()))?;

    let terminal = Terminal::new(ctx.yes);
    match follow(&item.target, store.as_ref(), &terminal, &config.routes)? {
        Some(route) => println!("{route}"),
        None => println!("{} opened", item.label),
    }
    Ok(())
}
