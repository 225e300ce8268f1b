//! Role-rendering engine: doctor record + role → card.
//!
//! Rendering is pure. The role is resolved once per render pass by the
//! caller, so a session change halfway through a list cannot produce cards
//! for two different roles.

use std::collections::HashSet;

use serde::Serialize;
use tracing::warn;

use crate::error::{RenderFailure, ServiceResult};
use crate::session::Role;
use crate::types::DoctorRecord;
use crate::view::RenderedList;

pub const UNKNOWN_DOCTOR: &str = "Unknown Doctor";

pub const NO_DOCTORS: &str = "No doctors found.";
pub const NO_FILTERED_DOCTORS: &str = "No doctors found with the given filters.";
pub const LOAD_FAILED: &str = "Unable to load doctors.";
pub const FILTER_FAILED: &str = "Unable to filter doctors.";

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingFlow {
    /// Visitor must sign in first; nothing else happens.
    SignInPrompt,
    /// Fetch the patient profile and open the booking overlay.
    Overlay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "flow", rename_all = "snake_case")]
pub enum CardAction {
    Delete,
    BookNow(BookingFlow),
}

impl CardAction {
    /// Total over [`Role`]: every role yields exactly one action.
    pub fn for_role(role: Role) -> CardAction {
        match role {
            Role::Admin => CardAction::Delete,
            Role::LoggedPatient => CardAction::BookNow(BookingFlow::Overlay),
            Role::Doctor | Role::Patient | Role::Unauthenticated => {
                CardAction::BookNow(BookingFlow::SignInPrompt)
            }
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CardAction::Delete => "Delete",
            CardAction::BookNow(_) => "Book Now",
        }
    }
}

// ---------------------------------------------------------------------------
// CardView
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardView {
    pub doctor_id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialty: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Slot labels joined with ", "; absent when the doctor lists none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability: Option<String>,
    pub action: CardAction,
}

impl CardView {
    pub fn action_label(&self) -> &'static str {
        self.action.label()
    }
}

pub fn render_card(record: &DoctorRecord, role: Role) -> Result<CardView, RenderFailure> {
    if record.id.trim().is_empty() {
        return Err(RenderFailure::MissingId);
    }
    if let Some(slot) = record.availability.iter().position(|s| s.trim().is_empty()) {
        return Err(RenderFailure::BlankSlot {
            id: record.id.clone(),
            slot,
        });
    }

    let non_empty = |v: &Option<String>| v.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string);

    Ok(CardView {
        doctor_id: record.id.clone(),
        title: non_empty(&record.name).unwrap_or_else(|| UNKNOWN_DOCTOR.to_string()),
        specialty: non_empty(&record.specialty),
        email: non_empty(&record.email),
        availability: (!record.availability.is_empty()).then(|| record.availability.join(", ")),
        action: CardAction::for_role(role),
    })
}

// ---------------------------------------------------------------------------
// Whole responses
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct ListRender {
    pub cards: Vec<CardView>,
    /// Position in the response and the reason it was skipped.
    pub failures: Vec<(usize, RenderFailure)>,
}

/// Render every record; failures are skipped with a warning and never abort
/// the rest of the list.
pub fn render_list(records: &[DoctorRecord], role: Role) -> ListRender {
    let mut out = ListRender::default();
    let mut seen = HashSet::new();

    for (position, record) in records.iter().enumerate() {
        let rendered = render_card(record, role).and_then(|card| {
            if seen.insert(card.doctor_id.clone()) {
                Ok(card)
            } else {
                Err(RenderFailure::DuplicateId(card.doctor_id))
            }
        });
        match rendered {
            Ok(card) => out.cards.push(card),
            Err(failure) => {
                warn!(position, error = %failure, "could not render doctor card");
                out.failures.push((position, failure));
            }
        }
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingKind {
    Unfiltered,
    Filtered,
}

/// Turn a directory result into what the container should show.
pub fn render_outcome(
    kind: ListingKind,
    result: ServiceResult<Vec<DoctorRecord>>,
    role: Role,
) -> RenderedList {
    match result {
        Ok(records) if records.is_empty() => RenderedList::placeholder(match kind {
            ListingKind::Unfiltered => NO_DOCTORS,
            ListingKind::Filtered => NO_FILTERED_DOCTORS,
        }),
        Ok(records) => RenderedList::Cards {
            cards: render_list(&records, role).cards,
        },
        Err(failure) => {
            warn!(error = %failure, "directory query failed");
            RenderedList::placeholder(match kind {
                ListingKind::Unfiltered => LOAD_FAILED,
                ListingKind::Filtered => FILTER_FAILED,
            })
        }
    }
}
