use std::sync::{Mutex, MutexGuard};

use serde::Serialize;

use crate::card::CardView;

/// What the directory container currently shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderedList {
    Cards { cards: Vec<CardView> },
    /// Single message row: empty result or failed query.
    Placeholder { message: String },
}

impl RenderedList {
    pub fn placeholder(message: impl Into<String>) -> Self {
        RenderedList::Placeholder {
            message: message.into(),
        }
    }

    pub fn cards(&self) -> &[CardView] {
        match self {
            RenderedList::Cards { cards } => cards,
            RenderedList::Placeholder { .. } => &[],
        }
    }

    pub fn placeholder_message(&self) -> Option<&str> {
        match self {
            RenderedList::Placeholder { message } => Some(message),
            RenderedList::Cards { .. } => None,
        }
    }
}

/// The rendered directory container.
///
/// `replace` is a full re-render; `remove_card` drops one card in place
/// (admin deletion) without touching the rest.
pub trait ListView: Send + Sync {
    fn replace(&self, list: RenderedList);

    /// Returns `false` if no card with `doctor_id` is shown.
    fn remove_card(&self, doctor_id: &str) -> bool;
}

#[derive(Debug, Default)]
struct BoardState {
    list: Option<RenderedList>,
    full_renders: u64,
}

/// In-memory [`ListView`] that front ends read back to draw.
#[derive(Debug, Default)]
pub struct DirectoryBoard {
    state: Mutex<BoardState>,
}

impl DirectoryBoard {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, BoardState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// `None` until the first render.
    pub fn snapshot(&self) -> Option<RenderedList> {
        self.state().list.clone()
    }

    pub fn card_ids(&self) -> Vec<String> {
        self.state()
            .list
            .as_ref()
            .map(|l| l.cards().iter().map(|c| c.doctor_id.clone()).collect())
            .unwrap_or_default()
    }

    /// Number of full re-renders so far.
    pub fn render_count(&self) -> u64 {
        self.state().full_renders
    }
}

impl ListView for DirectoryBoard {
    fn replace(&self, list: RenderedList) {
        let mut state = self.state();
        state.list = Some(list);
        state.full_renders += 1;
    }

    fn remove_card(&self, doctor_id: &str) -> bool {
        let mut state = self.state();
        match state.list.as_mut() {
            Some(RenderedList::Cards { cards }) => {
                let before = cards.len();
                cards.retain(|c| c.doctor_id != doctor_id);
                cards.len() != before
            }
            _ => false,
        }
    }
}
