//! Undo stack of state snapshots.

use crate::game_state::StateSnapshot;
use serde::{Deserialize, Serialize};
use tales_script::ElementId;

/// The state from just before an element acted, tagged with that element.
///
/// The initial entry has no element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub state: StateSnapshot,
    pub element: Option<ElementId>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History {
    entries: Vec<HistoryEntry>,
}

impl History {
    /// Start a history with the initial snapshot.
    pub fn new(initial: StateSnapshot) -> Self {
        Self {
            entries: vec![HistoryEntry {
                state: initial,
                element: None,
            }],
        }
    }

    pub fn from_entries(entries: Vec<HistoryEntry>) -> Self {
        Self { entries }
    }

    pub fn push(&mut self, state: StateSnapshot, element: Option<ElementId>) {
        self.entries.push(HistoryEntry { state, element });
    }

    pub fn top(&self) -> Option<&HistoryEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The initial snapshot plus at least one action.
    pub fn can_undo(&self) -> bool {
        self.entries.len() >= 2
    }

    /// Drop the newest entry and return the one now on top.
    pub fn undo(&mut self) -> Option<&HistoryEntry> {
        if !self.can_undo() {
            return None;
        }
        self.entries.pop();
        self.entries.last()
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }
}
