//! Bounded log of completed challenges.

use serde::{Deserialize, Serialize};

use crate::models::Challenge;

/// Maximum number of completed challenges kept.
pub const HISTORY_CAPACITY: usize = 20;

/// Completed challenges, most recent first.
///
/// Stored as a plain JSON array in the `challenge_history` record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History {
    entries: Vec<Challenge>,
}

impl History {
    /// Build from stored entries, keeping only the newest `HISTORY_CAPACITY`.
    pub fn from_entries(mut entries: Vec<Challenge>) -> Self {
        entries.truncate(HISTORY_CAPACITY);
        Self { entries }
    }

    /// Insert at the head and drop whatever falls past the cap.
    ///
    /// An older entry with the same id is replaced, never duplicated.
    pub fn append(&mut self, entry: Challenge) {
        self.entries.retain(|existing| existing.id != entry.id);
        self.entries.insert(0, entry);
        self.entries.truncate(HISTORY_CAPACITY);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|c| c.id == id)
    }

    pub fn list(&self) -> &[Challenge] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
