//! Bounded history of sent payloads, newest first.

use crate::error::HistoryError;
use std::collections::{BTreeSet, VecDeque};

/// Default maximum number of history entries.
pub const DEFAULT_HISTORY_SIZE: usize = 100;

/// A payload that was sent, with the text shown for it in the history list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    raw: Vec<u8>,
    rendered: String,
    sequence: u64,
}

impl HistoryEntry {
    /// Exact bytes that went out on the wire.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Display text (hex or decoded, possibly timestamped).
    pub fn rendered(&self) -> &str {
        &self.rendered
    }

    /// Insertion counter; later entries have larger numbers.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

/// Newest-first list with a fixed bound. Adding past the bound drops the
/// oldest entry.
#[derive(Debug, Clone)]
pub struct HistoryLog {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
    next_sequence: u64,
}

impl HistoryLog {
    /// A log holding at most `capacity` entries (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            next_sequence: 0,
        }
    }

    /// Insert at the front, evicting from the back while over the bound.
    pub fn add(&mut self, raw: Vec<u8>, rendered: String) {
        self.entries.push_front(HistoryEntry {
            raw,
            rendered,
            sequence: self.next_sequence,
        });
        self.next_sequence += 1;
        while self.entries.len() > self.capacity {
            self.entries.pop_back();
        }
    }

    /// Remove the entries at `indices`. Positions refer to the log as it was
    /// before the call; positions past the end are ignored.
    pub fn remove(&mut self, indices: impl IntoIterator<Item = usize>) {
        let positions: BTreeSet<usize> = indices.into_iter().collect();
        for index in positions.into_iter().rev() {
            if index < self.entries.len() {
                self.entries.remove(index);
            }
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Entry at `index`, where 0 is the most recent.
    pub fn get(&self, index: usize) -> Result<&HistoryEntry, HistoryError> {
        self.entries.get(index).ok_or(HistoryError::IndexOutOfRange {
            index,
            len: self.entries.len(),
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Newest first.
    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }
}

impl Default for HistoryLog {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_SIZE)
    }
}
