// src/dag/pending_set.rs

use std::collections::BTreeMap;

use tokio::time::Instant;

use crate::types::MessageId;

/// Messages keyed by `(instant, arrival_sequence)`.
///
/// The scheduler keeps one of these for release times and one for eviction
/// deadlines; the earliest key of either drives the wake timer.
#[derive(Debug, Default)]
pub struct TimeOrderedSet {
    entries: BTreeMap<(Instant, u64), MessageId>,
}

impl TimeOrderedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, at: Instant, sequence: u64, id: MessageId) {
        self.entries.insert((at, sequence), id);
    }

    pub fn remove(&mut self, at: Instant, sequence: u64) -> Option<MessageId> {
        self.entries.remove(&(at, sequence))
    }

    /// Remove and return every entry due at or before `now`, earliest first.
    pub fn pop_due(&mut self, now: Instant) -> Vec<MessageId> {
        let mut due = Vec::new();
        while let Some(entry) = self.entries.first_entry() {
            if entry.key().0 > now {
                break;
            }
            due.push(entry.remove());
        }
        due
    }

    /// Earliest instant still in the set.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.entries.keys().next().map(|(at, _)| *at)
    }

    /// Remove everything, earliest first.
    pub fn drain(&mut self) -> Vec<MessageId> {
        std::mem::take(&mut self.entries).into_values().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
