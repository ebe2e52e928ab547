// src/dag/dependency_index.rs

//! Parent → waiting-dependents index, plus bounded memories of booked and
//! released ids.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::types::MessageId;

/// Maps a parent id to the messages whose dependency on it is unresolved.
#[derive(Debug, Default)]
pub struct DependencyIndex {
    waiting: HashMap<MessageId, HashSet<MessageId>>,
}

impl DependencyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `dependent` waits on `parent`.
    pub fn add(&mut self, parent: MessageId, dependent: MessageId) {
        self.waiting.entry(parent).or_default().insert(dependent);
    }

    /// Remove and return every dependent waiting on `parent`.
    ///
    /// A second call for the same parent returns nothing.
    pub fn resolve(&mut self, parent: &MessageId) -> HashSet<MessageId> {
        self.waiting.remove(parent).unwrap_or_default()
    }

    /// Drop a single `(parent, dependent)` edge, e.g. on eviction.
    pub fn remove_dependent(&mut self, parent: &MessageId, dependent: &MessageId) {
        if let Some(set) = self.waiting.get_mut(parent) {
            set.remove(dependent);
            if set.is_empty() {
                self.waiting.remove(parent);
            }
        }
    }

    pub fn dependents_of(&self, parent: &MessageId) -> usize {
        self.waiting.get(parent).map_or(0, HashSet::len)
    }

    /// Number of distinct parents with at least one waiting dependent.
    pub fn len(&self) -> usize {
        self.waiting.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waiting.is_empty()
    }

    pub fn clear(&mut self) {
        self.waiting.clear();
    }
}

/// Bounded, insertion-ordered memory of ids.
///
/// The scheduler keeps one for booked ids, since booking notifications may
/// arrive before any dependent is submitted, and one for ids it has released.
/// The oldest entries are forgotten once `capacity` is exceeded.
#[derive(Debug)]
pub struct RecentIds {
    ids: HashSet<MessageId>,
    order: VecDeque<MessageId>,
    capacity: usize,
}

impl RecentIds {
    pub fn new(capacity: usize) -> Self {
        Self {
            ids: HashSet::new(),
            order: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Returns `false` if `id` was already remembered.
    pub fn insert(&mut self, id: MessageId) -> bool {
        if !self.ids.insert(id.clone()) {
            return false;
        }
        self.order.push_back(id);

        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.ids.remove(&oldest);
            }
        }
        true
    }

    pub fn contains(&self, id: &MessageId) -> bool {
        self.ids.contains(id)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
