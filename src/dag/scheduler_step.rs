// src/dag/scheduler_step.rs

//! Step-by-step result types for the scheduler.

use crate::dag::message::Dispatched;
use crate::types::Discarded;

/// Structured result of a single scheduler "step".
///
/// Every mutating scheduler call returns one of these so tests can step the
/// state machine by hand and assert on exactly what changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerStep {
    /// Messages that became ready in this step, in dispatch order.
    pub newly_ready: Vec<Dispatched>,
    /// Messages removed without dispatch in this step.
    pub newly_discarded: Vec<Discarded>,
}

impl SchedulerStep {
    pub fn is_empty(&self) -> bool {
        self.newly_ready.is_empty() && self.newly_discarded.is_empty()
    }

    /// Ids of `newly_ready`, in order. Mostly useful in assertions.
    pub fn ready_ids(&self) -> Vec<&str> {
        self.newly_ready.iter().map(|d| d.id.as_str()).collect()
    }
}
