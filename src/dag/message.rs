// src/dag/message.rs

//! Message records flowing through the scheduler.

use std::collections::HashSet;

use tokio::time::Instant;

use crate::errors::{MsgschedError, Result};
use crate::types::MessageId;

/// A message as handed to the scheduler by the ingestion stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub id: MessageId,
    /// Causal predecessors. Order and repeats are irrelevant.
    pub parent_ids: Vec<MessageId>,
    /// Earliest instant at which the message may be released.
    pub scheduled_time: Instant,
    /// Issuer's scheduling weight (mana).
    pub weight: u64,
}

impl NewMessage {
    pub fn new(id: impl Into<MessageId>, scheduled_time: Instant) -> Self {
        Self {
            id: id.into(),
            parent_ids: Vec::new(),
            scheduled_time,
            weight: 0,
        }
    }

    pub fn with_parents<I, P>(mut self, parents: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<MessageId>,
    {
        self.parent_ids.extend(parents.into_iter().map(Into::into));
        self
    }

    pub fn with_weight(mut self, weight: u64) -> Self {
        self.weight = weight;
        self
    }

    /// Structural checks applied at the submission boundary.
    pub fn validate(&self) -> Result<()> {
        if self.id.is_empty() {
            return Err(MsgschedError::InvalidMessage(
                "message id must not be empty".to_string(),
            ));
        }
        if self.parent_ids.iter().any(MessageId::is_empty) {
            return Err(MsgschedError::InvalidMessage(format!(
                "message '{}' lists an empty parent id",
                self.id
            )));
        }
        if self.parent_ids.contains(&self.id) {
            return Err(MsgschedError::InvalidMessage(format!(
                "message '{}' cannot be its own parent",
                self.id
            )));
        }
        Ok(())
    }
}

/// Internal per-message state owned by the scheduler.
#[derive(Debug, Clone)]
pub(crate) struct PendingMessage {
    pub id: MessageId,
    pub scheduled_time: Instant,
    pub weight: u64,
    pub arrival_sequence: u64,
    /// Parents not yet reported booked.
    pub unresolved: HashSet<MessageId>,
    /// Set once the release time has been observed to pass.
    pub time_elapsed: bool,
    /// Deadline after which a parent-blocked message is evicted, if any.
    pub evict_at: Option<Instant>,
}

impl PendingMessage {
    pub fn order_key(&self) -> (Instant, u64) {
        (self.scheduled_time, self.arrival_sequence)
    }

    pub fn state(&self) -> MessageState {
        match (self.time_elapsed, self.unresolved.is_empty()) {
            (false, true) => MessageState::WaitingTime,
            (true, false) => MessageState::WaitingParent,
            (false, false) => MessageState::WaitingBoth,
            // Promotion removes ready messages immediately, so this is only
            // visible transiently inside a step.
            (true, true) => MessageState::Ready,
        }
    }

    pub fn to_dispatched(&self) -> Dispatched {
        Dispatched {
            id: self.id.clone(),
            weight: self.weight,
            scheduled_time: self.scheduled_time,
            arrival_sequence: self.arrival_sequence,
        }
    }
}

/// Public, read-only view of where a message sits in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageState {
    /// Parents resolved; waiting for the release time.
    WaitingTime,
    /// Release time passed; waiting for at least one parent to be booked.
    WaitingParent,
    /// Waiting on both the release time and at least one parent.
    WaitingBoth,
    Ready,
    /// Pushed to the dispatch queue and not yet reported booked.
    Dispatched,
    /// Reported booked (within the remembered history).
    Booked,
}

/// A message released to downstream workers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatched {
    pub id: MessageId,
    pub weight: u64,
    pub scheduled_time: Instant,
    pub arrival_sequence: u64,
}
