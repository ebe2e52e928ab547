// src/engine/mod.rs

//! Orchestration engine for msgsched.
//!
//! This module ties together:
//! - the readiness state machine ([`crate::dag::Scheduler`])
//! - the actor loop that owns it and reacts to:
//!   - submissions
//!   - booking notifications
//!   - wake-timer firings
//!   - shutdown requests
//! - the cloneable [`SchedulerHandle`] through which other tasks talk to it
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`].

use crate::dag::NewMessage;
use crate::types::{Discarded, MessageId};

/// Events consumed by the pure core.
#[derive(Debug, Clone)]
pub enum CoreEvent {
    /// A new message from the ingestion stage.
    Submit(NewMessage),
    /// The ledger reports this id as booked.
    Booked(MessageId),
    /// The wake deadline has passed.
    TimerFired,
    /// Stop accepting input and drain.
    ShutdownRequested,
}

/// What the final drain did with the messages that were still tracked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Ids pushed to the dispatch queue during the drain, in push order.
    pub released: Vec<MessageId>,
    /// Messages dropped during the drain.
    pub discarded: Vec<Discarded>,
}

pub mod core;
pub mod event_handlers;
pub mod handle;
pub mod runtime;

pub use self::core::CoreRuntime;
pub use event_handlers::{CoreCommand, CoreStep};
pub use handle::{SchedulerCommand, SchedulerHandle};
pub use runtime::{Runtime, RunningScheduler, spawn_scheduler};
