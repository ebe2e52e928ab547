// src/dag/mod.rs

//! Readiness tracking for messages in the ledger DAG.
//!
//! - [`scheduler`] contains the synchronous state machine that decides when
//!   a message may be released.
//! - [`dependency_index`] maps unbooked parents to waiting dependents.
//! - [`pending_set`] orders messages by release time.
//! - [`message`] provides the message record types.
//! - [`scheduler_step`] defines the result type for scheduler steps.

pub mod dependency_index;
pub mod message;
pub mod pending_set;
pub mod scheduler;
pub mod scheduler_step;

pub use dependency_index::{RecentIds, DependencyIndex};
pub use message::{Dispatched, MessageState, NewMessage};
pub use pending_set::TimeOrderedSet;
pub use scheduler::{Scheduler, SchedulerOptions};
pub use scheduler_step::SchedulerStep;
