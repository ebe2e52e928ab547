// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! This module contains a synchronous, deterministic "core runtime" that
//! consumes [`CoreEvent`]s and produces:
//! - an updated core state
//! - the outcome to report to the event's sender
//! - a list of "commands" describing what the IO shell should do next
//!
//! The async/IO-heavy shell (`engine::runtime::Runtime`) is responsible for:
//! - reading commands from the inbox channel
//! - arming the wake timer
//! - pushing dispatched messages into the bounded outbox
//!
//! The core takes `now` as an argument instead of reading the clock, so it
//! can be unit tested without any Tokio runtime, channels, or timers.

use tokio::time::Instant;
use tracing::debug;

use crate::dag::{MessageState, Scheduler};
use crate::engine::event_handlers::{
    handle_booked, handle_shutdown, handle_submit, handle_timer, CoreStep,
};
use crate::engine::CoreEvent;
use crate::errors::MsgschedError;
use crate::types::{MessageId, ShutdownPolicy};

/// Pure core runtime state.
///
/// This owns:
/// - the readiness scheduler
/// - the shutdown policy
/// - whether shutdown has already happened
///
/// It has **no** channels and does not perform any IO.
#[derive(Debug)]
pub struct CoreRuntime {
    scheduler: Scheduler,
    shutdown_policy: ShutdownPolicy,
    closed: bool,
}

impl CoreRuntime {
    pub fn new(scheduler: Scheduler, shutdown_policy: ShutdownPolicy) -> Self {
        Self {
            scheduler,
            shutdown_policy,
            closed: false,
        }
    }

    /// Expose whether the scheduler has nothing waiting (for tests).
    pub fn is_idle(&self) -> bool {
        self.scheduler.is_idle()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn state_of(&self, id: &MessageId) -> Option<MessageState> {
        self.scheduler.state_of(id)
    }

    /// Instant the shell should wake up at, or `None` to disarm the timer.
    pub fn next_deadline(&self) -> Option<Instant> {
        if self.closed {
            return None;
        }
        self.scheduler.next_deadline()
    }

    /// Handle a single event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: CoreEvent, now: Instant) -> CoreStep {
        if self.closed {
            return self.step_closed(event);
        }

        match event {
            CoreEvent::Submit(message) => handle_submit(&mut self.scheduler, message, now),
            CoreEvent::Booked(id) => handle_booked(&mut self.scheduler, &id, now),
            CoreEvent::TimerFired => handle_timer(&mut self.scheduler, now),
            CoreEvent::ShutdownRequested => {
                self.closed = true;
                handle_shutdown(&mut self.scheduler, self.shutdown_policy, now)
            }
        }
    }

    fn step_closed(&self, event: CoreEvent) -> CoreStep {
        debug!(?event, "event after shutdown; rejecting");
        let result = match event {
            CoreEvent::Submit(_) | CoreEvent::Booked(_) => Err(MsgschedError::Closed),
            CoreEvent::TimerFired | CoreEvent::ShutdownRequested => Ok(()),
        };
        CoreStep {
            result,
            commands: Vec::new(),
            keep_running: false,
        }
    }
}
