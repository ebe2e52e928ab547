// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use tokio::time::Instant;
use tracing::{debug, info};

use crate::dag::{Dispatched, NewMessage, Scheduler, SchedulerStep};
use crate::errors::Result;
use crate::types::{Discarded, MessageId, ShutdownPolicy};

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Push these messages to the dispatch queue, in order.
    Dispatch(Vec<Dispatched>),
    /// Report these messages as dropped.
    Discard(Vec<Discarded>),
}

/// Decision returned by the core after handling a single event.
#[derive(Debug)]
pub struct CoreStep {
    /// Outcome reported back to whoever raised the event. Only submissions
    /// can fail.
    pub result: Result<()>,
    /// Commands the IO shell should execute.
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    fn running(commands: Vec<CoreCommand>) -> Self {
        Self {
            result: Ok(()),
            commands,
            keep_running: true,
        }
    }

    /// All messages this step dispatches, flattened in order.
    pub fn dispatched(&self) -> Vec<&Dispatched> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                CoreCommand::Dispatch(batch) => Some(batch.iter()),
                CoreCommand::Discard(_) => None,
            })
            .flatten()
            .collect()
    }
}

/// Handle a submission.
///
/// A rejected submission produces no commands; the error travels back to
/// the caller in [`CoreStep::result`].
pub fn handle_submit(scheduler: &mut Scheduler, message: NewMessage, now: Instant) -> CoreStep {
    match scheduler.submit(message, now) {
        Ok(step) => CoreStep::running(commands_from(step)),
        Err(err) => CoreStep {
            result: Err(err),
            commands: Vec::new(),
            keep_running: true,
        },
    }
}

/// Handle a booking notification.
pub fn handle_booked(scheduler: &mut Scheduler, parent: &MessageId, now: Instant) -> CoreStep {
    let step = scheduler.notify_booked(parent, now);
    if !step.newly_ready.is_empty() {
        debug!(parent = %parent, released = step.newly_ready.len(), "booking released dependents");
    }
    CoreStep::running(commands_from(step))
}

/// Handle a wake-timer firing.
pub fn handle_timer(scheduler: &mut Scheduler, now: Instant) -> CoreStep {
    let step = scheduler.on_timer(now);
    debug!(
        released = step.newly_ready.len(),
        evicted = step.newly_discarded.len(),
        next_deadline = ?scheduler.next_deadline(),
        "timer pass complete"
    );
    CoreStep::running(commands_from(step))
}

/// Handle a shutdown request: final drain, then stop the loop.
pub fn handle_shutdown(
    scheduler: &mut Scheduler,
    policy: ShutdownPolicy,
    now: Instant,
) -> CoreStep {
    let step = scheduler.shutdown(policy, now);
    info!(
        released = step.newly_ready.len(),
        discarded = step.newly_discarded.len(),
        "shutdown drain complete"
    );
    CoreStep {
        result: Ok(()),
        commands: commands_from(step),
        keep_running: false,
    }
}

fn commands_from(step: SchedulerStep) -> Vec<CoreCommand> {
    let mut commands = Vec::new();
    if !step.newly_ready.is_empty() {
        commands.push(CoreCommand::Dispatch(step.newly_ready));
    }
    if !step.newly_discarded.is_empty() {
        commands.push(CoreCommand::Discard(step.newly_discarded));
    }
    commands
}
