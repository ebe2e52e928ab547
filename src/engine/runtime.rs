// src/engine/runtime.rs

use std::fmt;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::SchedulerConfig;
use crate::dag::Scheduler;
use crate::errors::{MsgschedError, Result};
use crate::exec::{DispatchSink, Outbox, outbox};
use crate::types::Discarded;

use super::core::CoreRuntime;
use super::handle::{SchedulerCommand, SchedulerHandle};
use super::{CoreCommand, CoreEvent, ShutdownReport};

/// Owns the scheduler state and drives it from the merged inbox and the wake
/// timer, delegating released messages to a `DispatchSink`.
///
/// This is a pure IO shell around `CoreRuntime`, which contains all the
/// scheduling semantics. Only this task ever touches the scheduler state, so
/// no locks are involved.
pub struct Runtime<S: DispatchSink> {
    core: CoreRuntime,
    inbox: mpsc::Receiver<SchedulerCommand>,
    sink: S,
    discards: Option<mpsc::UnboundedSender<Discarded>>,
}

impl<S: DispatchSink> fmt::Debug for Runtime<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

enum Wake {
    Command(Option<SchedulerCommand>),
    Timer,
}

impl<S: DispatchSink> Runtime<S> {
    pub fn new(core: CoreRuntime, inbox: mpsc::Receiver<SchedulerCommand>, sink: S) -> Self {
        Self {
            core,
            inbox,
            sink,
            discards: None,
        }
    }

    /// Report evicted and shutdown-discarded messages on `tx`.
    pub fn with_discard_feed(mut self, tx: mpsc::UnboundedSender<Discarded>) -> Self {
        self.discards = Some(tx);
        self
    }

    /// Main event loop.
    ///
    /// - Waits for the next inbox command or the wake deadline, whichever
    ///   comes first.
    /// - Feeds it into the core runtime.
    /// - Executes the commands returned by the core (dispatch, discard).
    ///
    /// Returns after shutdown has drained the scheduler, or once every handle
    /// has been dropped (which drains the same way). The sink is dropped on
    /// return, closing the outbox for consumers.
    pub async fn run(mut self) -> Result<()> {
        info!("msgsched runtime started");

        loop {
            let deadline = self.core.next_deadline();

            let wake = tokio::select! {
                command = self.inbox.recv() => Wake::Command(command),
                _ = sleep_until_deadline(deadline) => Wake::Timer,
            };

            let keep_running = match wake {
                Wake::Timer => {
                    let step = self.core.step(CoreEvent::TimerFired, Instant::now());
                    self.execute(step.commands).await?;
                    step.keep_running
                }
                Wake::Command(Some(command)) => self.handle_command(command).await?,
                Wake::Command(None) => {
                    info!("all scheduler handles dropped; draining");
                    let step = self.core.step(CoreEvent::ShutdownRequested, Instant::now());
                    self.execute(step.commands).await?;
                    false
                }
            };

            if !keep_running {
                break;
            }
        }

        self.reject_queued();
        info!("runtime exiting");
        Ok(())
    }

    async fn handle_command(&mut self, command: SchedulerCommand) -> Result<bool> {
        match command {
            SchedulerCommand::Submit { message, reply } => {
                let step = self.core.step(CoreEvent::Submit(message), Instant::now());
                // The submitter hears back before any dispatch work happens.
                let _ = reply.send(step.result);
                self.execute(step.commands).await?;
                Ok(step.keep_running)
            }
            SchedulerCommand::Booked { id } => {
                let step = self.core.step(CoreEvent::Booked(id), Instant::now());
                self.execute(step.commands).await?;
                Ok(step.keep_running)
            }
            SchedulerCommand::Shutdown { reply } => {
                let step = self.core.step(CoreEvent::ShutdownRequested, Instant::now());
                let report = report_from(&step.commands);
                self.execute(step.commands).await?;
                let _ = reply.send(report);
                Ok(false)
            }
        }
    }

    /// Execute commands from the core, in order.
    async fn execute(&mut self, commands: Vec<CoreCommand>) -> Result<()> {
        for command in commands {
            match command {
                CoreCommand::Dispatch(batch) => {
                    let ids: Vec<_> = batch.iter().map(|d| d.id.as_str()).collect();
                    debug!(?ids, "dispatching ready messages");
                    self.sink.dispatch(batch).await?;
                }
                CoreCommand::Discard(discarded) => {
                    for item in discarded {
                        warn!(id = %item.id, reason = ?item.reason, "message discarded");
                        if let Some(tx) = &self.discards {
                            let _ = tx.send(item);
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Answer anything still queued in the inbox after the loop stopped.
    fn reject_queued(&mut self) {
        self.inbox.close();
        while let Ok(command) = self.inbox.try_recv() {
            match command {
                SchedulerCommand::Submit { message, reply } => {
                    debug!(id = %message.id, "rejecting submission queued behind shutdown");
                    let _ = reply.send(Err(MsgschedError::Closed));
                }
                SchedulerCommand::Shutdown { reply } => {
                    let _ = reply.send(ShutdownReport::default());
                }
                SchedulerCommand::Booked { .. } => {}
            }
        }
    }
}

fn report_from(commands: &[CoreCommand]) -> ShutdownReport {
    let mut report = ShutdownReport::default();
    for command in commands {
        match command {
            CoreCommand::Dispatch(batch) => {
                report.released.extend(batch.iter().map(|d| d.id.clone()));
            }
            CoreCommand::Discard(discarded) => {
                report.discarded.extend(discarded.iter().cloned());
            }
        }
    }
    report
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

/// A scheduler actor running on the current Tokio runtime.
#[derive(Debug)]
pub struct RunningScheduler {
    /// Submission / booking / shutdown entry point.
    pub handle: SchedulerHandle,
    /// Released messages, for downstream workers.
    pub outbox: Outbox,
    /// Messages dropped by eviction or by the shutdown drain.
    pub discards: mpsc::UnboundedReceiver<Discarded>,
    /// The actor task itself.
    pub task: JoinHandle<Result<()>>,
}

/// Build a scheduler from `config` and spawn its actor loop.
///
/// Must be called from within a Tokio runtime.
pub fn spawn_scheduler(config: &SchedulerConfig) -> RunningScheduler {
    let (tx, rx) = mpsc::channel(config.inbox_capacity.max(1));
    let (sink, outbox) = outbox(config.outbox_capacity);
    let (discard_tx, discards) = mpsc::unbounded_channel();

    let core = CoreRuntime::new(Scheduler::new(config.options()), config.shutdown_policy);
    let runtime = Runtime::new(core, rx, sink).with_discard_feed(discard_tx);

    info!(
        inbox_capacity = config.inbox_capacity,
        outbox_capacity = config.outbox_capacity,
        stall_policy = ?config.stall_policy,
        shutdown_policy = ?config.shutdown_policy,
        "spawning scheduler"
    );

    RunningScheduler {
        handle: SchedulerHandle::new(tx),
        outbox,
        discards,
        task: tokio::spawn(runtime.run()),
    }
}
