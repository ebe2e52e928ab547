use std::collections::{HashMap, HashSet};

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::dag::dependency_index::{DependencyIndex, RecentIds};
use crate::dag::message::{Dispatched, MessageState, NewMessage, PendingMessage};
use crate::dag::pending_set::TimeOrderedSet;
use crate::dag::scheduler_step::SchedulerStep;
use crate::errors::{MsgschedError, Result};
use crate::types::{DiscardReason, Discarded, MessageId, ShutdownPolicy, StallPolicy};

/// Default number of booked ids remembered for late-arriving dependents.
pub const DEFAULT_BOOKED_HISTORY: usize = 65_536;

/// Knobs for the synchronous scheduler state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerOptions {
    pub stall_policy: StallPolicy,
    /// Capacity of both the booked-id and the released-id memories.
    pub booked_history: usize,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            stall_policy: StallPolicy::Wait,
            booked_history: DEFAULT_BOOKED_HISTORY,
        }
    }
}

/// Scheduler holds every message that is not yet releasable.
///
/// It is responsible for:
/// - classifying submitted messages by the readiness conditions they still
///   wait on (release time, unbooked parents, or both)
/// - promoting messages once both conditions hold, in
///   `(scheduled_time, arrival_sequence)` order
/// - computing the single wake deadline for the timer
/// - evicting parent-blocked messages when a stall timeout is configured
///
/// It performs no IO and never reads the clock: every call receives `now`.
#[derive(Debug)]
pub struct Scheduler {
    messages: HashMap<MessageId, PendingMessage>,
    dependencies: DependencyIndex,
    release_times: TimeOrderedSet,
    evictions: TimeOrderedSet,
    booked: RecentIds,
    /// Ids this scheduler has pushed to the dispatch queue.
    released: RecentIds,
    next_sequence: u64,
    stall_policy: StallPolicy,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(SchedulerOptions::default())
    }
}

impl Scheduler {
    pub fn new(options: SchedulerOptions) -> Self {
        Self {
            messages: HashMap::new(),
            dependencies: DependencyIndex::new(),
            release_times: TimeOrderedSet::new(),
            evictions: TimeOrderedSet::new(),
            booked: RecentIds::new(options.booked_history),
            released: RecentIds::new(options.booked_history),
            next_sequence: 0,
            stall_policy: options.stall_policy,
        }
    }

    /// Returns `true` if no message is waiting on time or parents.
    pub fn is_idle(&self) -> bool {
        self.messages.is_empty()
    }

    /// Number of messages waiting on time and/or parents.
    pub fn pending_len(&self) -> usize {
        self.messages.len()
    }

    /// Number of messages waiting on `parent` to be booked.
    pub fn waiting_on(&self, parent: &MessageId) -> usize {
        self.dependencies.dependents_of(parent)
    }

    /// Read-only view of a message's lifecycle state.
    pub fn state_of(&self, id: &MessageId) -> Option<MessageState> {
        if let Some(msg) = self.messages.get(id) {
            return Some(msg.state());
        }
        match (self.released.contains(id), self.booked.contains(id)) {
            (_, true) => Some(MessageState::Booked),
            (true, false) => Some(MessageState::Dispatched),
            (false, false) => None,
        }
    }

    /// Whether `id` is waiting here or was released by this scheduler
    /// (within the remembered history).
    ///
    /// An id known only from a booking notification is not tracked: its
    /// own submission is still accepted.
    pub fn is_tracked(&self, id: &MessageId) -> bool {
        self.messages.contains_key(id) || self.released.contains(id)
    }

    /// Earliest instant at which [`Scheduler::on_timer`] has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.release_times.next_deadline(), self.evictions.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Accept a new message and either release it right away or file it
    /// under the readiness conditions it still waits on.
    ///
    /// Fails without changing any state if the message is malformed or its
    /// id is already tracked.
    pub fn submit(&mut self, message: NewMessage, now: Instant) -> Result<SchedulerStep> {
        message.validate()?;

        if self.is_tracked(&message.id) {
            warn!(id = %message.id, "rejecting submission: id already tracked");
            return Err(MsgschedError::DuplicateId(message.id));
        }

        let arrival_sequence = self.next_sequence;
        self.next_sequence += 1;

        let unresolved: HashSet<MessageId> = message
            .parent_ids
            .into_iter()
            .filter(|parent| !self.booked.contains(parent))
            .collect();

        let evict_at = match self.stall_policy {
            StallPolicy::Evict(timeout) if !unresolved.is_empty() => {
                let at = now.checked_add(timeout);
                if at.is_none() {
                    warn!(
                        id = %message.id,
                        ?timeout,
                        "parent timeout overflows the clock; message will wait indefinitely"
                    );
                }
                at
            }
            _ => None,
        };

        let pending = PendingMessage {
            id: message.id,
            scheduled_time: message.scheduled_time,
            weight: message.weight,
            arrival_sequence,
            unresolved,
            time_elapsed: message.scheduled_time <= now,
            evict_at,
        };

        let state = pending.state();
        debug!(
            id = %pending.id,
            seq = arrival_sequence,
            weight = pending.weight,
            unresolved = pending.unresolved.len(),
            ?state,
            "message submitted"
        );

        let mut step = SchedulerStep::default();
        if state == MessageState::Ready {
            step.newly_ready.push(self.promote(pending));
        } else {
            self.file(pending);
        }
        Ok(step)
    }

    /// Record that `parent` is booked and release every dependent for which
    /// it was the last unresolved parent and whose time has come.
    ///
    /// Repeated notifications for the same id are no-ops.
    pub fn notify_booked(&mut self, parent: &MessageId, now: Instant) -> SchedulerStep {
        let mut step = SchedulerStep::default();

        if parent.is_empty() {
            warn!("booking notification with empty id; ignoring");
            return step;
        }

        if !self.booked.insert(parent.clone()) {
            debug!(parent = %parent, "repeated booking notification; ignoring");
            return step;
        }

        let dependents = self.dependencies.resolve(parent);
        if dependents.is_empty() {
            debug!(parent = %parent, "booked id has no waiting dependents");
            return step;
        }

        let mut ready = Vec::new();
        for id in dependents {
            let Some(msg) = self.messages.get_mut(&id) else {
                warn!(id = %id, parent = %parent, "dependency index points at unknown message");
                continue;
            };

            msg.unresolved.remove(parent);
            if !msg.unresolved.is_empty() {
                continue;
            }

            if let Some(at) = msg.evict_at.take() {
                self.evictions.remove(at, msg.arrival_sequence);
            }

            if !msg.time_elapsed && msg.scheduled_time <= now {
                self.release_times.remove(msg.scheduled_time, msg.arrival_sequence);
                msg.time_elapsed = true;
            }

            if msg.time_elapsed {
                ready.push(id);
            } else {
                debug!(id = %id, "last parent booked; waiting for release time");
            }
        }

        let mut ready: Vec<PendingMessage> = ready
            .into_iter()
            .filter_map(|id| self.messages.remove(&id))
            .collect();
        ready.sort_by_key(PendingMessage::order_key);

        for msg in ready {
            step.newly_ready.push(self.promote(msg));
        }
        step
    }

    /// Handle the wake timer: release every due message whose parents are all
    /// booked, and evict parent-blocked messages past their stall deadline.
    pub fn on_timer(&mut self, now: Instant) -> SchedulerStep {
        let mut step = SchedulerStep::default();

        let mut ready = Vec::new();
        for id in self.release_times.pop_due(now) {
            let Some(msg) = self.messages.get_mut(&id) else {
                continue;
            };
            msg.time_elapsed = true;
            if msg.unresolved.is_empty() {
                ready.push(id);
            } else {
                debug!(
                    id = %id,
                    unresolved = msg.unresolved.len(),
                    "release time passed; still waiting on parents"
                );
            }
        }

        for id in ready {
            if let Some(msg) = self.messages.remove(&id) {
                step.newly_ready.push(self.promote(msg));
            }
        }

        for id in self.evictions.pop_due(now) {
            if let Some(msg) = self.messages.remove(&id) {
                warn!(
                    id = %id,
                    unresolved = ?msg.unresolved,
                    "parent not booked within timeout; evicting message"
                );
                self.forget(&msg);
                step.newly_discarded.push(Discarded {
                    id,
                    reason: DiscardReason::ParentTimeout,
                });
            }
        }

        step
    }

    /// Final drain: release whatever is ready at `now`, then dispose of the
    /// rest according to `policy`. Leaves the scheduler idle.
    pub fn shutdown(&mut self, policy: ShutdownPolicy, now: Instant) -> SchedulerStep {
        let mut step = self.on_timer(now);

        let mut remaining: Vec<PendingMessage> =
            self.messages.drain().map(|(_, msg)| msg).collect();
        remaining.sort_by_key(PendingMessage::order_key);

        self.dependencies.clear();
        self.release_times.drain();
        self.evictions.drain();

        info!(
            released = step.newly_ready.len(),
            blocked = remaining.len(),
            ?policy,
            "scheduler drained"
        );

        match policy {
            ShutdownPolicy::Discard => {
                step.newly_discarded.extend(remaining.into_iter().map(|msg| Discarded {
                    id: msg.id,
                    reason: DiscardReason::Shutdown,
                }));
            }
            ShutdownPolicy::Release => {
                for msg in remaining {
                    step.newly_ready.push(self.promote(msg));
                }
            }
        }

        step
    }

    fn file(&mut self, msg: PendingMessage) {
        if !msg.time_elapsed {
            self.release_times
                .insert(msg.scheduled_time, msg.arrival_sequence, msg.id.clone());
        }
        for parent in &msg.unresolved {
            self.dependencies.add(parent.clone(), msg.id.clone());
        }
        if let Some(at) = msg.evict_at {
            self.evictions.insert(at, msg.arrival_sequence, msg.id.clone());
        }
        self.messages.insert(msg.id.clone(), msg);
    }

    /// Remove every index entry that still refers to `msg`.
    fn forget(&mut self, msg: &PendingMessage) {
        if !msg.time_elapsed {
            self.release_times.remove(msg.scheduled_time, msg.arrival_sequence);
        }
        for parent in &msg.unresolved {
            self.dependencies.remove_dependent(parent, &msg.id);
        }
        if let Some(at) = msg.evict_at {
            self.evictions.remove(at, msg.arrival_sequence);
        }
    }

    fn promote(&mut self, msg: PendingMessage) -> Dispatched {
        debug!(
            id = %msg.id,
            seq = msg.arrival_sequence,
            weight = msg.weight,
            "message ready; promoting to dispatch"
        );
        self.released.insert(msg.id.clone());
        msg.to_dispatched()
    }
}
