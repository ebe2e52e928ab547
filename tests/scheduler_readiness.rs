// tests/scheduler_readiness.rs

use std::time::Duration;

use tokio::time::Instant;

use msgsched::dag::{MessageState, Scheduler, SchedulerOptions};
use msgsched::errors::MsgschedError;
use msgsched::types::{DiscardReason, MessageId, ShutdownPolicy, StallPolicy};
use msgsched_test_utils::builders::MessageBuilder;
use msgsched_test_utils::init_tracing;

fn id(s: &str) -> MessageId {
    MessageId::from(s)
}

fn secs(n: u64) -> Duration {
    Duration::from_secs(n)
}

#[test]
fn message_without_parents_and_past_due_is_released_on_submit() {
    init_tracing();
    let now = Instant::now();
    let mut scheduler = Scheduler::default();

    let step = scheduler
        .submit(MessageBuilder::new("M1", now).overdue_by(secs(1)).build(), now)
        .unwrap();

    assert_eq!(step.ready_ids(), vec!["M1"]);
    assert!(scheduler.is_idle());
    assert_eq!(scheduler.state_of(&id("M1")), Some(MessageState::Dispatched));
}

#[test]
fn message_due_exactly_now_is_released_on_submit() {
    let now = Instant::now();
    let mut scheduler = Scheduler::default();

    let step = scheduler
        .submit(MessageBuilder::new("M1", now).build(), now)
        .unwrap();

    assert_eq!(step.ready_ids(), vec!["M1"]);
}

#[test]
fn initial_state_reflects_both_readiness_conditions() {
    let now = Instant::now();
    let mut scheduler = Scheduler::default();

    scheduler
        .submit(MessageBuilder::new("T", now).due_in(secs(5)).build(), now)
        .unwrap();
    scheduler
        .submit(MessageBuilder::new("P", now).parent("X").build(), now)
        .unwrap();
    scheduler
        .submit(
            MessageBuilder::new("B", now).parent("X").due_in(secs(5)).build(),
            now,
        )
        .unwrap();

    assert_eq!(scheduler.state_of(&id("T")), Some(MessageState::WaitingTime));
    assert_eq!(scheduler.state_of(&id("P")), Some(MessageState::WaitingParent));
    assert_eq!(scheduler.state_of(&id("B")), Some(MessageState::WaitingBoth));
    assert_eq!(scheduler.waiting_on(&id("X")), 2);
    assert_eq!(scheduler.next_deadline(), Some(now + secs(5)));
}

#[test]
fn dual_gating_timer_first_then_booking() {
    let now = Instant::now();
    let mut scheduler = Scheduler::default();

    scheduler
        .submit(
            MessageBuilder::new("M", now).parent("P").due_in(secs(5)).build(),
            now,
        )
        .unwrap();

    let step = scheduler.on_timer(now + secs(5));
    assert!(step.newly_ready.is_empty());
    assert_eq!(scheduler.state_of(&id("M")), Some(MessageState::WaitingParent));
    assert_eq!(scheduler.next_deadline(), None);

    let step = scheduler.notify_booked(&id("P"), now + secs(6));
    assert_eq!(step.ready_ids(), vec!["M"]);
}

#[test]
fn dual_gating_booking_first_then_timer() {
    let now = Instant::now();
    let mut scheduler = Scheduler::default();

    scheduler
        .submit(
            MessageBuilder::new("M", now).parent("P").due_in(secs(5)).build(),
            now,
        )
        .unwrap();

    let step = scheduler.notify_booked(&id("P"), now + secs(1));
    assert!(step.newly_ready.is_empty());
    assert_eq!(scheduler.state_of(&id("M")), Some(MessageState::WaitingTime));

    // An early wake-up must not release it.
    let step = scheduler.on_timer(now + secs(4));
    assert!(step.newly_ready.is_empty());

    let step = scheduler.on_timer(now + secs(5));
    assert_eq!(step.ready_ids(), vec!["M"]);
    assert!(scheduler.is_idle());
}

#[test]
fn booking_after_release_time_passes_releases_without_timer_pass() {
    let now = Instant::now();
    let mut scheduler = Scheduler::default();

    scheduler
        .submit(
            MessageBuilder::new("M", now).parent("P").due_in(secs(5)).build(),
            now,
        )
        .unwrap();

    // The timer has not been processed yet, but the time has passed.
    let step = scheduler.notify_booked(&id("P"), now + secs(7));
    assert_eq!(step.ready_ids(), vec!["M"]);
    assert_eq!(scheduler.next_deadline(), None);
}

#[test]
fn message_with_several_parents_waits_for_all_of_them() {
    let now = Instant::now();
    let mut scheduler = Scheduler::default();

    scheduler
        .submit(MessageBuilder::new("M", now).parents(&["A", "B", "C"]).build(), now)
        .unwrap();

    assert!(scheduler.notify_booked(&id("B"), now).newly_ready.is_empty());
    assert!(scheduler.notify_booked(&id("A"), now).newly_ready.is_empty());
    assert_eq!(scheduler.notify_booked(&id("C"), now).ready_ids(), vec!["M"]);
}

#[test]
fn repeated_parent_ids_count_once() {
    let now = Instant::now();
    let mut scheduler = Scheduler::default();

    scheduler
        .submit(MessageBuilder::new("M", now).parents(&["A", "A"]).build(), now)
        .unwrap();

    assert_eq!(scheduler.notify_booked(&id("A"), now).ready_ids(), vec!["M"]);
}

#[test]
fn timer_pass_releases_due_messages_in_time_then_arrival_order() {
    let now = Instant::now();
    let mut scheduler = Scheduler::default();

    for (name, delay) in [("late", 3), ("early_a", 1), ("mid", 2), ("early_b", 1)] {
        scheduler
            .submit(MessageBuilder::new(name, now).due_in(secs(delay)).build(), now)
            .unwrap();
    }

    let step = scheduler.on_timer(now + secs(3));
    assert_eq!(step.ready_ids(), vec!["early_a", "early_b", "mid", "late"]);
}

#[test]
fn booking_releases_dependents_in_time_then_arrival_order() {
    let now = Instant::now();
    let mut scheduler = Scheduler::default();

    scheduler
        .submit(MessageBuilder::new("c", now).parent("P").overdue_by(secs(1)).build(), now)
        .unwrap();
    scheduler
        .submit(MessageBuilder::new("a", now).parent("P").overdue_by(secs(3)).build(), now)
        .unwrap();
    scheduler
        .submit(MessageBuilder::new("b", now).parent("P").overdue_by(secs(3)).build(), now)
        .unwrap();

    let step = scheduler.notify_booked(&id("P"), now);
    assert_eq!(step.ready_ids(), vec!["a", "b", "c"]);
}

#[test]
fn repeated_booking_is_a_no_op() {
    let now = Instant::now();
    let mut scheduler = Scheduler::default();

    scheduler
        .submit(MessageBuilder::new("M1", now).parent("P").build(), now)
        .unwrap();
    let first = scheduler.notify_booked(&id("P"), now);
    assert_eq!(first.ready_ids(), vec!["M1"]);

    scheduler
        .submit(MessageBuilder::new("M2", now).parent("Q").build(), now)
        .unwrap();
    let second = scheduler.notify_booked(&id("P"), now);
    assert!(second.is_empty());
    assert_eq!(scheduler.state_of(&id("M2")), Some(MessageState::WaitingParent));
}

#[test]
fn booking_for_unknown_id_is_absorbed_and_applies_to_later_dependents() {
    let now = Instant::now();
    let mut scheduler = Scheduler::default();

    let step = scheduler.notify_booked(&id("P"), now);
    assert!(step.is_empty());

    let step = scheduler
        .submit(MessageBuilder::new("M", now).parent("P").build(), now)
        .unwrap();
    assert_eq!(step.ready_ids(), vec!["M"]);
}

#[test]
fn booked_history_forgets_oldest_ids_beyond_capacity() {
    let now = Instant::now();
    let mut scheduler = Scheduler::new(SchedulerOptions {
        booked_history: 2,
        ..SchedulerOptions::default()
    });

    for parent in ["A", "B", "C"] {
        scheduler.notify_booked(&id(parent), now);
    }

    assert_eq!(scheduler.state_of(&id("A")), None);
    assert_eq!(scheduler.state_of(&id("C")), Some(MessageState::Booked));

    let step = scheduler
        .submit(MessageBuilder::new("M", now).parent("A").build(), now)
        .unwrap();
    assert!(step.newly_ready.is_empty());
}

#[test]
fn duplicate_submission_is_rejected_without_changing_state() {
    let now = Instant::now();
    let mut scheduler = Scheduler::default();

    scheduler
        .submit(MessageBuilder::new("M", now).due_in(secs(5)).build(), now)
        .unwrap();

    let err = scheduler
        .submit(MessageBuilder::new("M", now).build(), now)
        .unwrap_err();
    assert!(matches!(err, MsgschedError::DuplicateId(ref dup) if dup.as_str() == "M"));

    assert_eq!(scheduler.pending_len(), 1);
    assert_eq!(scheduler.state_of(&id("M")), Some(MessageState::WaitingTime));
    assert_eq!(scheduler.next_deadline(), Some(now + secs(5)));
}

#[test]
fn dispatched_and_booked_ids_cannot_be_resubmitted() {
    let now = Instant::now();
    let mut scheduler = Scheduler::default();

    scheduler.submit(MessageBuilder::new("M", now).build(), now).unwrap();
    assert!(matches!(
        scheduler.submit(MessageBuilder::new("M", now).build(), now),
        Err(MsgschedError::DuplicateId(_))
    ));

    scheduler.notify_booked(&id("M"), now);
    assert_eq!(scheduler.state_of(&id("M")), Some(MessageState::Booked));
    assert!(matches!(
        scheduler.submit(MessageBuilder::new("M", now).build(), now),
        Err(MsgschedError::DuplicateId(_))
    ));
}

#[test]
fn early_booking_does_not_block_submission_of_the_same_id() {
    let now = Instant::now();
    let mut scheduler = Scheduler::default();

    assert!(scheduler.notify_booked(&id("X"), now).is_empty());
    assert!(!scheduler.is_tracked(&id("X")));

    let step = scheduler
        .submit(MessageBuilder::new("X", now).build(), now)
        .unwrap();
    assert_eq!(step.ready_ids(), vec!["X"]);

    // The earlier booking still counts for dependents.
    let step = scheduler
        .submit(MessageBuilder::new("child", now).parent("X").build(), now)
        .unwrap();
    assert_eq!(step.ready_ids(), vec!["child"]);

    // Once released here, the id is a duplicate.
    assert!(matches!(
        scheduler.submit(MessageBuilder::new("X", now).build(), now),
        Err(MsgschedError::DuplicateId(_))
    ));
}

#[test]
fn early_booked_id_waits_on_its_own_parents() {
    let now = Instant::now();
    let mut scheduler = Scheduler::default();

    scheduler.notify_booked(&id("X"), now);
    let step = scheduler
        .submit(MessageBuilder::new("X", now).parent("P").build(), now)
        .unwrap();
    assert!(step.is_empty());
    assert_eq!(scheduler.state_of(&id("X")), Some(MessageState::WaitingParent));

    assert_eq!(scheduler.notify_booked(&id("P"), now).ready_ids(), vec!["X"]);
}

#[test]
fn released_id_memory_is_bounded() {
    let now = Instant::now();
    let mut scheduler = Scheduler::new(SchedulerOptions {
        booked_history: 2,
        ..SchedulerOptions::default()
    });

    for name in ["A", "B", "C"] {
        let step = scheduler
            .submit(MessageBuilder::new(name, now).build(), now)
            .unwrap();
        assert_eq!(step.ready_ids(), vec![name]);
    }

    assert_eq!(scheduler.state_of(&id("A")), None);
    assert_eq!(scheduler.state_of(&id("B")), Some(MessageState::Dispatched));
    assert_eq!(scheduler.state_of(&id("C")), Some(MessageState::Dispatched));
    assert!(matches!(
        scheduler.submit(MessageBuilder::new("C", now).build(), now),
        Err(MsgschedError::DuplicateId(_))
    ));
}

#[test]
fn malformed_messages_are_rejected_at_the_boundary() {
    let now = Instant::now();
    let mut scheduler = Scheduler::default();

    let empty = MessageBuilder::new("", now).build();
    assert!(matches!(
        scheduler.submit(empty, now),
        Err(MsgschedError::InvalidMessage(_))
    ));

    let own_parent = MessageBuilder::new("M", now).parent("M").build();
    assert!(matches!(
        scheduler.submit(own_parent, now),
        Err(MsgschedError::InvalidMessage(_))
    ));

    let empty_parent = MessageBuilder::new("M", now).parent("").build();
    assert!(matches!(
        scheduler.submit(empty_parent, now),
        Err(MsgschedError::InvalidMessage(_))
    ));

    assert!(scheduler.is_idle());
    assert_eq!(scheduler.state_of(&id("M")), None);
}

#[test]
fn empty_booking_notification_is_ignored() {
    let now = Instant::now();
    let mut scheduler = Scheduler::default();
    assert!(scheduler.notify_booked(&id(""), now).is_empty());
    assert_eq!(scheduler.state_of(&id("")), None);
}

#[test]
fn without_stall_timeout_a_blocked_message_waits_indefinitely() {
    let now = Instant::now();
    let mut scheduler = Scheduler::new(SchedulerOptions {
        stall_policy: StallPolicy::Wait,
        ..SchedulerOptions::default()
    });

    scheduler
        .submit(MessageBuilder::new("M", now).parent("never").build(), now)
        .unwrap();

    assert_eq!(scheduler.next_deadline(), None);
    let step = scheduler.on_timer(now + Duration::from_secs(3600 * 24));
    assert!(step.is_empty());
    assert_eq!(scheduler.state_of(&id("M")), Some(MessageState::WaitingParent));
}

#[test]
fn stall_timeout_evicts_messages_still_waiting_on_parents() {
    let now = Instant::now();
    let mut scheduler = Scheduler::new(SchedulerOptions {
        stall_policy: StallPolicy::Evict(secs(10)),
        ..SchedulerOptions::default()
    });

    scheduler
        .submit(
            MessageBuilder::new("stuck", now).parent("never").due_in(secs(2)).build(),
            now,
        )
        .unwrap();
    scheduler
        .submit(MessageBuilder::new("fine", now).parent("P").build(), now)
        .unwrap();
    assert_eq!(scheduler.next_deadline(), Some(now + secs(2)));

    assert_eq!(scheduler.notify_booked(&id("P"), now + secs(1)).ready_ids(), vec!["fine"]);

    let step = scheduler.on_timer(now + secs(2));
    assert!(step.is_empty());
    assert_eq!(scheduler.next_deadline(), Some(now + secs(10)));

    let step = scheduler.on_timer(now + secs(10));
    assert!(step.newly_ready.is_empty());
    assert_eq!(step.newly_discarded.len(), 1);
    assert_eq!(step.newly_discarded[0].id, id("stuck"));
    assert_eq!(step.newly_discarded[0].reason, DiscardReason::ParentTimeout);

    assert!(scheduler.is_idle());
    assert_eq!(scheduler.waiting_on(&id("never")), 0);
    assert_eq!(scheduler.next_deadline(), None);

    // A late booking for the evicted message's parent has nothing to release.
    assert!(scheduler.notify_booked(&id("never"), now + secs(11)).is_empty());
}

#[test]
fn stall_timeout_beyond_the_clock_range_means_waiting_indefinitely() {
    let now = Instant::now();
    let mut scheduler = Scheduler::new(SchedulerOptions {
        stall_policy: StallPolicy::Evict(Duration::MAX),
        ..SchedulerOptions::default()
    });

    scheduler
        .submit(MessageBuilder::new("M", now).parent("P").build(), now)
        .unwrap();
    assert_eq!(scheduler.state_of(&id("M")), Some(MessageState::WaitingParent));
    assert_eq!(scheduler.next_deadline(), None);

    scheduler
        .submit(MessageBuilder::new("N", now).parent("P").build(), now)
        .unwrap();
    assert_eq!(scheduler.notify_booked(&id("P"), now).ready_ids(), vec!["M", "N"]);
}

#[test]
fn stall_timeout_does_not_apply_to_messages_only_waiting_on_time() {
    let now = Instant::now();
    let mut scheduler = Scheduler::new(SchedulerOptions {
        stall_policy: StallPolicy::Evict(secs(1)),
        ..SchedulerOptions::default()
    });

    scheduler
        .submit(MessageBuilder::new("M", now).due_in(secs(30)).build(), now)
        .unwrap();

    assert!(scheduler.on_timer(now + secs(5)).is_empty());
    assert_eq!(scheduler.on_timer(now + secs(30)).ready_ids(), vec!["M"]);
}

#[test]
fn shutdown_with_discard_policy_releases_ready_and_reports_the_rest() {
    let now = Instant::now();
    let mut scheduler = Scheduler::default();

    scheduler
        .submit(MessageBuilder::new("due", now).due_in(secs(1)).build(), now)
        .unwrap();
    scheduler
        .submit(MessageBuilder::new("future", now).due_in(secs(60)).build(), now)
        .unwrap();
    scheduler
        .submit(MessageBuilder::new("blocked", now).parent("P").build(), now)
        .unwrap();

    let step = scheduler.shutdown(ShutdownPolicy::Discard, now + secs(2));

    assert_eq!(step.ready_ids(), vec!["due"]);
    let discarded: Vec<_> = step
        .newly_discarded
        .iter()
        .map(|d| (d.id.as_str(), d.reason))
        .collect();
    assert_eq!(
        discarded,
        vec![
            ("blocked", DiscardReason::Shutdown),
            ("future", DiscardReason::Shutdown),
        ]
    );
    assert!(scheduler.is_idle());
    assert_eq!(scheduler.next_deadline(), None);
}

#[test]
fn shutdown_with_release_policy_dispatches_everything_in_order() {
    let now = Instant::now();
    let mut scheduler = Scheduler::default();

    scheduler
        .submit(MessageBuilder::new("future", now).due_in(secs(60)).build(), now)
        .unwrap();
    scheduler
        .submit(MessageBuilder::new("blocked", now).parent("P").build(), now)
        .unwrap();
    scheduler
        .submit(MessageBuilder::new("due", now).due_in(secs(1)).build(), now)
        .unwrap();

    let step = scheduler.shutdown(ShutdownPolicy::Release, now + secs(2));

    assert_eq!(step.ready_ids(), vec!["due", "blocked", "future"]);
    assert!(step.newly_discarded.is_empty());
}

#[test]
fn m1_m2_scenario() {
    init_tracing();
    let now = Instant::now();
    let mut scheduler = Scheduler::default();

    let step = scheduler
        .submit(
            MessageBuilder::new("M1", now).overdue_by(secs(1)).weight(5).build(),
            now,
        )
        .unwrap();
    assert_eq!(step.ready_ids(), vec!["M1"]);

    let step = scheduler
        .submit(
            MessageBuilder::new("M2", now).parent("M1").due_in(secs(5)).weight(5).build(),
            now,
        )
        .unwrap();
    assert!(step.is_empty());

    let step = scheduler.notify_booked(&id("M1"), now + secs(1));
    assert!(step.is_empty());
    assert_eq!(scheduler.state_of(&id("M2")), Some(MessageState::WaitingTime));

    assert_eq!(scheduler.next_deadline(), Some(now + secs(5)));
    let step = scheduler.on_timer(now + secs(5));
    assert_eq!(step.ready_ids(), vec!["M2"]);
    assert_eq!(step.newly_ready[0].weight, 5);
}
