use std::collections::{HashMap, HashSet};
use std::time::Duration;

use proptest::prelude::*;
use tokio::time::Instant;

use msgsched::dag::{Dispatched, Scheduler, SchedulerStep};
use msgsched_test_utils::builders::MessageBuilder;

/// A generated workload: per message, a delay in seconds and its parents.
///
/// Acyclicity is ensured by only letting message N depend on messages
/// 0..N-1.
#[derive(Debug, Clone)]
struct Workload {
    delays: Vec<u64>,
    parents: Vec<Vec<usize>>,
    reverse_submission: bool,
}

fn workload_strategy(max_messages: usize) -> impl Strategy<Value = Workload> {
    (1..=max_messages).prop_flat_map(|n| {
        (
            proptest::collection::vec(0u64..10, n),
            proptest::collection::vec(proptest::collection::vec(any::<usize>(), 0..4), n),
            any::<bool>(),
        )
            .prop_map(|(delays, raw_parents, reverse_submission)| {
                let parents = raw_parents
                    .into_iter()
                    .enumerate()
                    .map(|(i, raw)| {
                        if i == 0 {
                            return Vec::new();
                        }
                        let unique: HashSet<usize> = raw.into_iter().map(|p| p % i).collect();
                        unique.into_iter().collect()
                    })
                    .collect();
                Workload {
                    delays,
                    parents,
                    reverse_submission,
                }
            })
    })
}

fn name(i: usize) -> String {
    format!("m{i}")
}

/// Tracks everything the scheduler has released and checks each batch.
struct Observer<'a> {
    workload: &'a Workload,
    base: Instant,
    index: HashMap<String, usize>,
    released: HashSet<usize>,
    booked: HashSet<usize>,
    to_book: Vec<usize>,
}

impl Observer<'_> {
    fn observe(&mut self, step: SchedulerStep, now: Instant) -> Result<(), TestCaseError> {
        prop_assert!(step.newly_discarded.is_empty());

        for pair in step.newly_ready.windows(2) {
            prop_assert!(order_key(&pair[0]) < order_key(&pair[1]));
        }

        for dispatched in step.newly_ready {
            let i = self.index[dispatched.id.as_str()];
            prop_assert!(self.released.insert(i), "{} released twice", dispatched.id);
            prop_assert!(
                self.base + Duration::from_secs(self.workload.delays[i]) <= now,
                "{} released before its time",
                dispatched.id
            );
            for parent in &self.workload.parents[i] {
                prop_assert!(
                    self.booked.contains(parent),
                    "{} released before parent {} was booked",
                    dispatched.id,
                    name(*parent)
                );
            }
            self.to_book.push(i);
        }
        Ok(())
    }
}

fn order_key(d: &Dispatched) -> (Instant, u64) {
    (d.scheduled_time, d.arrival_sequence)
}

proptest! {
    #[test]
    fn every_message_is_released_once_and_only_when_ready(workload in workload_strategy(24)) {
        let base = Instant::now();
        let mut scheduler = Scheduler::default();
        let n = workload.delays.len();

        let mut observer = Observer {
            workload: &workload,
            base,
            index: (0..n).map(|i| (name(i), i)).collect(),
            released: HashSet::new(),
            booked: HashSet::new(),
            to_book: Vec::new(),
        };

        let mut order: Vec<usize> = (0..n).collect();
        if workload.reverse_submission {
            order.reverse();
        }
        for i in order {
            let mut builder = MessageBuilder::new(&name(i), base)
                .due_in(Duration::from_secs(workload.delays[i]));
            for parent in &workload.parents[i] {
                builder = builder.parent(&name(*parent));
            }
            let step = scheduler.submit(builder.build(), base).unwrap();
            observer.observe(step, base)?;
        }

        // Each tick: fire the timer, then book whatever was released so far.
        let ticks = 10 + n as u64 + 1;
        for tick in 0..=ticks {
            let now = base + Duration::from_secs(tick);
            let step = scheduler.on_timer(now);
            observer.observe(step, now)?;

            for i in std::mem::take(&mut observer.to_book) {
                observer.booked.insert(i);
                let step = scheduler.notify_booked(&name(i).into(), now);
                observer.observe(step, now)?;
            }
        }

        prop_assert_eq!(observer.released.len(), n);
        prop_assert!(scheduler.is_idle());
        prop_assert_eq!(scheduler.next_deadline(), None);
    }
}
