// tests/property_scheduler.rs

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use proptest::prelude::*;

use taskpoll::engine::{
    AdaptiveInterval, CoreCommand, CoreEvent, CoreRuntime, PollerOptions, PollerState,
};
use taskpoll::fetch::TickReport;
use taskpoll::types::{TaskId, TaskSnapshot, TaskStatus};
use taskpoll::watchset::{active_ids, CompletedSet};

fn options_strategy() -> impl Strategy<Value = PollerOptions> {
    (1u64..5_000, 0u64..20_000, 1u64..3_000).prop_map(|(min, extra, step)| PollerOptions {
        min_interval: Duration::from_millis(min),
        max_interval: Duration::from_millis(min + extra),
        step: Duration::from_millis(step),
        auto_start: false,
    })
}

fn status_strategy() -> impl Strategy<Value = Option<TaskStatus>> {
    // `None` means the query for that id failed.
    prop_oneof![
        Just(None),
        Just(Some(TaskStatus::Pending)),
        Just(Some(TaskStatus::Running)),
        Just(Some(TaskStatus::Succeeded)),
        Just(Some(TaskStatus::Failed)),
    ]
}

fn watch_set(n: usize) -> Vec<TaskId> {
    (0..n).map(|i| format!("task_{i}")).collect()
}

proptest! {
    #[test]
    fn active_ids_is_ordered_difference(
        raw in proptest::collection::vec(0usize..12, 0..20),
        done in proptest::collection::hash_set(0usize..12, 0..8),
    ) {
        let w: Vec<TaskId> = raw.iter().map(|i| format!("t{i}")).collect();
        let mut completed = CompletedSet::new();
        for i in &done {
            completed.record(&TaskSnapshot::new(format!("t{i}"), TaskStatus::Succeeded));
        }

        let active = active_ids(&w, &completed);

        // Nothing completed, nothing repeated.
        prop_assert!(active.iter().all(|id| !completed.contains(id)));
        let unique: HashSet<&TaskId> = active.iter().collect();
        prop_assert_eq!(unique.len(), active.len());

        // Same relative order as the watch set (first occurrences).
        let mut seen = HashSet::new();
        let expected: Vec<TaskId> = w
            .iter()
            .filter(|id| !completed.contains(id))
            .filter(|id| seen.insert((*id).clone()))
            .cloned()
            .collect();
        prop_assert_eq!(&active, &expected);

        // Idempotent for an unchanged completed set.
        prop_assert_eq!(active_ids(&w, &completed), active);
    }

    #[test]
    fn interval_never_leaves_bounds(
        options in options_strategy(),
        in_flight in proptest::collection::vec(any::<bool>(), 0..60),
    ) {
        let mut interval = AdaptiveInterval::new(&options);
        prop_assert_eq!(interval.current(), options.min_interval);

        for busy in in_flight {
            let before = interval.current();
            let after = interval.adapt(busy);
            prop_assert!(after >= options.min_interval && after <= options.max_interval);
            if busy {
                prop_assert_eq!(after, (before + options.step).min(options.max_interval));
            } else {
                prop_assert_eq!(after, options.min_interval);
            }
        }
    }

    #[test]
    fn busy_ticks_converge_to_max(options in options_strategy()) {
        let mut interval = AdaptiveInterval::new(&options);
        let span = (options.max_interval - options.min_interval).as_millis() as u64;
        let step = options.step.as_millis() as u64;
        let ticks = span.div_ceil(step);

        let mut last = interval.current();
        for _ in 0..ticks {
            let next = interval.grow();
            prop_assert!(next >= last);
            last = next;
        }
        prop_assert_eq!(interval.current(), options.max_interval);
        prop_assert_eq!(interval.grow(), options.max_interval);
    }

    #[test]
    fn core_completes_each_task_once_and_never_requeries_it(
        options in options_strategy(),
        n in 1usize..6,
        ticks in proptest::collection::vec(proptest::collection::vec(status_strategy(), 6), 1..30),
    ) {
        let w = watch_set(n);
        let mut core = CoreRuntime::new(options);
        core.step(CoreEvent::StartRequested { watch_set: w.clone() });

        let mut completions: HashMap<TaskId, usize> = HashMap::new();
        let mut terminal_seen: HashSet<TaskId> = HashSet::new();

        for outcome in ticks {
            if core.state() != PollerState::Scheduled {
                break;
            }
            let step = core.step(CoreEvent::TimerFired { visible: true, watch_set: w.clone() });
            let Some(ids) = step.fetch_ids().map(<[TaskId]>::to_vec) else {
                break;
            };

            for id in &ids {
                prop_assert!(!terminal_seen.contains(id), "{} queried after completing", id);
            }

            let mut report = TickReport { queried: ids.clone(), ..TickReport::default() };
            for (i, id) in ids.iter().enumerate() {
                let slot = id.trim_start_matches("task_").parse::<usize>().unwrap_or(i);
                match outcome[slot % outcome.len()] {
                    Some(status) => {
                        if status.is_terminal() {
                            terminal_seen.insert(id.clone());
                        }
                        report.snapshots.push(TaskSnapshot::new(id.clone(), status));
                    }
                    None => report.failed.push(id.clone()),
                }
            }

            let session = core.session_id();
            let step = core.step(CoreEvent::TickSettled { session, report, watch_set: w.clone() });
            for command in &step.commands {
                if let CoreCommand::NotifyComplete(s) = command {
                    *completions.entry(s.id.clone()).or_default() += 1;
                }
                if let CoreCommand::ArmTimer(delay) = command {
                    prop_assert!(*delay >= options.min_interval && *delay <= options.max_interval);
                }
            }
            prop_assert!(
                core.current_interval() >= options.min_interval
                    && core.current_interval() <= options.max_interval
            );
        }

        prop_assert!(completions.values().all(|count| *count == 1));
        prop_assert_eq!(completions.len(), terminal_seen.len());
        if core.state() == PollerState::Idle {
            prop_assert_eq!(terminal_seen.len(), n);
        }
    }
}
