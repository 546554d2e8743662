use cancellable_counter::runtime::config::CounterConfig;
use cancellable_counter::runtime::counter::{CancellableCounter, StopHandle};
use cancellable_counter::runtime::event::{Event, RunOutcome};
use cancellable_counter::runtime::state::RunState;

use crate::helpers::events::EventCollector;

fn assert_send_sync<T: Send + Sync>() {}

#[test]
fn counter_and_handle_are_thread_safe() {
    assert_send_sync::<CancellableCounter>();
    assert_send_sync::<StopHandle>();
}

#[test]
fn stop_before_start_is_recorded_once() {
    let events = EventCollector::new();
    let counter = CancellableCounter::new(CounterConfig::new().with_interval_ms(1))
        .expect("counter")
        .with_event_sink(events.sink());
    let handle = counter.stop_handle();

    handle.request_stop_with_reason("early");
    handle.request_stop_with_reason("later");

    assert!(handle.is_stop_requested());
    assert!(counter.is_stop_requested());
    assert_eq!(counter.state(), RunState::Idle);
    assert!(events.records().is_empty());

    counter.start().expect("start");
    let summary = counter.join().expect("join");
    assert_eq!(
        summary.outcome,
        RunOutcome::Stopped {
            reason: "early".to_string()
        }
    );
    assert_eq!(
        events.events(),
        vec![
            Event::RunStarted {
                run_id: counter.run_id().to_string(),
                bound: 100,
                interval_ms: 1,
            },
            Event::StopObserved {
                run_id: counter.run_id().to_string(),
                reason: "early".to_string(),
                emitted: 0,
            },
            Event::RunFinished {
                run_id: counter.run_id().to_string(),
                outcome: summary.outcome.clone(),
                last_value: None,
            },
        ]
    );
}

#[test]
fn handle_debug_names_the_run() {
    let counter = CancellableCounter::with_defaults();
    let rendered = format!("{:?}", counter.stop_handle());
    assert!(rendered.contains(counter.run_id()));
    assert!(rendered.contains("stop_requested: false"));
}

#[test]
fn handle_outlives_counter_harmlessly() {
    let counter = CancellableCounter::new(CounterConfig::new().with_bound(2).with_interval_ms(1))
        .expect("counter");
    let handle = counter.stop_handle();

    counter.start().expect("start");
    counter.join().expect("join");
    drop(counter);

    handle.request_stop();
    assert!(!handle.is_stop_requested());
}
