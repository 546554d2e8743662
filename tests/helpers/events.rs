use std::sync::{Arc, Mutex};
use std::time::Duration;

use cancellable_counter::runtime::error::CounterResult;
use cancellable_counter::runtime::event::{Event, EventRecord, EventSink};

/// Capture lifecycle records for test assertions.
#[derive(Clone, Default)]
pub struct EventCollector {
    records: Arc<Mutex<Vec<EventRecord>>>,
}

impl EventCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sink(&self) -> Arc<dyn EventSink> {
        Arc::new(self.clone())
    }

    pub fn records(&self) -> Vec<EventRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn events(&self) -> Vec<Event> {
        self.records().into_iter().map(|record| record.event).collect()
    }

    pub fn count_where<F>(&self, predicate: F) -> usize
    where
        F: Fn(&Event) -> bool,
    {
        self.records
            .lock()
            .unwrap()
            .iter()
            .filter(|record| predicate(&record.event))
            .count()
    }
}

impl EventSink for EventCollector {
    fn emit(&self, record: &EventRecord) -> CounterResult<()> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

/// Sink that blocks on every record and remembers which thread called it.
#[derive(Clone)]
pub struct StallingSink {
    delay: Duration,
    callers: Arc<Mutex<Vec<Option<String>>>>,
}

impl StallingSink {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            callers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn callers(&self) -> Vec<Option<String>> {
        self.callers.lock().unwrap().clone()
    }
}

impl EventSink for StallingSink {
    fn emit(&self, _record: &EventRecord) -> CounterResult<()> {
        let name = std::thread::current().name().map(str::to_string);
        self.callers.lock().unwrap().push(name);
        std::thread::sleep(self.delay);
        Ok(())
    }
}

pub fn event_name(event: &Event) -> &'static str {
    match event {
        Event::RunStarted { .. } => "run_started",
        Event::StopObserved { .. } => "stop_observed",
        Event::ObserverFailed { .. } => "observer_failed",
        Event::RunFinished { .. } => "run_finished",
    }
}

pub fn event_names(events: &[Event]) -> Vec<&'static str> {
    events.iter().map(event_name).collect()
}
