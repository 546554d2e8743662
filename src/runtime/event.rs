//! Lifecycle event protocol for counter runs.
//!
//! Events describe how a run went: started, stop observed, observer failure,
//! finished. Progress values are not part of the stream; they go only to the
//! registered progress observer. Every event is emitted from the worker
//! thread, so a sink never runs on the thread that asked for a stop.

use serde::{Deserialize, Serialize};

use crate::runtime::error::CounterResult;

/// How a run ended.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunOutcome {
    /// Every value in `[0, bound]` was delivered and no stop was accepted.
    Completed,
    /// A stop was accepted before the worker closed the run.
    Stopped { reason: String },
}

/// Lifecycle events emitted by a counter run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Event {
    RunStarted {
        run_id: String,
        bound: u32,
        interval_ms: u64,
    },
    StopObserved {
        run_id: String,
        reason: String,
        emitted: u64,
    },
    ObserverFailed {
        run_id: String,
        value: u32,
        error: String,
    },
    RunFinished {
        run_id: String,
        outcome: RunOutcome,
        last_value: Option<u32>,
    },
}

impl Event {
    pub fn run_id(&self) -> &str {
        match self {
            Event::RunStarted { run_id, .. }
            | Event::StopObserved { run_id, .. }
            | Event::ObserverFailed { run_id, .. }
            | Event::RunFinished { run_id, .. } => run_id,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Event::RunFinished { .. })
    }
}

/// Metadata stamped on each event by the worker.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMeta {
    pub event_id: String,
    pub timestamp_ms: i64,
    pub seq: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub event: Event,
    pub meta: EventMeta,
}

impl EventRecord {
    pub fn with_meta(event: Event, meta: EventMeta) -> Self {
        Self { event, meta }
    }
}

/// Per-run numbering. Owned by the worker, so plain `&mut` access suffices.
#[derive(Debug, Default)]
pub struct EventSequencer {
    last_seq: u64,
}

impl EventSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, event: Event) -> EventRecord {
        self.last_seq += 1;
        EventRecord::with_meta(
            event,
            EventMeta {
                event_id: uuid::Uuid::new_v4().to_string(),
                timestamp_ms: chrono::Utc::now().timestamp_millis(),
                seq: self.last_seq,
            },
        )
    }
}

/// Receives lifecycle records on the worker thread. A slow sink delays the
/// worker, never the caller.
pub trait EventSink: Send + Sync {
    fn emit(&self, record: &EventRecord) -> CounterResult<()>;
}
