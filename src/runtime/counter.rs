//! Cancellable background counter.
//!
//! One instance is one run: construct, register observers, `start`, then
//! either let it reach its bound or `request_stop`. A stopped instance is
//! inert; create a new one to count again.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::thread::{self, JoinHandle, ThreadId};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use crate::runtime::cancel::CancellationToken;
use crate::runtime::config::CounterConfig;
use crate::runtime::error::{CounterError, CounterResult};
use crate::runtime::event::{Event, EventSequencer, EventSink, RunOutcome};
use crate::runtime::observer::{CompletionObserver, ProgressObserver};
use crate::runtime::state::{RunState, StateCell};

const WORKER_THREAD_NAME: &str = "counter-worker";
const STOP_REASON: &str = "stop requested";
const OBSERVER_FAILED_REASON: &str = "observer failed";
const DROPPED_REASON: &str = "counter dropped";

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Result of a finished run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: String,
    pub outcome: RunOutcome,
    /// Number of values delivered to the observer
    pub emitted: u64,
    pub last_value: Option<u32>,
    pub elapsed_ms: u64,
}

impl RunSummary {
    pub fn is_completed(&self) -> bool {
        self.outcome == RunOutcome::Completed
    }
}

/// Clonable handle for requesting a stop from any thread.
#[derive(Clone)]
pub struct StopHandle {
    run_id: String,
    token: CancellationToken,
}

impl StopHandle {
    /// Ask the worker to stop. Only flips the shared flag; the worker notices
    /// it at the top of its next iteration.
    pub fn request_stop(&self) {
        self.request_stop_with_reason(STOP_REASON);
    }

    /// Like [`request_stop`](Self::request_stop), recording `reason`. Only the
    /// first request on a run counts; requests after the run ended are ignored.
    pub fn request_stop_with_reason(&self, reason: impl Into<String>) {
        let reason = reason.into();
        if self.token.cancel(reason.as_str()) {
            debug!(run_id = %self.run_id, reason = %reason, "counter stop requested");
        }
    }

    pub fn is_stop_requested(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl std::fmt::Debug for StopHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StopHandle")
            .field("run_id", &self.run_id)
            .field("stop_requested", &self.token.is_cancelled())
            .finish()
    }
}

/// Moves the state to `Stopped` even if the observer panics.
struct FinishGuard(Arc<StateCell>);

impl Drop for FinishGuard {
    fn drop(&mut self) {
        self.0.finish();
    }
}

/// Everything the worker thread owns for one run.
struct Worker {
    run_id: String,
    config: CounterConfig,
    token: CancellationToken,
    state: Arc<StateCell>,
    emitted: Arc<AtomicU64>,
    sink: Option<Arc<dyn EventSink>>,
    sequencer: EventSequencer,
    observer: Option<ProgressObserver>,
    completion: Option<CompletionObserver>,
}

impl Worker {
    fn emit(&mut self, event: Event) {
        let Some(sink) = self.sink.clone() else {
            return;
        };
        let record = self.sequencer.record(event);
        if let Err(err) = sink.emit(&record) {
            warn!(run_id = %self.run_id, seq = record.meta.seq, error = %err, "event sink failed");
        }
    }

    fn run(mut self) -> CounterResult<RunSummary> {
        let guard = FinishGuard(Arc::clone(&self.state));
        let started = Instant::now();
        let bound = u64::from(self.config.bound);
        let interval = self.config.interval();

        info!(
            run_id = %self.run_id,
            bound = self.config.bound,
            interval_ms = self.config.interval_ms,
            "counter run started"
        );
        self.emit(Event::RunStarted {
            run_id: self.run_id.clone(),
            bound: self.config.bound,
            interval_ms: self.config.interval_ms,
        });

        let mut value: u64 = 0;
        let mut failure = None;
        while !self.token.is_cancelled() && value <= bound {
            // value <= bound, so it fits in u32
            let current = value as u32;
            if let Some(observer) = self.observer.as_mut() {
                if let Err(message) = observer.notify(current) {
                    self.token.cancel(OBSERVER_FAILED_REASON);
                    warn!(run_id = %self.run_id, value = current, error = %message, "progress observer failed");
                    failure = Some(CounterError::ObserverFailed {
                        value: current,
                        message,
                    });
                    break;
                }
            }
            self.emitted.store(value + 1, Ordering::SeqCst);
            trace!(run_id = %self.run_id, value = current, "progress");
            value += 1;
            thread::sleep(interval);
        }

        // Seal the token before publishing Stopped: a stop either lands before
        // this point and shapes the outcome, or it is rejected.
        let stop_reason = self.token.close();
        drop(guard);

        let emitted = self.emitted.load(Ordering::SeqCst);
        let last_value = emitted.checked_sub(1).map(|last| last as u32);
        match (&failure, &stop_reason) {
            (Some(CounterError::ObserverFailed { value, message }), _) => {
                self.emit(Event::ObserverFailed {
                    run_id: self.run_id.clone(),
                    value: *value,
                    error: message.clone(),
                });
            }
            (_, Some(reason)) => {
                debug!(run_id = %self.run_id, reason = %reason, emitted, "counter stop observed");
                self.emit(Event::StopObserved {
                    run_id: self.run_id.clone(),
                    reason: reason.clone(),
                    emitted,
                });
            }
            _ => {}
        }

        let outcome = match stop_reason {
            Some(reason) => RunOutcome::Stopped { reason },
            None => RunOutcome::Completed,
        };
        let summary = RunSummary {
            run_id: self.run_id.clone(),
            outcome: outcome.clone(),
            emitted,
            last_value,
            elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        };

        info!(
            run_id = %self.run_id,
            emitted,
            last_value = ?last_value,
            outcome = ?outcome,
            elapsed_ms = summary.elapsed_ms,
            "counter run finished"
        );
        self.emit(Event::RunFinished {
            run_id: self.run_id.clone(),
            outcome,
            last_value,
        });
        if let Some(completion) = self.completion.take() {
            completion.notify();
        }

        match failure {
            Some(err) => Err(err),
            None => Ok(summary),
        }
    }
}

/// A counter that runs on its own thread and can be stopped early.
pub struct CancellableCounter {
    run_id: String,
    config: CounterConfig,
    token: CancellationToken,
    state: Arc<StateCell>,
    emitted: Arc<AtomicU64>,
    sink: Option<Arc<dyn EventSink>>,
    observer: Mutex<Option<ProgressObserver>>,
    completion: Mutex<Option<CompletionObserver>>,
    worker_id: Arc<OnceLock<ThreadId>>,
    worker: Mutex<Option<JoinHandle<CounterResult<RunSummary>>>>,
    summary: Mutex<Option<CounterResult<RunSummary>>>,
}

impl CancellableCounter {
    pub fn new(config: CounterConfig) -> CounterResult<Self> {
        config.validate()?;
        Ok(Self::from_config(config))
    }

    /// Counter with the default bound (100) and interval (50 ms).
    pub fn with_defaults() -> Self {
        Self::from_config(CounterConfig::default())
    }

    fn from_config(config: CounterConfig) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            config,
            token: CancellationToken::new(),
            state: Arc::new(StateCell::new()),
            emitted: Arc::new(AtomicU64::new(0)),
            sink: None,
            observer: Mutex::new(None),
            completion: Mutex::new(None),
            worker_id: Arc::new(OnceLock::new()),
            worker: Mutex::new(None),
            summary: Mutex::new(None),
        }
    }

    /// Register the progress observer. Replaces any earlier registration.
    pub fn on_progress<F>(self, handler: F) -> Self
    where
        F: FnMut(u32) + Send + 'static,
    {
        self.with_observer(ProgressObserver::new(handler))
    }

    /// Register a progress observer that may fail. The first failure stops
    /// the run and is returned from [`join`](Self::join).
    pub fn on_progress_fallible<F, E>(self, handler: F) -> Self
    where
        F: FnMut(u32) -> Result<(), E> + Send + 'static,
        E: std::fmt::Display,
    {
        self.with_observer(ProgressObserver::fallible(handler))
    }

    pub fn with_observer(self, observer: ProgressObserver) -> Self {
        *lock(&self.observer) = Some(observer);
        self
    }

    /// Register a completion observer, called once when the loop exits.
    pub fn on_complete<F>(self, handler: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        *lock(&self.completion) = Some(CompletionObserver::new(handler));
        self
    }

    /// Stream lifecycle records to `sink`. The sink is called on the worker
    /// thread only.
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Launch the worker thread and return without waiting for it.
    pub fn start(&self) -> CounterResult<()> {
        let mut worker = lock(&self.worker);
        if let Err(err) = self.state.begin() {
            warn!(run_id = %self.run_id, error = %err, "counter start rejected");
            return Err(err);
        }

        let job = Worker {
            run_id: self.run_id.clone(),
            config: self.config,
            token: self.token.clone(),
            state: Arc::clone(&self.state),
            emitted: Arc::clone(&self.emitted),
            sink: self.sink.clone(),
            sequencer: EventSequencer::new(),
            observer: lock(&self.observer).take(),
            completion: lock(&self.completion).take(),
        };
        let worker_id = Arc::clone(&self.worker_id);

        match thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || {
                let _ = worker_id.set(thread::current().id());
                job.run()
            }) {
            Ok(handle) => {
                *worker = Some(handle);
                Ok(())
            }
            Err(err) => {
                self.token.close();
                self.state.finish();
                warn!(run_id = %self.run_id, error = %err, "failed to spawn counter worker");
                Err(CounterError::Spawn {
                    message: err.to_string(),
                })
            }
        }
    }

    pub fn request_stop(&self) {
        self.stop_handle().request_stop();
    }

    pub fn request_stop_with_reason(&self, reason: impl Into<String>) {
        self.stop_handle().request_stop_with_reason(reason);
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            run_id: self.run_id.clone(),
            token: self.token.clone(),
        }
    }

    /// Block until the worker exits. Later calls return the same result.
    ///
    /// Calling this from an observer fails with
    /// [`CounterError::JoinFromWorker`]; the worker cannot wait for itself.
    pub fn join(&self) -> CounterResult<RunSummary> {
        if self.worker_id.get() == Some(&thread::current().id()) {
            return Err(CounterError::JoinFromWorker);
        }

        let mut summary = lock(&self.summary);
        if let Some(result) = summary.as_ref() {
            return result.clone();
        }

        let Some(handle) = lock(&self.worker).take() else {
            return Err(CounterError::NotStarted);
        };
        let result = handle
            .join()
            .unwrap_or_else(|_| Err(CounterError::WorkerPanicked));
        *summary = Some(result.clone());
        result
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn config(&self) -> &CounterConfig {
        &self.config
    }

    pub fn state(&self) -> RunState {
        self.state.get()
    }

    pub fn is_running(&self) -> bool {
        self.state.get() == RunState::Running
    }

    /// True once a stop was accepted. Never flips after the run finished.
    pub fn is_stop_requested(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Values delivered to the observer so far.
    pub fn emitted(&self) -> u64 {
        self.emitted.load(Ordering::SeqCst)
    }

    pub fn last_value(&self) -> Option<u32> {
        self.emitted().checked_sub(1).map(|last| last as u32)
    }
}

impl std::fmt::Debug for CancellableCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellableCounter")
            .field("run_id", &self.run_id)
            .field("config", &self.config)
            .field("state", &self.state.get())
            .field("emitted", &self.emitted())
            .finish()
    }
}

impl Drop for CancellableCounter {
    fn drop(&mut self) {
        let handle = lock(&self.worker).take();
        let Some(handle) = handle else {
            return;
        };
        self.request_stop_with_reason(DROPPED_REASON);
        // Dropped from inside a callback on the worker itself; it will exit on
        // its own once the callback returns.
        if handle.thread().id() == thread::current().id() {
            return;
        }
        if handle.join().is_err() {
            warn!(run_id = %self.run_id, "counter worker panicked during shutdown");
        }
    }
}
