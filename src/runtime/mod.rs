//! Counter Runtime
//!
//! A background counter that publishes each value to a single observer and
//! can be stopped cooperatively from any thread.
//!
//! ## Features
//!
//! - **Single-use runs**: one instance counts once; `start` on a used instance fails
//! - **Cooperative stop**: a shared atomic flag checked at the top of every step
//! - **Ordered delivery**: values reach the observer strictly in sequence
//! - **Lifecycle log**: optional JSONL record of run lifecycle events, written by the worker
//!
//! # Example
//! ```rust,no_run
//! use cancellable_counter::runtime::prelude::{CancellableCounter, CounterConfig, CounterError};
//!
//! # fn run() -> Result<(), CounterError> {
//! let counter = CancellableCounter::new(CounterConfig::new().with_bound(10))?
//!     .on_progress(|value| println!("progress: {value}"))
//!     .on_complete(|| println!("done"));
//!
//! counter.start()?;
//! let stop = counter.stop_handle();
//! std::thread::spawn(move || stop.request_stop());
//!
//! let summary = counter.join()?;
//! println!("stopped after {} values", summary.emitted);
//! # Ok(())
//! # }
//! ```

pub mod cancel;
pub mod config;
pub mod counter;
pub mod error;
pub mod event;
pub mod observer;
pub mod output;
pub mod state;

/// Prelude - commonly used types
pub mod prelude {
    pub use crate::runtime::cancel::CancellationToken;
    pub use crate::runtime::config::CounterConfig;
    pub use crate::runtime::counter::{CancellableCounter, RunSummary, StopHandle};
    pub use crate::runtime::error::{CounterError, CounterResult};
    pub use crate::runtime::event::{
        Event,
        EventMeta,
        EventRecord,
        EventSequencer,
        EventSink,
        RunOutcome,
    };
    pub use crate::runtime::observer::{CompletionObserver, ProgressObserver};
    pub use crate::runtime::output::JsonLinesEventLog;
    pub use crate::runtime::state::RunState;
}
