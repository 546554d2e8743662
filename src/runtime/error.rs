//! Error types for the counter runtime.

use thiserror::Error;

/// Errors reported by [`CancellableCounter`](crate::runtime::counter::CancellableCounter)
/// and the output sinks.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CounterError {
    #[error("counter is already running")]
    AlreadyRunning,

    #[error("counter has already completed; create a new instance to run again")]
    AlreadyCompleted,

    #[error("counter was never started")]
    NotStarted,

    #[error("invalid counter config: {message}")]
    InvalidConfig { message: String },

    #[error("progress observer failed at value {value}: {message}")]
    ObserverFailed { value: u32, message: String },

    #[error("failed to spawn counter worker: {message}")]
    Spawn { message: String },

    #[error("counter worker panicked")]
    WorkerPanicked,

    #[error("cannot join the counter from its own worker thread")]
    JoinFromWorker,

    #[error("event sink {sink} failed: {message}")]
    EventSink { sink: String, message: String },
}

impl CounterError {
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// True for the errors `start` reports when an instance is reused.
    pub fn is_misuse(&self) -> bool {
        matches!(self, Self::AlreadyRunning | Self::AlreadyCompleted)
    }
}

pub type CounterResult<T> = Result<T, CounterError>;
