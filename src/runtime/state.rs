//! Run lifecycle for a single counter instance.

use std::sync::atomic::{AtomicU8, Ordering};

use serde::{Deserialize, Serialize};

use crate::runtime::error::{CounterError, CounterResult};

/// Lifecycle of one counter instance. `Stopped` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    Idle,
    Running,
    Stopped,
}

impl RunState {
    fn as_u8(self) -> u8 {
        match self {
            RunState::Idle => 0,
            RunState::Running => 1,
            RunState::Stopped => 2,
        }
    }

    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => RunState::Idle,
            1 => RunState::Running,
            _ => RunState::Stopped,
        }
    }
}

/// Atomic cell holding a [`RunState`], shared between caller and worker.
#[derive(Debug)]
pub struct StateCell {
    raw: AtomicU8,
}

impl Default for StateCell {
    fn default() -> Self {
        Self {
            raw: AtomicU8::new(RunState::Idle.as_u8()),
        }
    }
}

impl StateCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> RunState {
        RunState::from_u8(self.raw.load(Ordering::SeqCst))
    }

    /// Idle -> Running. Fails with the error matching the current state
    /// otherwise, leaving it unchanged.
    pub fn begin(&self) -> CounterResult<()> {
        match self.raw.compare_exchange(
            RunState::Idle.as_u8(),
            RunState::Running.as_u8(),
            Ordering::SeqCst,
            Ordering::SeqCst,
        ) {
            Ok(_) => Ok(()),
            Err(current) => match RunState::from_u8(current) {
                RunState::Running => Err(CounterError::AlreadyRunning),
                _ => Err(CounterError::AlreadyCompleted),
            },
        }
    }

    /// Move to the terminal state. Idempotent.
    pub fn finish(&self) {
        self.raw.store(RunState::Stopped.as_u8(), Ordering::SeqCst);
    }
}
