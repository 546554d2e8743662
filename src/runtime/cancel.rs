//! Cancellation primitives for the counter worker.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct TokenState {
    reason: Option<String>,
    closed: bool,
}

/// Cooperative cancellation token shared by the worker and its stop handles.
///
/// Cancelling is idempotent: only the first call flips the flag and records a
/// reason. Once the worker closes the token at the end of its run, further
/// cancel requests are rejected.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
    state: Arc<Mutex<TokenState>>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, TokenState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Request cancellation. Returns `true` if this call was the one that
    /// flipped the flag.
    pub fn cancel(&self, reason: impl Into<String>) -> bool {
        let mut state = self.state();
        if state.closed || self.cancelled.load(Ordering::SeqCst) {
            return false;
        }
        state.reason = Some(reason.into());
        self.cancelled.store(true, Ordering::SeqCst);
        true
    }

    /// Seal the token. Returns the stop reason if cancellation was accepted
    /// before the seal.
    pub fn close(&self) -> Option<String> {
        let mut state = self.state();
        state.closed = true;
        if self.cancelled.load(Ordering::SeqCst) {
            Some(state.reason.clone().unwrap_or_else(|| "cancelled".to_string()))
        } else {
            None
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn reason(&self) -> Option<String> {
        self.state().reason.clone()
    }
}
