//! Progress and completion observers.
//!
//! A counter delivers values to exactly one [`ProgressObserver`], calling it
//! synchronously from the worker thread. Callers that need the value on
//! another thread (a UI loop, say) marshal it themselves.

use std::fmt::{self, Display};

type ProgressFn = Box<dyn FnMut(u32) -> Result<(), String> + Send>;

/// Single subscriber for progress values.
pub struct ProgressObserver {
    handler: ProgressFn,
}

impl ProgressObserver {
    /// Wrap an infallible handler.
    pub fn new<F>(mut handler: F) -> Self
    where
        F: FnMut(u32) + Send + 'static,
    {
        Self {
            handler: Box::new(move |value| {
                handler(value);
                Ok(())
            }),
        }
    }

    /// Wrap a handler that may fail. A failure halts the run.
    pub fn fallible<F, E>(mut handler: F) -> Self
    where
        F: FnMut(u32) -> Result<(), E> + Send + 'static,
        E: Display,
    {
        Self {
            handler: Box::new(move |value| handler(value).map_err(|err| err.to_string())),
        }
    }

    pub fn notify(&mut self, value: u32) -> Result<(), String> {
        (self.handler)(value)
    }
}

impl fmt::Debug for ProgressObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressObserver").finish()
    }
}

/// One-shot "done" notification, fired when the loop exits.
pub struct CompletionObserver {
    handler: Box<dyn FnOnce() + Send>,
}

impl CompletionObserver {
    pub fn new<F>(handler: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            handler: Box::new(handler),
        }
    }

    pub fn notify(self) {
        (self.handler)()
    }
}

impl fmt::Debug for CompletionObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionObserver").finish()
    }
}
