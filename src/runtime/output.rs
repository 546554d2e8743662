//! Append-only JSON Lines log of run lifecycle records.

use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::runtime::error::{CounterError, CounterResult};
use crate::runtime::event::{EventRecord, EventSink};

const LOG_NAME: &str = "jsonl";

/// Writes one [`EventRecord`] per line. The writer is flushed after the
/// terminal `RunFinished` record so a tailing reader sees the whole run.
pub struct JsonLinesEventLog<W: Write + Send> {
    writer: Mutex<W>,
    written: AtomicU64,
}

impl<W: Write + Send> JsonLinesEventLog<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
            written: AtomicU64::new(0),
        }
    }

    /// Records successfully written so far.
    pub fn written(&self) -> u64 {
        self.written.load(Ordering::SeqCst)
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    fn append(&self, record: &EventRecord) -> std::io::Result<()> {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        serde_json::to_writer(&mut *writer, record)?;
        writer.write_all(b"\n")?;
        if record.event.is_terminal() {
            writer.flush()?;
        }
        Ok(())
    }
}

impl<W: Write + Send> std::fmt::Debug for JsonLinesEventLog<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonLinesEventLog")
            .field("written", &self.written())
            .finish()
    }
}

impl<W: Write + Send> EventSink for JsonLinesEventLog<W> {
    fn emit(&self, record: &EventRecord) -> CounterResult<()> {
        self.append(record).map_err(|err| CounterError::EventSink {
            sink: LOG_NAME.to_string(),
            message: format!("seq {}: {}", record.meta.seq, err),
        })?;
        self.written.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
