//! Runs a counter with a text progress bar on stderr and JSONL event records
//! on stdout.
//!
//! ```text
//! cargo run --example progress -- [stop_after_ms] [config.json]
//! ```

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use cancellable_counter::runtime::prelude::{
    CancellableCounter,
    CounterConfig,
    CounterError,
    JsonLinesEventLog,
};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "cancellable_counter=info";

fn render_bar(value: u32, bound: u32) {
    let width = 40usize;
    let filled = if bound == 0 {
        width
    } else {
        (value as usize * width) / bound as usize
    };
    eprint!(
        "\r[{}{}] {:>3}/{}",
        "#".repeat(filled),
        " ".repeat(width - filled),
        value,
        bound
    );
    let _ = std::io::stderr().flush();
}

fn main() -> Result<(), CounterError> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let stop_after = args
        .next()
        .and_then(|raw| raw.parse::<u64>().ok())
        .map(Duration::from_millis);
    let config = match args.next() {
        Some(path) => CounterConfig::from_json_file(path)?,
        None => CounterConfig::default(),
    };
    let bound = config.bound;

    let counter = CancellableCounter::new(config)?
        .on_progress(move |value| render_bar(value, bound))
        .on_complete(|| eprintln!())
        .with_event_sink(Arc::new(JsonLinesEventLog::new(std::io::stdout())));

    counter.start()?;
    if let Some(delay) = stop_after {
        let stop = counter.stop_handle();
        std::thread::spawn(move || {
            std::thread::sleep(delay);
            stop.request_stop_with_reason("deadline reached");
        });
    }

    let summary = counter.join()?;
    eprintln!(
        "{} values in {} ms ({:?})",
        summary.emitted, summary.elapsed_ms, summary.outcome
    );
    Ok(())
}
