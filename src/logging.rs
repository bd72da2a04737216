use std::fs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Console logging plus a daily-rolling JSON file under `logs/`. The returned
/// guard flushes the file writer when dropped; the caller holds it for the
/// life of the process.
pub fn init_logging() -> WorkerGuard {
    let _ = fs::create_dir_all("logs");

    let file_appender = tracing_appender::rolling::daily("logs", "tourqa.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    // RUST_LOG takes precedence when set
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("tourqa_scraper=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().with_writer(file_writer))
        // Console output goes to stderr so the progress bar and the summary
        // block keep stdout to themselves
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    guard
}
