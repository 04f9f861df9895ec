use std::fs;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Sets up tracing with a compact console layer and a JSON file layer.
/// The file layer rotates daily under `logs/`; console verbosity follows
/// `RUST_LOG` with an `info` default for this crate.
pub fn init_logging() {
    let _ = fs::create_dir_all("logs");

    let file_appender = tracing_appender::rolling::daily("logs", "refinery.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::from_default_env()
        .add_directive("cmhr_refinery=info".parse().expect("valid log directive"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().with_writer(file_writer))
        .with(fmt::layer().compact().with_writer(std::io::stdout))
        .init();

    // The guard must outlive the process so buffered log lines get flushed.
    std::mem::forget(guard);
}
