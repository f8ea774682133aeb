//! Tracing setup for the binary.

use crate::config::Error;

/// Initializes tracing to stderr; if env `LOG_FILE` is set, also to that file (append, no ANSI).
///
/// `RUST_LOG` wins when set; otherwise `warn`, or `info,craftgraph=debug` when `verbose`.
pub fn init_tracing(verbose: bool) -> Result<(), Error> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::Layer;

    let default_filter = if verbose { "info,craftgraph=debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(filter.clone());

    let registry = tracing_subscriber::registry().with(stderr_layer);

    if let Ok(path) = std::env::var("LOG_FILE") {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?;
        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .with_filter(filter);
        registry.with(file_layer).try_init()?;
        tracing::info!(path = %path, "logging to file");
    } else {
        registry.try_init()?;
    }
    Ok(())
}
