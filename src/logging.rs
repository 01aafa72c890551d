use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Map a user-facing level name onto an `EnvFilter` directive.
///
/// Accepts the usual spellings (`warning`, `WARN`, `Info`...); anything else is
/// passed through so full directives like `curriculum_tracker=debug` work.
pub fn level_directive(log_level: &str) -> String {
    match log_level.to_ascii_lowercase().as_str() {
        "warning" | "warn" => "warn".to_string(),
        "critical" | "error" => "error".to_string(),
        "debug" => "debug".to_string(),
        "trace" => "trace".to_string(),
        "info" => "info".to_string(),
        _ => log_level.to_string(),
    }
}

/// Initialise the global `tracing` subscriber, writing to stderr.
///
/// `RUST_LOG` wins over `log_level` when set; an unparsable level falls back
/// to `info`.
pub fn setup_logging(log_level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level_directive(log_level)))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()?;
    Ok(())
}
