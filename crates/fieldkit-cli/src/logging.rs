use tracing_subscriber::EnvFilter;

/// Installs the global subscriber on stderr so stdout stays clean for
/// exported CSV. `RUST_LOG` wins over `--debug` and `FIELDKIT_LOG_LEVEL`.
pub fn init_logging(debug: bool) -> bool {
    let level = if debug {
        "debug".to_string()
    } else if let Ok(level) = std::env::var("FIELDKIT_LOG_LEVEL") {
        level
    } else {
        "info".to_string()
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).is_ok()
}
