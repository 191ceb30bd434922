use tracing::metadata::LevelFilter;

pub const ENV_LOG: &str = "MARIAN_LOG";

/// Installs a compact stderr subscriber. Later calls are no-ops, so library
/// callers and the binary can both invoke it.
pub fn setup_logging() {
    let filter = std::env::var(ENV_LOG)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(LevelFilter::INFO);

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
