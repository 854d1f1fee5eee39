use tracing_subscriber::EnvFilter;

/// Installs JSON-line logging for a Lambda binary.
///
/// Level comes from `RUST_LOG` (default `info`). Timestamps are omitted
/// because CloudWatch stamps every line on ingestion.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_target(false)
        .with_current_span(false)
        .without_time()
        .init();
}
