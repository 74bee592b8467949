use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "info";

/// Builds the level filter from `RUST_LOG`, falling back to `default`.
pub fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Install JSON logging on stdout.
///
/// `log` records (actix-web's request logger among them) are forwarded to
/// the same subscriber. A second call is a no-op, so tests may call this
/// freely.
pub fn init_telemetry() {
    let formatting_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(true)
        .json();

    let result = tracing_subscriber::registry()
        .with(env_filter(DEFAULT_FILTER))
        .with(formatting_layer)
        .try_init();

    if let Err(e) = result {
        tracing::debug!(error = %e, "Telemetry already initialised");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init_telemetry();
        init_telemetry();
        tracing::info!("still logging");
    }
}
