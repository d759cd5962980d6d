use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Install the global subscriber. Logs go to stderr so they stay out of the quiz screen.
pub fn init_tracing(log_level: &str) {
    let env_filter =
        EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .init();
}
