use tracing_subscriber::{fmt, EnvFilter};

// Defaults to `info` when RUST_LOG is unset
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
