use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Log to stderr, `warn` and above unless `RUST_LOG` says otherwise.
pub fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .with(filter)
        .init();
}
