//! Process lifecycle helpers.
//!
//! Hosts own their runtime; the core only provides logging setup so every
//! embedding gets the same compact output.

/// Initialize logging with tracing_subscriber.
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("reqwest=warn".parse().unwrap())
                .add_directive("seoscope=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .compact()
        .with_target(false)
        .with_ansi(true)
        .init();
}
