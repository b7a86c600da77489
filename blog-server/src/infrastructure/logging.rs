use tracing_subscriber::EnvFilter;

/// `RUST_LOG` wins when set; the default keeps sqlx quiet and this crate
/// verbose.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,blog_server=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}
