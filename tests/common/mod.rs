use std::sync::Once;

static INIT: Once = Once::new();

/// One-time tracing setup for the integration suite. Honors RUST_LOG when
/// set; otherwise only this crate's warnings come through.
pub fn init_test_env() {
    INIT.call_once(|| {
        let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "rating_worker=warn".to_string());
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
            .try_init();
    });
}
