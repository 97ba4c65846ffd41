use crate::options::LogOptions;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Installs the global fmt subscriber, a second call only logs a warning
pub fn init(options: &LogOptions) {
    let filter = EnvFilter::try_new(&options.log).unwrap_or_else(|e| {
        eprintln!("Invalid log filter '{}' ({e}), defaulting to info", options.log);
        EnvFilter::new("info")
    });

    match tracing_subscriber::fmt().with_env_filter(filter).try_init() {
        Ok(()) => info!(filter = %options.log, "Logging initialized"),
        Err(e) => warn!(error = %e, "Logging was already initialized"),
    }
}
