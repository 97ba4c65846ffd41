//! Hosting glue shared by the proxy binaries

pub mod logging;
pub mod options;
mod processor;

pub use processor::HttpProcessor;

use tracing::{error, info};

/// Resolves once the process is asked to shut down via Ctrl-C
pub async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown requested"),
        Err(e) => error!(error = %e, "Unable to listen for the shutdown signal"),
    }
}
