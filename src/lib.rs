pub mod administration; // Administration recorder: the finalize state machine
pub mod adr; // ADR acknowledgment tracker
pub mod assessment_gate; // Pre-administration clinical assessment gate
pub mod config;
pub mod db;
pub mod dosing; // Sliding-scale dose calculator
pub mod mar; // Read-only MAR summary view
pub mod models;
pub mod orders; // Medication order lifecycle
pub mod overdue; // Overdue-dose projection and poller
pub mod permissions; // Role → capability matrix

#[cfg(test)]
pub mod test_support;

use tracing_subscriber::EnvFilter;

/// Initialize tracing for the process. Call once at startup; the filter
/// comes from RUST_LOG when set.
pub fn init_telemetry() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);
}
