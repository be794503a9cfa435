//! Document intake pipeline for school PE medical exemptions.
//!
//! Turns a photographed or imported certificate into a validated exemption
//! record: stability-sampled capture, image normalization, a retrying call
//! to a structured-extraction provider, and a deterministic reconciliation
//! policy that merges untrusted extracted fields into a draft the user can
//! trust and edit. List rendering, navigation and the capture UI itself are
//! external collaborators behind the traits in [`pipeline::capture`],
//! [`pipeline::extraction`] and [`store`].

pub mod config;
pub mod dates;
pub mod lifecycle;
pub mod models;
pub mod pipeline;
pub mod store;

use tracing_subscriber::EnvFilter;

/// Initialize tracing for binaries and integration harnesses.
///
/// `RUST_LOG` wins when set; otherwise falls back to the crate default.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("eps-inaptitudes starting v{}", config::APP_VERSION);
}
