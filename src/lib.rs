//! # Dataset Evidence
//!
//! Audits a labeled image dataset split into train/val/test before training.
//!
//! ## What It Checks
//! - **Leakage** - augmented images that ended up in val or test
//! - **Exact duplicates** - byte-identical images in more than one split
//! - **Near duplicates** - visually close images in more than one split
//! - **Label sanity** - class ids outside the configured class list
//!
//! It also writes per-split file lists and per-class image counts.
//! Nothing in the dataset is modified; every finding is a report.
//!
//! ## Architecture
//! - `config` - The immutable audit configuration
//! - `core` - The audit engine
//! - `events` - Event-driven progress reporting
//! - `error` - Error types

pub mod config;
pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use config::AuditConfig;
pub use error::{AuditError, Result};

/// Initialize tracing for the library.
///
/// Called once by the application entry point. `RUST_LOG` wins when set;
/// otherwise `verbose` selects `debug` over `warn`.
pub fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    // A subscriber installed earlier (e.g. by a test harness) stays in place
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
