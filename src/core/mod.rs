//! # Core Module
//!
//! The audit engine, independent of any front end.
//!
//! ## Modules
//! - `dataset` - Split layout and file listing
//! - `labels` - Annotation parsing and class-id checks
//! - `hasher` - Content digests and average-hash signatures
//! - `comparator` - Cross-split exact and near-duplicate detection
//! - `leakage` - Augmented images in evaluation splits
//! - `distribution` - Per-class image counts
//! - `reporter` - Report files
//! - `pipeline` - Runs the steps in order

pub mod comparator;
pub mod dataset;
pub mod distribution;
pub mod hasher;
pub mod labels;
pub mod leakage;
pub mod pipeline;
pub mod reporter;

// Re-export commonly used types
pub use comparator::{DuplicatePair, ExactDuplicateGroup};
pub use dataset::{ImageRecord, Split};
pub use hasher::{ContentDigest, PerceptualSignature};
pub use pipeline::{AuditReport, Auditor, CancellationToken};
