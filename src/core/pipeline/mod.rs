//! # Pipeline Module
//!
//! Orchestrates the full audit.
//!
//! ## Steps
//! 1. **Lists** - labeled images and stems per split
//! 2. **Leakage** - augmented file names in val/test
//! 3. **Exact duplicates** (3A) - content digests shared across splits
//! 4. **Near duplicates** (3B) - close average-hash signatures across splits
//! 5. **Split distribution** - images per class per split
//! 6. **Staged counts** - training class counts as augmentations are added
//! 7. **Label sanity** - class ids outside the configured range
//!
//! ## Parallelism
//! Uses rayon for per-file hashing. Results are collected in full before
//! grouping or bucketing, and every report is sorted, so the output does not
//! depend on completion order.

mod executor;

pub use executor::{AuditBuilder, AuditReport, Auditor, CancellationToken, SplitListing};
