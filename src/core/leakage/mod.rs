//! # Leakage Module
//!
//! Augmented images are generated from training images, so any file in
//! val or test whose name starts with an augmentation prefix means training
//! content has leaked into an evaluation split.

use crate::config::AuditConfig;
use crate::core::dataset::{DatasetLayout, Split};
use crate::error::DatasetError;
use serde::Serialize;

/// Offending file names of one evaluation split
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SplitLeakage {
    pub split: Split,
    /// Lower-cased file names, in listing order
    pub offenders: Vec<String>,
}

/// Result of the leakage scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeakageReport {
    pub splits: Vec<SplitLeakage>,
}

impl LeakageReport {
    pub fn total_offenders(&self) -> usize {
        self.splits.iter().map(|s| s.offenders.len()).sum()
    }

    pub fn passed(&self) -> bool {
        self.total_offenders() == 0
    }
}

/// Scan val and test for augmented file names
pub fn scan_leakage(
    layout: &DatasetLayout<'_>,
    config: &AuditConfig,
) -> Result<LeakageReport, DatasetError> {
    let mut splits = Vec::new();

    for split in Split::EVALUATION {
        let offenders = layout
            .image_records(split)?
            .into_iter()
            .map(|record| record.file_name_lower())
            .filter(|name| config.augmentation_prefix_of(name).is_some())
            .collect();
        splits.push(SplitLeakage { split, offenders });
    }

    Ok(LeakageReport { splits })
}
