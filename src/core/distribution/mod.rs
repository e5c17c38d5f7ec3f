//! # Distribution Module
//!
//! Per-class image-containment counts: how many images of a split contain
//! at least one box of each class. An image with three boxes of one class
//! counts once for that class.
//!
//! Staged counts replay how the training split was built. Training samples
//! are partitioned by augmentation prefix (no prefix = base), and stage `k`
//! is the base plus the first `k` prefix partitions.

use crate::config::AuditConfig;
use crate::core::dataset::{DatasetLayout, LabeledSample, Split};
use crate::core::labels;
use crate::error::DatasetError;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::warn;

/// One row of a distribution table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DistributionRow {
    pub split: Split,
    pub class: String,
    pub images_containing_class: usize,
}

/// One cumulative construction stage of the training split
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageCounts {
    /// 1-based stage number
    pub stage: usize,
    /// Prefixes whose images are included on top of the base images
    pub prefixes: Vec<String>,
    pub images: usize,
    pub rows: Vec<DistributionRow>,
}

/// Training samples split by augmentation prefix
#[derive(Debug, Clone, Default)]
pub struct PrefixPartition {
    pub base: Vec<LabeledSample>,
    /// One bucket per configured prefix, in configured order
    pub augmented: Vec<Vec<LabeledSample>>,
}

/// Count images per class id. Unreadable label files are logged and skipped.
pub fn per_class_image_counts(samples: &[LabeledSample]) -> BTreeMap<i64, usize> {
    let mut counts = BTreeMap::new();

    for sample in samples {
        match labels::image_classes(&sample.label) {
            Ok(classes) => {
                for class_id in classes {
                    *counts.entry(class_id).or_insert(0) += 1;
                }
            }
            Err(e) => warn!(error = %e, "skipping unreadable label file"),
        }
    }

    counts
}

/// One row per configured class, in class-id order. Ids outside the class
/// list are not shown here; the label sanity step reports them.
pub fn rows_for(split: Split, counts: &BTreeMap<i64, usize>, config: &AuditConfig) -> Vec<DistributionRow> {
    config
        .class_names
        .iter()
        .enumerate()
        .map(|(class_id, name)| DistributionRow {
            split,
            class: name.clone(),
            images_containing_class: counts.get(&(class_id as i64)).copied().unwrap_or(0),
        })
        .collect()
}

/// Class counts for every split
pub fn split_distribution(
    layout: &DatasetLayout<'_>,
    config: &AuditConfig,
) -> Result<Vec<DistributionRow>, DatasetError> {
    let mut rows = Vec::new();
    for split in Split::ALL {
        let samples = layout.labeled_samples(split)?;
        rows.extend(rows_for(split, &per_class_image_counts(&samples), config));
    }
    Ok(rows)
}

/// Partition samples by the first configured prefix their image name starts with
pub fn partition_by_prefix(samples: Vec<LabeledSample>, config: &AuditConfig) -> PrefixPartition {
    let mut partition = PrefixPartition {
        base: Vec::new(),
        augmented: vec![Vec::new(); config.augmentation_prefixes.len()],
    };

    for sample in samples {
        let name = sample.image_file_name();
        let position = config
            .augmentation_prefix_of(&name)
            .and_then(|prefix| config.augmentation_prefixes.iter().position(|p| p == prefix));

        match position {
            Some(index) => partition.augmented[index].push(sample),
            None => partition.base.push(sample),
        }
    }

    partition
}

/// Cumulative class counts of the training split, one entry per prefix
pub fn staged_counts(
    layout: &DatasetLayout<'_>,
    config: &AuditConfig,
) -> Result<Vec<StageCounts>, DatasetError> {
    let partition = partition_by_prefix(layout.labeled_samples(Split::Train)?, config);

    let mut included = partition.base;
    let mut stages = Vec::new();

    for (index, bucket) in partition.augmented.into_iter().enumerate() {
        included.extend(bucket);
        let counts = per_class_image_counts(&included);
        stages.push(StageCounts {
            stage: index + 1,
            prefixes: config.augmentation_prefixes[..=index].to_vec(),
            images: included.len(),
            rows: rows_for(Split::Train, &counts, config),
        });
    }

    Ok(stages)
}
