//! # Reporter Module
//!
//! Writes audit findings to disk.
//!
//! ## Files
//! - `lists/<split>.txt`, `lists/<split>_stems.txt` - labeled images per split
//! - `lists/leakage_check.txt` - augmented names found in val/test
//! - `lists/dup_report_sha1.txt` - cross-split exact duplicate groups
//! - `lists/dup_report_ahash.txt` - cross-split near-duplicate pairs
//! - `lists/invalid_cid_report.txt` - out-of-range class ids
//! - `split_distribution.csv`, `counts_after_step<k>.csv` - at the dataset root
//!
//! A report is written in one go from complete results, so an interrupted
//! audit never leaves a half-written file behind for a finished step.

mod export;

pub use export::{
    export_distribution_csv, export_exact_groups, export_invalid_class_ids, export_leakage,
    export_lines, export_near_pairs, DISTRIBUTION_HEADER, NO_EXACT_DUPLICATES,
    NO_NEAR_DUPLICATES,
};

use crate::config::AuditConfig;
use crate::core::comparator::{DuplicatePair, ExactDuplicateGroup};
use crate::core::dataset::Split;
use crate::core::distribution::{DistributionRow, StageCounts};
use crate::core::labels::InvalidClassId;
use crate::core::leakage::LeakageReport;
use crate::error::ReportError;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Writes report files under the dataset root
pub struct ReportWriter {
    root: PathBuf,
    lists: PathBuf,
}

impl ReportWriter {
    pub fn new(config: &AuditConfig) -> Self {
        Self {
            root: config.dataset_root.clone(),
            lists: config.lists_root(),
        }
    }

    pub fn lists_dir(&self) -> &Path {
        &self.lists
    }

    /// `lists/<split>.txt` and `lists/<split>_stems.txt`; returns both paths
    pub fn write_split_lists(
        &self,
        split: Split,
        images: &[String],
        stems: &[String],
    ) -> Result<(PathBuf, PathBuf), ReportError> {
        let images_path = self.lists.join(format!("{}.txt", split));
        let stems_path = self.lists.join(format!("{}_stems.txt", split));

        write_report(&images_path, |w| export_lines(images, w))?;
        write_report(&stems_path, |w| export_lines(stems, w))?;

        Ok((images_path, stems_path))
    }

    pub fn write_leakage(
        &self,
        report: &LeakageReport,
        max_examples: usize,
    ) -> Result<PathBuf, ReportError> {
        let path = self.lists.join("leakage_check.txt");
        write_report(&path, |w| export_leakage(report, max_examples, w))?;
        Ok(path)
    }

    pub fn write_exact_duplicates(
        &self,
        groups: &[ExactDuplicateGroup],
    ) -> Result<PathBuf, ReportError> {
        let path = self.lists.join("dup_report_sha1.txt");
        write_report(&path, |w| export_exact_groups(groups, w))?;
        Ok(path)
    }

    pub fn write_near_duplicates(&self, pairs: &[DuplicatePair]) -> Result<PathBuf, ReportError> {
        let path = self.lists.join("dup_report_ahash.txt");
        write_report(&path, |w| export_near_pairs(pairs, w))?;
        Ok(path)
    }

    pub fn write_split_distribution(
        &self,
        rows: &[DistributionRow],
    ) -> Result<PathBuf, ReportError> {
        let path = self.root.join("split_distribution.csv");
        write_report(&path, |w| export_distribution_csv(rows, w))?;
        Ok(path)
    }

    /// One `counts_after_step<k>.csv` per stage
    pub fn write_staged_counts(&self, stages: &[StageCounts]) -> Result<Vec<PathBuf>, ReportError> {
        let mut paths = Vec::with_capacity(stages.len());
        for stage in stages {
            let path = self.root.join(format!("counts_after_step{}.csv", stage.stage));
            write_report(&path, |w| export_distribution_csv(&stage.rows, w))?;
            paths.push(path);
        }
        Ok(paths)
    }

    pub fn write_invalid_class_ids(
        &self,
        findings: &[InvalidClassId],
        num_classes: usize,
    ) -> Result<PathBuf, ReportError> {
        let path = self.lists.join("invalid_cid_report.txt");
        write_report(&path, |w| export_invalid_class_ids(findings, num_classes, w))?;
        Ok(path)
    }
}

/// Create `path` (and its parent directory) and fill it with `render`
fn write_report<F>(path: &Path, render: F) -> Result<(), ReportError>
where
    F: FnOnce(&mut BufWriter<File>) -> std::io::Result<()>,
{
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| ReportError::CreateDirectory {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let write_failed = |source| ReportError::WriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(write_failed)?;
    let mut writer = BufWriter::new(file);
    render(&mut writer).map_err(write_failed)?;
    writer.flush().map_err(write_failed)?;

    debug!(path = %path.display(), "report written");
    Ok(())
}
