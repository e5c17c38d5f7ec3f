//! Split directory listing using walkdir.

use super::{filter::ExtensionFilter, ImageRecord, LabeledSample, Split};
use crate::config::AuditConfig;
use crate::error::DatasetError;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Read-only view of the dataset directories described by an [`AuditConfig`]
pub struct DatasetLayout<'a> {
    config: &'a AuditConfig,
    images: ExtensionFilter,
    labels: ExtensionFilter,
}

impl<'a> DatasetLayout<'a> {
    pub fn new(config: &'a AuditConfig) -> Self {
        Self {
            config,
            images: ExtensionFilter::new(&config.image_extensions),
            labels: ExtensionFilter::labels(),
        }
    }

    /// Fail early when the dataset root does not exist
    pub fn check_root(&self) -> Result<(), DatasetError> {
        if self.config.dataset_root.is_dir() {
            Ok(())
        } else {
            Err(DatasetError::RootNotFound {
                path: self.config.dataset_root.clone(),
            })
        }
    }

    pub fn image_dir(&self, split: Split) -> PathBuf {
        self.config.images_root().join(split.as_str())
    }

    pub fn label_dir(&self, split: Split) -> PathBuf {
        self.config.labels_root().join(split.as_str())
    }

    /// Image files of a split, sorted by file name
    pub fn image_files(&self, split: Split) -> Result<Vec<PathBuf>, DatasetError> {
        list_directory(&self.image_dir(split), &self.images)
    }

    /// Label files of a split, sorted by file name
    pub fn label_files(&self, split: Split) -> Result<Vec<PathBuf>, DatasetError> {
        list_directory(&self.label_dir(split), &self.labels)
    }

    /// Image records of a split, sorted by path
    pub fn image_records(&self, split: Split) -> Result<Vec<ImageRecord>, DatasetError> {
        Ok(self
            .image_files(split)?
            .into_iter()
            .map(|path| ImageRecord::new(split, self.config.relative_path(&path), path))
            .collect())
    }

    /// Image records of every split, train first
    pub fn all_image_records(&self) -> Result<Vec<ImageRecord>, DatasetError> {
        let mut records = Vec::new();
        for split in Split::ALL {
            records.extend(self.image_records(split)?);
        }
        Ok(records)
    }

    /// The image sharing `stem`, trying extensions in configured order
    pub fn find_image_for_stem(&self, split: Split, stem: &str) -> Option<PathBuf> {
        let dir = self.image_dir(split);
        self.config
            .image_extensions
            .iter()
            .map(|ext| dir.join(format!("{}.{}", stem, ext.trim_start_matches('.'))))
            .find(|candidate| candidate.is_file())
    }

    /// Label files of a split that have a matching image, in label order
    pub fn labeled_samples(&self, split: Split) -> Result<Vec<LabeledSample>, DatasetError> {
        let mut samples = Vec::new();

        for label in self.label_files(split)? {
            let Some(stem) = label.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
                continue;
            };

            match self.find_image_for_stem(split, &stem) {
                Some(image) => samples.push(LabeledSample { image, label, stem }),
                None => debug!(split = %split, stem = %stem, "label has no matching image"),
            }
        }

        Ok(samples)
    }
}

/// Files directly inside `dir` accepted by `filter`.
///
/// A missing directory is an empty split. Unreadable entries are logged and
/// skipped; only an unreadable `dir` itself is an error.
fn list_directory(dir: &Path, filter: &ExtensionFilter) -> Result<Vec<PathBuf>, DatasetError> {
    if !dir.is_dir() {
        debug!(path = %dir.display(), "split directory missing, treating as empty");
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name();

    for entry in walker {
        match entry {
            Ok(entry) => {
                if entry.file_type().is_file() && filter.should_include(entry.path()) {
                    files.push(entry.into_path());
                }
            }
            Err(e) if e.depth() == 0 => {
                return Err(DatasetError::ReadDirectory {
                    path: dir.to_path_buf(),
                    source: e.into(),
                });
            }
            Err(e) => {
                let path = e.path().map(Path::to_path_buf).unwrap_or_default();
                warn!(path = %path.display(), error = %e, "skipping unreadable entry");
            }
        }
    }

    Ok(files)
}
