//! # Dataset Module
//!
//! The on-disk dataset layout: one image directory and one parallel label
//! directory per split.
//!
//! ```text
//! <root>/images/{train,val,test}/<stem>.<ext>
//! <root>/labels/{train,val,test}/<stem>.txt
//! ```
//!
//! An image and a label belong together iff they share a stem within the
//! same split. Labels without an image (and images without a label) are
//! left out of label-driven steps; that is not an error.

mod filter;
mod walker;

pub use filter::ExtensionFilter;
pub use walker::DatasetLayout;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A dataset split
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    Train,
    Val,
    Test,
}

impl Split {
    /// All splits in canonical order
    pub const ALL: [Split; 3] = [Split::Train, Split::Val, Split::Test];

    /// Splits that must never contain augmented images
    pub const EVALUATION: [Split; 2] = [Split::Val, Split::Test];

    /// Directory name of the split
    pub fn as_str(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Val => "val",
            Split::Test => "test",
        }
    }
}

impl std::fmt::Display for Split {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An image file in one split.
///
/// Identity is `(split, relative_path)`; the derived ordering sorts by
/// split first, then path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ImageRecord {
    pub split: Split,
    /// Path relative to the dataset root, `/`-separated
    pub relative_path: String,
    /// Absolute (or root-joined) path used for reading
    #[serde(skip)]
    pub path: PathBuf,
}

impl ImageRecord {
    pub fn new(split: Split, relative_path: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            split,
            relative_path: relative_path.into(),
            path: path.into(),
        }
    }

    /// Lower-cased file name, as used for prefix checks
    pub fn file_name_lower(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default()
    }
}

/// An image paired with its label file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledSample {
    pub image: PathBuf,
    pub label: PathBuf,
    pub stem: String,
}

impl LabeledSample {
    pub fn image_file_name(&self) -> String {
        self.image
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_order_train_val_test() {
        let mut splits = vec![Split::Test, Split::Train, Split::Val];
        splits.sort();
        assert_eq!(splits, Split::ALL.to_vec());
    }

    #[test]
    fn split_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Split::Val).unwrap(), "\"val\"");
    }

    #[test]
    fn records_order_by_split_then_path() {
        let a = ImageRecord::new(Split::Val, "images/val/a.jpg", "/r/images/val/a.jpg");
        let b = ImageRecord::new(Split::Train, "images/train/z.jpg", "/r/images/train/z.jpg");
        assert!(b < a);
    }

    #[test]
    fn file_name_is_lowercased() {
        let record = ImageRecord::new(Split::Val, "images/val/AUG1_7.JPG", "/r/images/val/AUG1_7.JPG");
        assert_eq!(record.file_name_lower(), "aug1_7.jpg");
    }
}
