//! # Config Module
//!
//! The audit configuration, built once at startup and passed by reference
//! into every step. Nothing in the library reads ambient global state.
//!
//! ## Sources (lowest to highest precedence)
//! 1. Built-in defaults
//! 2. Optional TOML file
//! 3. Command-line flags (applied by the CLI)
//!
//! ## Example
//! ```toml
//! class_names = ["Healthy", "Blight"]
//! hamming_threshold = 4
//! augmentation_prefixes = ["aug1_", "mosaic_"]
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default class list, in class-id order
pub const DEFAULT_CLASS_NAMES: [&str; 7] = [
    "Healthy",
    "Common_Rust",
    "Blight",
    "Gray_Leaf_Spot",
    "Corn_borer",
    "Army_worm",
    "Aphids",
];

/// Default image extensions, in lookup order
pub const DEFAULT_IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "bmp", "tif", "tiff"];

/// Default augmentation prefixes; each one is a construction stage
pub const DEFAULT_AUGMENTATION_PREFIXES: [&str; 2] = ["aug1_", "mosaic_"];

/// Immutable audit configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Dataset root; every other path is relative to it
    pub dataset_root: PathBuf,
    /// Image directory (contains one subdirectory per split)
    pub images_dir: PathBuf,
    /// Label directory (contains one subdirectory per split)
    pub labels_dir: PathBuf,
    /// Where text reports and file lists are written
    pub lists_dir: PathBuf,
    /// Class names indexed by class id
    pub class_names: Vec<String>,
    /// Accepted image extensions without the dot, tried in order
    pub image_extensions: Vec<String>,
    /// Filename prefixes marking augmented images, in stage order
    pub augmentation_prefixes: Vec<String>,
    /// Side of the grayscale thumbnail (side² bits per signature)
    pub thumbnail_side: u32,
    /// High-order signature bits used as the bucket key
    pub bucket_prefix_bits: u32,
    /// Maximum Hamming distance for a near-duplicate pair
    pub hamming_threshold: u32,
    /// Read size for content hashing
    pub read_chunk_bytes: usize,
    /// Offender names listed per split in the leakage report
    pub leakage_examples: usize,
    /// Hash files on the rayon thread pool
    pub parallel: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            dataset_root: PathBuf::from("."),
            images_dir: PathBuf::from("images"),
            labels_dir: PathBuf::from("labels"),
            lists_dir: PathBuf::from("lists"),
            class_names: DEFAULT_CLASS_NAMES.iter().map(|s| s.to_string()).collect(),
            image_extensions: DEFAULT_IMAGE_EXTENSIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            augmentation_prefixes: DEFAULT_AUGMENTATION_PREFIXES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            thumbnail_side: 8,
            bucket_prefix_bits: 16,
            hamming_threshold: 5,
            read_chunk_bytes: 1 << 20,
            leakage_examples: 20,
            parallel: true,
        }
    }
}

impl AuditConfig {
    /// Defaults rooted at `dataset_root`
    pub fn new(dataset_root: impl Into<PathBuf>) -> Self {
        Self {
            dataset_root: dataset_root.into(),
            ..Self::default()
        }
    }

    /// Load a TOML config file. Missing keys keep their defaults.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|e| ConfigError::ParseFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Set the class list
    pub fn class_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.class_names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Set the near-duplicate threshold
    pub fn hamming_threshold(mut self, threshold: u32) -> Self {
        self.hamming_threshold = threshold;
        self
    }

    /// Set the bucket prefix width
    pub fn bucket_prefix_bits(mut self, bits: u32) -> Self {
        self.bucket_prefix_bits = bits;
        self
    }

    /// Enable or disable parallel hashing
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Check value ranges. Called once after all sources are merged.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=8).contains(&self.thumbnail_side) {
            return Err(ConfigError::InvalidThumbnailSide {
                value: self.thumbnail_side,
            });
        }
        let max = self.signature_bits();
        if self.bucket_prefix_bits == 0 || self.bucket_prefix_bits > max {
            return Err(ConfigError::InvalidBucketBits {
                value: self.bucket_prefix_bits,
                max,
            });
        }
        if self.class_names.is_empty() {
            return Err(ConfigError::NoClasses);
        }
        Ok(())
    }

    pub fn num_classes(&self) -> usize {
        self.class_names.len()
    }

    /// Width of a perceptual signature in bits
    pub fn signature_bits(&self) -> u32 {
        self.thumbnail_side * self.thumbnail_side
    }

    pub fn images_root(&self) -> PathBuf {
        self.dataset_root.join(&self.images_dir)
    }

    pub fn labels_root(&self) -> PathBuf {
        self.dataset_root.join(&self.labels_dir)
    }

    pub fn lists_root(&self) -> PathBuf {
        self.dataset_root.join(&self.lists_dir)
    }

    /// Path relative to the dataset root, `/`-separated
    pub fn relative_path(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.dataset_root).unwrap_or(path);
        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// The augmentation prefix a file name starts with, compared case-insensitively
    pub fn augmentation_prefix_of(&self, file_name: &str) -> Option<&str> {
        let lower = file_name.to_lowercase();
        self.augmentation_prefixes
            .iter()
            .find(|prefix| lower.starts_with(prefix.to_lowercase().as_str()))
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_match_reference_dataset() {
        let config = AuditConfig::default();
        assert_eq!(config.num_classes(), 7);
        assert_eq!(config.thumbnail_side, 8);
        assert_eq!(config.signature_bits(), 64);
        assert_eq!(config.bucket_prefix_bits, 16);
        assert_eq!(config.hamming_threshold, 5);
        assert_eq!(config.read_chunk_bytes, 1 << 20);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn thumbnail_side_too_large_is_rejected() {
        let config = AuditConfig {
            thumbnail_side: 9,
            ..AuditConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidThumbnailSide { value: 9 })
        ));
    }

    #[test]
    fn bucket_bits_cannot_exceed_signature() {
        let config = AuditConfig {
            thumbnail_side: 4,
            bucket_prefix_bits: 17,
            ..AuditConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidBucketBits { value: 17, max: 16 })
        ));
    }

    #[test]
    fn empty_class_list_is_rejected() {
        let config = AuditConfig::default().class_names(Vec::<String>::new());
        assert!(matches!(config.validate(), Err(ConfigError::NoClasses)));
    }

    #[test]
    fn toml_overrides_only_given_keys() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "class_names = [\"cat\", \"dog\"]").unwrap();
        writeln!(file, "hamming_threshold = 3").unwrap();

        let config = AuditConfig::from_toml_file(file.path()).unwrap();

        assert_eq!(config.class_names, vec!["cat", "dog"]);
        assert_eq!(config.hamming_threshold, 3);
        assert_eq!(config.bucket_prefix_bits, 16);
    }

    #[test]
    fn malformed_toml_reports_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "hamming_threshold = \"five\"").unwrap();

        let error = AuditConfig::from_toml_file(file.path()).unwrap_err();
        assert!(matches!(error, ConfigError::ParseFailed { .. }));
    }

    #[test]
    fn relative_path_uses_forward_slashes() {
        let config = AuditConfig::new("/data/corn");
        let path = Path::new("/data/corn/images/train/0001.jpg");
        assert_eq!(config.relative_path(path), "images/train/0001.jpg");
    }

    #[test]
    fn augmentation_prefix_is_case_insensitive() {
        let config = AuditConfig::default();
        assert_eq!(config.augmentation_prefix_of("AUG1_0007.jpg"), Some("aug1_"));
        assert_eq!(config.augmentation_prefix_of("mosaic_12.png"), Some("mosaic_"));
        assert_eq!(config.augmentation_prefix_of("0007.jpg"), None);
    }
}
