//! # Error Module
//!
//! Error types for the dataset audit.
//!
//! ## Design Principles
//! - **Never panic** on dataset files - return errors instead
//! - **Include context** - paths, line numbers, what went wrong
//! - **Per-file failures are not fatal** - `HashError` and `LabelError` are
//!   caught per file and recorded; they never abort the audit

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Dataset error: {0}")]
    Dataset(#[from] DatasetError),

    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Audit was cancelled")]
    Cancelled,
}

/// Errors that occur while listing the dataset layout
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Dataset root not found: {path}")]
    RootNotFound { path: PathBuf },

    #[error("Failed to read directory {path}: {source}")]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that occur while hashing a file
#[derive(Error, Debug)]
pub enum HashError {
    #[error("Failed to read file {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode image {path}: {reason}")]
    DecodeError { path: PathBuf, reason: String },

    #[error("Failed to resize image: {0}")]
    ResizeFailed(String),
}

/// Errors that occur while reading annotation files
#[derive(Error, Debug)]
pub enum LabelError {
    #[error("Failed to read label file {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that occur while writing reports
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to create report directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write report {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors in the audit configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Thumbnail side must be between 1 and 8, got {value}")]
    InvalidThumbnailSide { value: u32 },

    #[error("Bucket prefix must be between 1 and {max} bits, got {value}")]
    InvalidBucketBits { value: u32, max: u32 },

    #[error("At least one class name is required")]
    NoClasses,

    #[error("Failed to read config file {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {reason}")]
    ParseFailed { path: PathBuf, reason: String },
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, AuditError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dataset_error_includes_path() {
        let error = DatasetError::RootNotFound {
            path: PathBuf::from("/datasets/corn"),
        };
        assert!(error.to_string().contains("/datasets/corn"));
    }

    #[test]
    fn hash_error_includes_path_and_reason() {
        let error = HashError::DecodeError {
            path: PathBuf::from("/datasets/corn/images/train/broken.jpg"),
            reason: "invalid JPEG".to_string(),
        };
        let message = error.to_string();
        assert!(message.contains("broken.jpg"));
        assert!(message.contains("invalid JPEG"));
    }

    #[test]
    fn config_error_names_the_limit() {
        let error = ConfigError::InvalidBucketBits { value: 70, max: 64 };
        let message = error.to_string();
        assert!(message.contains("70"));
        assert!(message.contains("64"));
    }

    #[test]
    fn nested_errors_convert_into_audit_error() {
        let error: AuditError = ConfigError::NoClasses.into();
        assert!(matches!(error, AuditError::Config(ConfigError::NoClasses)));
    }
}
