//! # Labels Module
//!
//! Parses annotation files: one axis-aligned box per line,
//! `class_id center_x center_y width height`, center and size normalized
//! to the image dimensions.
//!
//! A line is well-formed iff it has exactly five whitespace-separated
//! fields that all parse as numbers. Anything else is skipped without
//! failing the file.

use crate::error::LabelError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

/// One annotated box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxAnnotation {
    pub class_id: i64,
    pub center_x: f64,
    pub center_y: f64,
    pub width: f64,
    pub height: f64,
}

/// Parse one annotation line. `None` means the line is malformed.
///
/// The class field may be written as a float (`"2.0"`); it is truncated
/// toward zero. A non-finite class field makes the line malformed.
pub fn parse_line(line: &str) -> Option<BoxAnnotation> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != 5 {
        return None;
    }

    let class = fields[0].parse::<f64>().ok().filter(|c| c.is_finite())?;
    let center_x = fields[1].parse().ok()?;
    let center_y = fields[2].parse().ok()?;
    let width = fields[3].parse().ok()?;
    let height = fields[4].parse().ok()?;

    Some(BoxAnnotation {
        class_id: class.trunc() as i64,
        center_x,
        center_y,
        width,
        height,
    })
}

/// Read a label file as text. Invalid UTF-8 is replaced, not rejected.
fn read_label_text(path: &Path) -> Result<String, LabelError> {
    let bytes = fs::read(path).map_err(|source| LabelError::ReadFailed {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Well-formed boxes of a label file
pub fn read_boxes(path: &Path) -> Result<Vec<BoxAnnotation>, LabelError> {
    let text = read_label_text(path)?;
    Ok(text.lines().filter_map(parse_line).collect())
}

/// Distinct class ids present in a label file
pub fn image_classes(path: &Path) -> Result<BTreeSet<i64>, LabelError> {
    Ok(read_boxes(path)?.into_iter().map(|b| b.class_id).collect())
}

/// A well-formed line whose class id is outside `[0, num_classes)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidClassId {
    /// Label path relative to the dataset root
    pub label_path: String,
    /// 1-based line number
    pub line_number: usize,
    /// The trimmed line text
    pub line: String,
    pub class_id: i64,
}

/// Out-of-range class ids in one label file
pub fn invalid_class_ids(
    path: &Path,
    relative_path: &str,
    num_classes: usize,
) -> Result<Vec<InvalidClassId>, LabelError> {
    let text = read_label_text(path)?;
    let num_classes = num_classes as i64;

    Ok(text
        .lines()
        .enumerate()
        .filter_map(|(index, line)| {
            let annotation = parse_line(line)?;
            if (0..num_classes).contains(&annotation.class_id) {
                return None;
            }
            Some(InvalidClassId {
                label_path: relative_path.to_string(),
                line_number: index + 1,
                line: line.trim().to_string(),
                class_id: annotation.class_id,
            })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn parses_well_formed_line() {
        let parsed = parse_line("3 0.5 0.25 0.1 0.2").unwrap();
        assert_eq!(parsed.class_id, 3);
        assert_eq!(parsed.center_x, 0.5);
        assert_eq!(parsed.height, 0.2);
    }

    #[test]
    fn float_class_id_is_truncated() {
        assert_eq!(parse_line("2.0 0.5 0.5 0.1 0.1").unwrap().class_id, 2);
        assert_eq!(parse_line("-0.5 0.5 0.5 0.1 0.1").unwrap().class_id, 0);
        assert_eq!(parse_line("-1 0.5 0.5 0.1 0.1").unwrap().class_id, -1);
    }

    #[test]
    fn wrong_field_count_is_skipped() {
        assert!(parse_line("1 0.5 0.5 0.1").is_none());
        assert!(parse_line("1 0.5 0.5 0.1 0.1 0.9").is_none());
        assert!(parse_line("").is_none());
    }

    #[test]
    fn non_numeric_field_is_skipped() {
        assert!(parse_line("cat 0.5 0.5 0.1 0.1").is_none());
        assert!(parse_line("1 0.5 x 0.1 0.1").is_none());
        assert!(parse_line("nan 0.5 0.5 0.1 0.1").is_none());
    }

    #[test]
    fn image_classes_are_distinct() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("0001.txt");
        fs::write(
            &path,
            "1 0.1 0.1 0.1 0.1\n1 0.2 0.2 0.1 0.1\r\nbroken line\n4 0.3 0.3 0.1 0.1\n",
        )
        .unwrap();

        let classes = image_classes(&path).unwrap();
        assert_eq!(classes.into_iter().collect::<Vec<_>>(), vec![1, 4]);
    }

    #[test]
    fn missing_label_file_is_an_error() {
        let result = read_boxes(Path::new("/nonexistent/labels/0001.txt"));
        assert!(matches!(result, Err(LabelError::ReadFailed { .. })));
    }

    #[test]
    fn out_of_range_ids_are_reported_with_line_numbers() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("0002.txt");
        fs::write(
            &path,
            "0 0.1 0.1 0.1 0.1\n7 0.2 0.2 0.1 0.1\nbad\n  -1 0.3 0.3 0.1 0.1  \n6 0.4 0.4 0.1 0.1\n",
        )
        .unwrap();

        let findings = invalid_class_ids(&path, "labels/train/0002.txt", 7).unwrap();

        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].line_number, 2);
        assert_eq!(findings[0].class_id, 7);
        assert_eq!(findings[1].line_number, 4);
        assert_eq!(findings[1].line, "-1 0.3 0.3 0.1 0.1");
        assert_eq!(findings[1].label_path, "labels/train/0002.txt");
    }
}
