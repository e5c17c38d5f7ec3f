//! Text and CSV renderings of audit results.
//!
//! Every function writes to any `Write`, so the formats can be tested
//! against in-memory buffers.

use crate::core::comparator::{DuplicatePair, ExactDuplicateGroup};
use crate::core::distribution::DistributionRow;
use crate::core::labels::InvalidClassId;
use crate::core::leakage::LeakageReport;
use std::borrow::Cow;
use std::io::Write;

pub const NO_EXACT_DUPLICATES: &str = "No cross-split exact duplicates found.";
pub const NO_NEAR_DUPLICATES: &str =
    "No cross-split near-duplicates (aHash) under current threshold.";
pub const DISTRIBUTION_HEADER: &str = "split,class,images_containing_class";

/// One entry per line. An empty list is a single empty line.
pub fn export_lines<W, I, S>(lines: I, mut writer: W) -> std::io::Result<()>
where
    W: Write,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let joined: Vec<String> = lines.into_iter().map(|l| l.as_ref().to_string()).collect();
    writeln!(writer, "{}", joined.join("\n"))
}

/// Offender count per evaluation split, with at most `max_examples` names
pub fn export_leakage<W: Write>(
    report: &LeakageReport,
    max_examples: usize,
    mut writer: W,
) -> std::io::Result<()> {
    for split in &report.splits {
        writeln!(
            writer,
            "{}: augmented_prefix_count={}",
            split.split,
            split.offenders.len()
        )?;
        if !split.offenders.is_empty() {
            let examples: Vec<&str> = split
                .offenders
                .iter()
                .take(max_examples)
                .map(String::as_str)
                .collect();
            writeln!(writer, "  examples: {}", examples.join(", "))?;
        }
    }
    Ok(())
}

/// Tab-separated `digest split path` lines, groups separated by a blank line
pub fn export_exact_groups<W: Write>(
    groups: &[ExactDuplicateGroup],
    mut writer: W,
) -> std::io::Result<()> {
    if groups.is_empty() {
        return writeln!(writer, "{}", NO_EXACT_DUPLICATES);
    }

    writeln!(writer, "# sha1\tsplit\trel_image_path")?;
    for group in groups {
        for member in &group.members {
            writeln!(
                writer,
                "{}\t{}\t{}",
                group.digest, member.split, member.relative_path
            )?;
        }
        writeln!(writer)?;
    }
    Ok(())
}

/// Tab-separated pair lines, in the order given
pub fn export_near_pairs<W: Write>(pairs: &[DuplicatePair], mut writer: W) -> std::io::Result<()> {
    if pairs.is_empty() {
        return writeln!(writer, "{}", NO_NEAR_DUPLICATES);
    }

    writeln!(writer, "# split1\trel_image_1\tsplit2\trel_image_2\tHamming")?;
    for pair in pairs {
        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{}",
            pair.first.split,
            pair.first.relative_path,
            pair.second.split,
            pair.second.relative_path,
            pair.distance
        )?;
    }
    Ok(())
}

/// CSV with a `split,class,images_containing_class` header
pub fn export_distribution_csv<W: Write>(
    rows: &[DistributionRow],
    mut writer: W,
) -> std::io::Result<()> {
    writeln!(writer, "{}", DISTRIBUTION_HEADER)?;
    for row in rows {
        writeln!(
            writer,
            "{},{},{}",
            row.split,
            csv_field(&row.class),
            row.images_containing_class
        )?;
    }
    Ok(())
}

/// `path : line N -> text` per finding, or a PASS line
pub fn export_invalid_class_ids<W: Write>(
    findings: &[InvalidClassId],
    num_classes: usize,
    mut writer: W,
) -> std::io::Result<()> {
    if findings.is_empty() {
        return writeln!(
            writer,
            "PASS: all labels in [0,{}].",
            num_classes as i64 - 1
        );
    }

    for finding in findings {
        writeln!(
            writer,
            "{} : line {} -> {}",
            finding.label_path, finding.line_number, finding.line
        )?;
    }
    Ok(())
}

/// Quote a CSV field when it contains a separator, quote or line break
fn csv_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::comparator::SignatureEntry;
    use crate::core::dataset::{ImageRecord, Split};
    use crate::core::hasher::{ContentHasher, PerceptualSignature, SignatureSource};
    use crate::core::leakage::SplitLeakage;

    fn render(f: impl FnOnce(&mut Vec<u8>) -> std::io::Result<()>) -> String {
        let mut buffer = Vec::new();
        f(&mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    fn record(split: Split, name: &str) -> ImageRecord {
        let relative = format!("images/{}/{}", split, name);
        ImageRecord::new(split, relative.clone(), relative)
    }

    #[test]
    fn empty_list_is_one_newline() {
        let output = render(|w| export_lines(Vec::<String>::new(), w));
        assert_eq!(output, "\n");

        let output = render(|w| export_lines(["a", "b"], w));
        assert_eq!(output, "a\nb\n");
    }

    #[test]
    fn leakage_lists_examples_only_for_offending_splits() {
        let report = LeakageReport {
            splits: vec![
                SplitLeakage {
                    split: Split::Val,
                    offenders: vec!["aug1_1.jpg".into(), "aug1_2.jpg".into(), "aug1_3.jpg".into()],
                },
                SplitLeakage {
                    split: Split::Test,
                    offenders: Vec::new(),
                },
            ],
        };

        let output = render(|w| export_leakage(&report, 2, w));
        assert_eq!(
            output,
            "val: augmented_prefix_count=3\n  examples: aug1_1.jpg, aug1_2.jpg\ntest: augmented_prefix_count=0\n"
        );
    }

    #[test]
    fn exact_groups_are_blank_line_separated() {
        let digest = ContentHasher::digest_bytes(b"abc");
        let groups = vec![ExactDuplicateGroup {
            digest,
            members: vec![record(Split::Train, "a.jpg"), record(Split::Val, "b.jpg")],
        }];

        let output = render(|w| export_exact_groups(&groups, w));
        let expected = format!(
            "# sha1\tsplit\trel_image_path\n{d}\ttrain\timages/train/a.jpg\n{d}\tval\timages/val/b.jpg\n\n",
            d = "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
        assert_eq!(output, expected);
    }

    #[test]
    fn no_groups_writes_notice() {
        let output = render(|w| export_exact_groups(&[], w));
        assert_eq!(output, format!("{}\n", NO_EXACT_DUPLICATES));
    }

    #[test]
    fn near_pairs_are_tab_separated() {
        let entry = |split, name| SignatureEntry {
            record: record(split, name),
            signature: PerceptualSignature::from_u64(0),
            source: SignatureSource::Decoded,
        };
        let pair = DuplicatePair::new(&entry(Split::Test, "t.jpg"), &entry(Split::Train, "a.jpg"), 3);

        let output = render(|w| export_near_pairs(&[pair], w));
        assert_eq!(
            output,
            "# split1\trel_image_1\tsplit2\trel_image_2\tHamming\ntrain\timages/train/a.jpg\ttest\timages/test/t.jpg\t3\n"
        );

        let output = render(|w| export_near_pairs(&[], w));
        assert_eq!(output, format!("{}\n", NO_NEAR_DUPLICATES));
    }

    #[test]
    fn distribution_csv_quotes_awkward_names() {
        let rows = vec![
            DistributionRow {
                split: Split::Train,
                class: "Healthy".into(),
                images_containing_class: 4,
            },
            DistributionRow {
                split: Split::Val,
                class: "Rust, common".into(),
                images_containing_class: 0,
            },
        ];

        let output = render(|w| export_distribution_csv(&rows, w));
        assert_eq!(
            output,
            "split,class,images_containing_class\ntrain,Healthy,4\nval,\"Rust, common\",0\n"
        );
    }

    #[test]
    fn invalid_ids_pass_and_findings() {
        let output = render(|w| export_invalid_class_ids(&[], 7, w));
        assert_eq!(output, "PASS: all labels in [0,6].\n");

        let findings = vec![InvalidClassId {
            label_path: "labels/train/0001.txt".into(),
            line_number: 2,
            line: "9 0.5 0.5 0.1 0.1".into(),
            class_id: 9,
        }];
        let output = render(|w| export_invalid_class_ids(&findings, 7, w));
        assert_eq!(output, "labels/train/0001.txt : line 2 -> 9 0.5 0.5 0.1 0.1\n");
    }
}
