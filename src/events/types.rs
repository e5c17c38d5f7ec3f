//! Event type definitions for progress reporting.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All events emitted while auditing a dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Step-level events
    Audit(AuditEvent),
    /// Per-file hashing events
    Hash(HashEvent),
}

/// The audit steps, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuditStep {
    Lists,
    Leakage,
    ExactDuplicates,
    NearDuplicates,
    SplitDistribution,
    StagedCounts,
    LabelSanity,
}

impl AuditStep {
    pub const ALL: [AuditStep; 7] = [
        AuditStep::Lists,
        AuditStep::Leakage,
        AuditStep::ExactDuplicates,
        AuditStep::NearDuplicates,
        AuditStep::SplitDistribution,
        AuditStep::StagedCounts,
        AuditStep::LabelSanity,
    ];

    /// Short label used in console output ("1", "2", "3A", ...)
    pub fn label(&self) -> &'static str {
        match self {
            AuditStep::Lists => "1",
            AuditStep::Leakage => "2",
            AuditStep::ExactDuplicates => "3A",
            AuditStep::NearDuplicates => "3B",
            AuditStep::SplitDistribution => "4",
            AuditStep::StagedCounts => "5",
            AuditStep::LabelSanity => "6",
        }
    }
}

impl std::fmt::Display for AuditStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AuditStep::Lists => "lists & stems",
            AuditStep::Leakage => "leakage scan",
            AuditStep::ExactDuplicates => "exact duplicates",
            AuditStep::NearDuplicates => "near duplicates",
            AuditStep::SplitDistribution => "split distribution",
            AuditStep::StagedCounts => "staged counts",
            AuditStep::LabelSanity => "label id sanity",
        };
        write!(f, "[{}] {}", self.label(), name)
    }
}

/// Step-level events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AuditEvent {
    /// The audit has started
    Started { dataset_root: PathBuf },
    /// A step is starting
    StepStarted { step: AuditStep },
    /// A step finished and wrote its report
    StepCompleted {
        step: AuditStep,
        /// Number of findings (offenders, groups, pairs, invalid ids)
        findings: usize,
        report: PathBuf,
    },
    /// Every step finished
    Completed { duration_ms: u64 },
    /// Early termination was requested
    Cancelled,
}

/// Which hash a hashing event belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HashKind {
    Content,
    Perceptual,
}

/// Events during per-file hashing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum HashEvent {
    /// Hashing has started
    Started { kind: HashKind, total_files: usize },
    /// A file was hashed
    Progress(HashProgress),
    /// The image could not be decoded; its signature came from the content digest
    Fallback { path: PathBuf },
    /// The file could not be read and was left out
    Skipped { path: PathBuf, message: String },
    /// Hashing completed
    Completed {
        kind: HashKind,
        hashed: usize,
        skipped: usize,
    },
}

/// Progress information during hashing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HashProgress {
    pub kind: HashKind,
    /// Files processed so far
    pub completed: usize,
    /// Files to process
    pub total: usize,
    /// The file that was just processed
    pub current_path: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_labels_follow_report_numbering() {
        let labels: Vec<_> = AuditStep::ALL.iter().map(|s| s.label()).collect();
        assert_eq!(labels, vec!["1", "2", "3A", "3B", "4", "5", "6"]);
    }

    #[test]
    fn step_display_includes_label() {
        assert_eq!(
            AuditStep::NearDuplicates.to_string(),
            "[3B] near duplicates"
        );
    }

    #[test]
    fn events_are_serializable() {
        let event = Event::Audit(AuditEvent::StepCompleted {
            step: AuditStep::ExactDuplicates,
            findings: 2,
            report: PathBuf::from("lists/dup_report_sha1.txt"),
        });

        let json = serde_json::to_string(&event).unwrap();
        let restored: Event = serde_json::from_str(&json).unwrap();

        match restored {
            Event::Audit(AuditEvent::StepCompleted { step, findings, .. }) => {
                assert_eq!(step, AuditStep::ExactDuplicates);
                assert_eq!(findings, 2);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }
}
