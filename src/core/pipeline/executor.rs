//! Audit execution implementation.

use crate::config::AuditConfig;
use crate::core::comparator::{
    find_exact_duplicates, find_near_duplicates, DuplicatePair, ExactDuplicateGroup,
    ComparisonStrategy, PrefixIndexStats, SignatureEntry, ThresholdStrategy,
};
use crate::core::dataset::{DatasetLayout, ImageRecord, Split};
use crate::core::distribution::{self, DistributionRow, StageCounts};
use crate::core::hasher::{
    AverageHasher, ContentHasher, PerceptualSignature, SignatureSource,
};
use crate::core::labels::{self, InvalidClassId};
use crate::core::leakage::{self, LeakageReport};
use crate::core::reporter::ReportWriter;
use crate::error::{AuditError, HashError, Result};
use crate::events::{
    null_sender, AuditEvent, AuditStep, Event, EventSender, HashEvent, HashKind, HashProgress,
};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Shared flag for requesting early termination.
///
/// Checked between files and between steps. Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Images listed for one split in step 1
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SplitListing {
    pub split: Split,
    pub images: usize,
}

/// Everything an audit found
#[derive(Debug, Clone, Serialize)]
pub struct AuditReport {
    pub dataset_root: PathBuf,
    pub lists: Vec<SplitListing>,
    pub leakage: LeakageReport,
    pub exact_duplicates: Vec<ExactDuplicateGroup>,
    pub near_duplicates: Vec<DuplicatePair>,
    pub index_stats: PrefixIndexStats,
    /// Images whose signature came from the content digest
    pub fallback_signatures: usize,
    pub split_distribution: Vec<DistributionRow>,
    pub staged_counts: Vec<StageCounts>,
    pub invalid_class_ids: Vec<InvalidClassId>,
    /// Every report file written, in step order
    pub reports: Vec<PathBuf>,
    /// Non-fatal per-file errors
    pub errors: Vec<String>,
    pub duration_ms: u64,
}

impl AuditReport {
    /// No leakage, no cross-split duplicates, no invalid class ids
    pub fn passed(&self) -> bool {
        self.leakage.passed()
            && self.exact_duplicates.is_empty()
            && self.near_duplicates.is_empty()
            && self.invalid_class_ids.is_empty()
    }
}

/// Builder for an [`Auditor`]
pub struct AuditBuilder {
    config: AuditConfig,
    cancel: Option<CancellationToken>,
}

impl AuditBuilder {
    pub fn new(config: AuditConfig) -> Self {
        Self {
            config,
            cancel: None,
        }
    }

    /// Share a cancellation token with the caller
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Validate the configuration and build the auditor
    pub fn build(self) -> Result<Auditor> {
        self.config.validate()?;
        Ok(Auditor {
            config: self.config,
            cancel: self.cancel.unwrap_or_default(),
        })
    }
}

/// Outcome of hashing one file
enum FileOutcome<T> {
    Hashed(ImageRecord, T),
    Skipped(String),
    Cancelled,
}

/// Runs the audit steps in order
pub struct Auditor {
    config: AuditConfig,
    cancel: CancellationToken,
}

impl Auditor {
    pub fn builder(config: AuditConfig) -> AuditBuilder {
        AuditBuilder::new(config)
    }

    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    /// A token that cancels this auditor
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run the audit without events
    pub fn run(&self) -> Result<AuditReport> {
        self.run_with_events(&null_sender())
    }

    /// Run the audit with event reporting
    pub fn run_with_events(&self, events: &EventSender) -> Result<AuditReport> {
        let start_time = Instant::now();
        let config = &self.config;
        let layout = DatasetLayout::new(config);
        let writer = ReportWriter::new(config);
        let mut reports = Vec::new();
        let mut errors = Vec::new();

        layout.check_root()?;
        info!(root = %config.dataset_root.display(), "== Evidence & Leakcheck ==");
        events.send(Event::Audit(AuditEvent::Started {
            dataset_root: config.dataset_root.clone(),
        }));

        // [1] lists & stems
        self.begin(AuditStep::Lists, events)?;
        let mut lists = Vec::new();
        for split in Split::ALL {
            let samples = layout.labeled_samples(split)?;
            let images: Vec<String> = samples
                .iter()
                .map(|s| config.relative_path(&s.image))
                .collect();
            let stems: Vec<String> = samples.iter().map(|s| s.stem.clone()).collect();

            let (images_path, stems_path) = writer.write_split_lists(split, &images, &stems)?;
            info!(split = %split, images = images.len(), "split listed");
            reports.push(images_path);
            reports.push(stems_path);
            lists.push(SplitListing {
                split,
                images: images.len(),
            });
        }
        let listed = lists.iter().map(|l| l.images).sum();
        self.finish(AuditStep::Lists, listed, writer.lists_dir(), events);

        // [2] leakage scan
        self.begin(AuditStep::Leakage, events)?;
        let leakage = leakage::scan_leakage(&layout, config)?;
        let path = writer.write_leakage(&leakage, config.leakage_examples)?;
        info!(
            report = %path.display(),
            offenders = leakage.total_offenders(),
            "{}",
            if leakage.passed() { "PASS" } else { "ALERT" }
        );
        self.finish(AuditStep::Leakage, leakage.total_offenders(), &path, events);
        reports.push(path);

        // [3A] exact duplicates
        self.begin(AuditStep::ExactDuplicates, events)?;
        let records = layout.all_image_records()?;
        let content = ContentHasher::new(config.read_chunk_bytes);
        let digests = self.hash_files(HashKind::Content, &records, events, &mut errors, |record| {
            content.digest_file(&record.path)
        })?;
        let exact_duplicates = find_exact_duplicates(digests);
        let path = writer.write_exact_duplicates(&exact_duplicates)?;
        info!(report = %path.display(), groups = exact_duplicates.len(), "exact duplicates written");
        self.finish(AuditStep::ExactDuplicates, exact_duplicates.len(), &path, events);
        reports.push(path);

        // [3B] near duplicates
        self.begin(AuditStep::NearDuplicates, events)?;
        let hasher = AverageHasher::new(config.thumbnail_side);
        let signatures =
            self.hash_files(HashKind::Perceptual, &records, events, &mut errors, |record| {
                let (signature, source) = hasher.signature_file(&record.path)?;
                if source == SignatureSource::Fallback {
                    events.send(Event::Hash(HashEvent::Fallback {
                        path: record.path.clone(),
                    }));
                }
                Ok::<(PerceptualSignature, SignatureSource), HashError>((signature, source))
            })?;

        let entries: Vec<SignatureEntry> = signatures
            .into_iter()
            .map(|(record, (signature, source))| SignatureEntry {
                record,
                signature,
                source,
            })
            .collect();
        let fallback_signatures = entries
            .iter()
            .filter(|e| e.source == SignatureSource::Fallback)
            .count();
        if fallback_signatures > 0 {
            warn!(
                count = fallback_signatures,
                "undecodable images matched by content-digest fallback; their pairs are low confidence"
            );
        }

        let strategy = ThresholdStrategy::new(config.hamming_threshold);
        let (near_duplicates, index_stats) =
            find_near_duplicates(entries, config.bucket_prefix_bits, &strategy);
        let path = writer.write_near_duplicates(&near_duplicates)?;
        info!(
            report = %path.display(),
            pairs = near_duplicates.len(),
            rule = %strategy.description(),
            index = %index_stats,
            "near duplicates written"
        );
        self.finish(AuditStep::NearDuplicates, near_duplicates.len(), &path, events);
        reports.push(path);

        // [4] split distribution
        self.begin(AuditStep::SplitDistribution, events)?;
        let split_distribution = distribution::split_distribution(&layout, config)?;
        let path = writer.write_split_distribution(&split_distribution)?;
        info!(report = %path.display(), "split distribution written");
        self.finish(AuditStep::SplitDistribution, split_distribution.len(), &path, events);
        reports.push(path);

        // [5] staged counts
        self.begin(AuditStep::StagedCounts, events)?;
        let staged_counts = distribution::staged_counts(&layout, config)?;
        let paths = writer.write_staged_counts(&staged_counts)?;
        for path in &paths {
            info!(report = %path.display(), "staged counts written");
        }
        let report_dir = config.dataset_root.clone();
        self.finish(AuditStep::StagedCounts, staged_counts.len(), &report_dir, events);
        reports.extend(paths);

        // [6] label id sanity
        self.begin(AuditStep::LabelSanity, events)?;
        let invalid_class_ids = self.invalid_class_ids(&layout, &mut errors)?;
        let path = writer.write_invalid_class_ids(&invalid_class_ids, config.num_classes())?;
        info!(
            report = %path.display(),
            findings = invalid_class_ids.len(),
            "{}",
            if invalid_class_ids.is_empty() { "PASS" } else { "ALERT" }
        );
        self.finish(AuditStep::LabelSanity, invalid_class_ids.len(), &path, events);
        reports.push(path);

        let duration_ms = start_time.elapsed().as_millis() as u64;
        events.send(Event::Audit(AuditEvent::Completed { duration_ms }));
        info!(duration_ms, errors = errors.len(), "audit finished");

        Ok(AuditReport {
            dataset_root: config.dataset_root.clone(),
            lists,
            leakage,
            exact_duplicates,
            near_duplicates,
            index_stats,
            fallback_signatures,
            split_distribution,
            staged_counts,
            invalid_class_ids,
            reports,
            errors,
            duration_ms,
        })
    }

    fn check_cancelled(&self, events: &EventSender) -> Result<()> {
        if self.cancel.is_cancelled() {
            warn!("audit cancelled");
            events.send(Event::Audit(AuditEvent::Cancelled));
            return Err(AuditError::Cancelled);
        }
        Ok(())
    }

    fn begin(&self, step: AuditStep, events: &EventSender) -> Result<()> {
        self.check_cancelled(events)?;
        info!("{}", step);
        events.send(Event::Audit(AuditEvent::StepStarted { step }));
        Ok(())
    }

    fn finish(&self, step: AuditStep, findings: usize, report: &Path, events: &EventSender) {
        events.send(Event::Audit(AuditEvent::StepCompleted {
            step,
            findings,
            report: report.to_path_buf(),
        }));
    }

    /// Hash every record, in parallel when configured.
    ///
    /// Files that fail are logged, reported as events and recorded in
    /// `errors`; the rest come back in input order.
    fn hash_files<T, F>(
        &self,
        kind: HashKind,
        records: &[ImageRecord],
        events: &EventSender,
        errors: &mut Vec<String>,
        hash: F,
    ) -> Result<Vec<(ImageRecord, T)>>
    where
        T: Send,
        F: Fn(&ImageRecord) -> std::result::Result<T, HashError> + Sync,
    {
        let total = records.len();
        let completed = AtomicUsize::new(0);

        events.send(Event::Hash(HashEvent::Started {
            kind,
            total_files: total,
        }));

        let process = |record: &ImageRecord| {
            if self.cancel.is_cancelled() {
                return FileOutcome::Cancelled;
            }

            let outcome = match hash(record) {
                Ok(value) => FileOutcome::Hashed(record.clone(), value),
                Err(e) => {
                    warn!(path = %record.path.display(), error = %e, "skipping file");
                    events.send(Event::Hash(HashEvent::Skipped {
                        path: record.path.clone(),
                        message: e.to_string(),
                    }));
                    FileOutcome::Skipped(e.to_string())
                }
            };

            let current_completed = completed.fetch_add(1, Ordering::SeqCst) + 1;
            events.send(Event::Hash(HashEvent::Progress(HashProgress {
                kind,
                completed: current_completed,
                total,
                current_path: record.path.clone(),
            })));

            outcome
        };

        let outcomes: Vec<FileOutcome<T>> = if self.config.parallel {
            records.par_iter().map(process).collect()
        } else {
            records.iter().map(process).collect()
        };

        let mut hashed = Vec::with_capacity(outcomes.len());
        let mut skipped = 0;
        for outcome in outcomes {
            match outcome {
                FileOutcome::Hashed(record, value) => hashed.push((record, value)),
                FileOutcome::Skipped(message) => {
                    skipped += 1;
                    errors.push(message);
                }
                FileOutcome::Cancelled => {}
            }
        }

        self.check_cancelled(events)?;

        events.send(Event::Hash(HashEvent::Completed {
            kind,
            hashed: hashed.len(),
            skipped,
        }));

        Ok(hashed)
    }

    /// Out-of-range class ids over every label file of every split
    fn invalid_class_ids(
        &self,
        layout: &DatasetLayout<'_>,
        errors: &mut Vec<String>,
    ) -> Result<Vec<InvalidClassId>> {
        let mut findings = Vec::new();

        for split in Split::ALL {
            for label in layout.label_files(split)? {
                let relative = self.config.relative_path(&label);
                match labels::invalid_class_ids(&label, &relative, self.config.num_classes()) {
                    Ok(found) => findings.extend(found),
                    Err(e) => {
                        warn!(error = %e, "skipping unreadable label file");
                        errors.push(e.to_string());
                    }
                }
            }
        }

        Ok(findings)
    }
}
