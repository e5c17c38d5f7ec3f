//! # Comparator Module
//!
//! Finds images shared between splits.
//!
//! - **Exact duplicates**: identical content digests, grouped; a group is
//!   reported only when its members span two or more splits
//! - **Near duplicates**: average-hash signatures within a Hamming
//!   threshold, paired; only pairs from two different splits are reported
//!
//! Near-duplicate candidates come from a [`PrefixIndex`], so only
//! signatures sharing their high-order bits are ever compared.

mod bucket;
mod exact;
mod traits;

pub use bucket::{PrefixIndex, PrefixIndexStats};
pub use exact::find_exact_duplicates;
pub use traits::{ComparisonStrategy, ThresholdStrategy};

use crate::core::dataset::{ImageRecord, Split};
use crate::core::hasher::{ContentDigest, PerceptualSignature, SignatureSource};
use serde::Serialize;
use std::collections::BTreeSet;

/// An image with its perceptual signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureEntry {
    pub record: ImageRecord,
    pub signature: PerceptualSignature,
    pub source: SignatureSource,
}

/// Images with byte-identical content in two or more splits
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExactDuplicateGroup {
    pub digest: ContentDigest,
    /// Sorted by (split, path)
    pub members: Vec<ImageRecord>,
}

impl ExactDuplicateGroup {
    pub fn splits(&self) -> BTreeSet<Split> {
        self.members.iter().map(|m| m.split).collect()
    }

    pub fn split_count(&self) -> usize {
        self.splits().len()
    }
}

/// Two images from different splits whose signatures are close.
///
/// `first` always belongs to the earlier split (train < val < test).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicatePair {
    pub first: ImageRecord,
    pub second: ImageRecord,
    pub distance: u32,
    /// At least one side used a content-digest fallback signature
    pub low_confidence: bool,
}

impl DuplicatePair {
    /// Pair two entries, orienting by split
    pub fn new(a: &SignatureEntry, b: &SignatureEntry, distance: u32) -> Self {
        let (first, second) = if a.record <= b.record { (a, b) } else { (b, a) };
        Self {
            first: first.record.clone(),
            second: second.record.clone(),
            distance,
            low_confidence: first.source == SignatureSource::Fallback
                || second.source == SignatureSource::Fallback,
        }
    }

    /// Splits compare by name here, so (train, test) precedes (train, val)
    fn sort_key(&self) -> (&'static str, &'static str, u32, &str, &str) {
        (
            self.first.split.as_str(),
            self.second.split.as_str(),
            self.distance,
            self.first.relative_path.as_str(),
            self.second.relative_path.as_str(),
        )
    }
}

/// Cross-split near-duplicate pairs among `entries`.
///
/// Sorted by (first split name, second split name, distance, first path,
/// second path); each unordered pair appears once.
pub fn find_near_duplicates(
    entries: Vec<SignatureEntry>,
    prefix_bits: u32,
    strategy: &dyn ComparisonStrategy,
) -> (Vec<DuplicatePair>, PrefixIndexStats) {
    let index = PrefixIndex::build(prefix_bits, entries);
    let mut pairs = index.find_cross_split_pairs(strategy);

    pairs.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    pairs.dedup_by(|a, b| a.first == b.first && a.second == b.second);

    (pairs, index.stats())
}
