//! # Prefix-Bucket Index
//!
//! Avoids comparing every signature against every other one.
//!
//! ## How It Works
//! 1. Bucket each signature by its top `prefix_bits` bits (16 by default)
//! 2. Inside a bucket with two or more entries, group entries by split
//! 3. For every pair of distinct splits in the bucket, compare each entry
//!    of one split with each entry of the other
//!
//! Same-split pairs are never compared, and each entry lives in exactly one
//! bucket, so no pair can be produced twice.
//!
//! ## Trade-off
//! Two signatures a few bits apart land in different buckets when one of
//! the differing bits falls inside the prefix. Those pairs are missed. This
//! is a heuristic candidate filter, not an exact nearest-neighbour search.

use super::traits::ComparisonStrategy;
use super::{DuplicatePair, SignatureEntry};
use crate::core::dataset::Split;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Bucket key: the high-order bits of a signature
type BucketKey = u64;

/// Signatures bucketed by prefix
pub struct PrefixIndex {
    prefix_bits: u32,
    buckets: HashMap<BucketKey, Vec<usize>>,
    entries: Vec<SignatureEntry>,
}

impl PrefixIndex {
    pub fn new(prefix_bits: u32) -> Self {
        Self {
            prefix_bits,
            buckets: HashMap::new(),
            entries: Vec::new(),
        }
    }

    /// Build an index over `entries`
    pub fn build(prefix_bits: u32, entries: Vec<SignatureEntry>) -> Self {
        let mut index = Self::new(prefix_bits);
        for entry in entries {
            index.add(entry);
        }
        index
    }

    pub fn add(&mut self, entry: SignatureEntry) {
        let key = entry.signature.prefix(self.prefix_bits);
        self.buckets.entry(key).or_default().push(self.entries.len());
        self.entries.push(entry);
    }

    /// Cross-split pairs accepted by `strategy`, unordered
    pub fn find_cross_split_pairs(&self, strategy: &dyn ComparisonStrategy) -> Vec<DuplicatePair> {
        let mut pairs = Vec::new();

        for bucket in self.buckets.values().filter(|b| b.len() > 1) {
            let by_split = self.group_by_split(bucket);
            let splits: Vec<&Vec<usize>> = by_split.values().collect();

            for (i, left) in splits.iter().enumerate() {
                for right in &splits[i + 1..] {
                    for &a in left.iter() {
                        for &b in right.iter() {
                            let (first, second) = (&self.entries[a], &self.entries[b]);
                            let distance = first.signature.distance(&second.signature);
                            if strategy.is_duplicate(distance) {
                                pairs.push(DuplicatePair::new(first, second, distance));
                            }
                        }
                    }
                }
            }
        }

        pairs
    }

    /// Bucket members grouped by split; the map keeps splits in canonical order
    fn group_by_split(&self, bucket: &[usize]) -> BTreeMap<Split, Vec<usize>> {
        let mut by_split: BTreeMap<Split, Vec<usize>> = BTreeMap::new();
        for &idx in bucket {
            by_split.entry(self.entries[idx].record.split).or_default().push(idx);
        }
        by_split
    }

    /// Bucket occupancy and comparison counts
    pub fn stats(&self) -> PrefixIndexStats {
        let comparisons = self
            .buckets
            .values()
            .map(|bucket| {
                let sizes: Vec<usize> = self.group_by_split(bucket).values().map(Vec::len).collect();
                let mut count = 0;
                for (i, a) in sizes.iter().enumerate() {
                    for b in &sizes[i + 1..] {
                        count += a * b;
                    }
                }
                count
            })
            .sum();

        let n = self.entries.len();
        PrefixIndexStats {
            total_entries: n,
            prefix_bits: self.prefix_bits,
            total_buckets: self.buckets.len(),
            max_bucket_size: self.buckets.values().map(Vec::len).max().unwrap_or(0),
            comparisons,
            naive_comparisons: n * n.saturating_sub(1) / 2,
        }
    }
}

/// Statistics about a [`PrefixIndex`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrefixIndexStats {
    pub total_entries: usize,
    pub prefix_bits: u32,
    pub total_buckets: usize,
    pub max_bucket_size: usize,
    /// Cross-split comparisons actually performed
    pub comparisons: usize,
    /// Comparisons an all-pairs scan would perform
    pub naive_comparisons: usize,
}

impl std::fmt::Display for PrefixIndexStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} signatures in {} buckets ({}-bit prefix, largest {}), {} comparisons instead of {}",
            self.total_entries,
            self.total_buckets,
            self.prefix_bits,
            self.max_bucket_size,
            self.comparisons,
            self.naive_comparisons
        )
    }
}
