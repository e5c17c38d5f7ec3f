//! Exact-duplicate grouping by content digest.

use super::ExactDuplicateGroup;
use crate::core::dataset::ImageRecord;
use crate::core::hasher::ContentDigest;
use std::collections::BTreeMap;

/// Group records by digest and keep the groups that span two or more splits.
///
/// Groups come back in digest order; members in (split, path) order.
/// Byte-identical files inside a single split are not leakage and are
/// not reported.
pub fn find_exact_duplicates(
    entries: impl IntoIterator<Item = (ImageRecord, ContentDigest)>,
) -> Vec<ExactDuplicateGroup> {
    let mut by_digest: BTreeMap<ContentDigest, Vec<ImageRecord>> = BTreeMap::new();
    for (record, digest) in entries {
        by_digest.entry(digest).or_default().push(record);
    }

    by_digest
        .into_iter()
        .filter_map(|(digest, mut members)| {
            members.sort();
            let group = ExactDuplicateGroup { digest, members };
            (group.split_count() >= 2).then_some(group)
        })
        .collect()
}
