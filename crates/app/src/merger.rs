//! Cross-collection merge: global ranking and truncation.

use crate::fanout::{CollectionOutcome, CollectionResult};
use knowledge_search_domain::{CollectionId, ScoredHit};

/// Ranked hits after merging every collection's results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedHits {
    /// Top hits, best first, at most `limit`.
    pub hits: Vec<ScoredHit>,
    /// Hits returned by all collections before truncation.
    pub total_found: u64,
    /// Collections that answered, in routing order.
    pub collections_searched: Vec<CollectionId>,
}

/// Merge per-collection results into one ranking.
///
/// The sort is stable, so equal scores keep collection order. Failed and
/// skipped collections contribute nothing and are not listed as searched.
#[must_use]
pub fn merge_results(results: Vec<CollectionResult>, limit: u32) -> MergedHits {
    let mut hits = Vec::new();
    let mut collections_searched = Vec::new();
    for result in results {
        if let CollectionOutcome::Succeeded(found) = result.outcome {
            hits.extend(found);
            collections_searched.push(result.collection);
        }
    }

    let total_found = u64::try_from(hits.len()).unwrap_or(u64::MAX);
    hits.sort_by(|left, right| right.score.total_cmp(&left.score));
    hits.truncate(usize::try_from(limit).unwrap_or(usize::MAX));

    MergedHits {
        hits,
        total_found,
        collections_searched,
    }
}
