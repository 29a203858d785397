//! Facet counts over the hits a client actually receives.

use knowledge_search_domain::{
    Aggregations, CONTENT_TYPE_KEY, FRAMEWORK_KEY, FacetCounts, HIERARCHY_LEVEL_KEY, PROJECT_KEY,
    ScoredHit, UNKNOWN_FACET,
};

/// Count `hits` per content type, framework, project, and hierarchy level.
///
/// Missing values count as `unknown`, except for frameworks where they are
/// left out.
#[must_use]
pub fn aggregate(hits: &[ScoredHit]) -> Aggregations {
    let mut aggregations = Aggregations::default();
    for hit in hits {
        bump(&mut aggregations.content_types, hit.facet(CONTENT_TYPE_KEY));
        bump(&mut aggregations.projects, hit.facet(PROJECT_KEY));
        bump(&mut aggregations.hierarchy_levels, hit.facet(HIERARCHY_LEVEL_KEY));

        let framework = hit.facet(FRAMEWORK_KEY);
        if &*framework != UNKNOWN_FACET {
            bump(&mut aggregations.frameworks, framework);
        }
    }
    aggregations
}

fn bump(counts: &mut FacetCounts, value: Box<str>) {
    *counts.entry(value).or_insert(0) += 1;
}
