//! Collection creation parameters and reported statistics.

use crate::PrimitiveError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Vector distance used by a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// Cosine similarity.
    #[default]
    Cosine,
    /// Dot product.
    Dot,
    /// Euclidean distance.
    Euclid,
}

impl DistanceMetric {
    /// Lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cosine => "cosine",
            Self::Dot => "dot",
            Self::Euclid => "euclid",
        }
    }

    /// Parse a label, ignoring case.
    pub fn parse(input: impl AsRef<str>) -> Result<Self, PrimitiveError> {
        let raw = input.as_ref().trim();
        [Self::Cosine, Self::Dot, Self::Euclid]
            .into_iter()
            .find(|metric| raw.eq_ignore_ascii_case(metric.as_str()))
            .ok_or_else(|| PrimitiveError::UnknownDistance {
                input: raw.to_owned(),
            })
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// HNSW index parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexParams {
    /// Edges per node.
    pub m: u32,
    /// Candidate list size during construction.
    pub ef_construct: u32,
    /// Point count under which the store scans instead of using the index.
    pub full_scan_threshold: u64,
}

impl Default for IndexParams {
    fn default() -> Self {
        Self {
            m: 16,
            ef_construct: 100,
            full_scan_threshold: 10_000,
        }
    }
}

/// Everything needed to create a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSpec {
    /// Vector dimension.
    pub dimension: u32,
    /// Distance metric.
    pub distance: DistanceMetric,
    /// Index parameters.
    pub index: IndexParams,
}

/// Statistics reported by the store for one collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionInfo {
    /// Collection name as the store reports it.
    pub name: Box<str>,
    /// Store-specific status label (e.g. `green`).
    pub status: Box<str>,
    /// Stored points.
    pub points_count: u64,
    /// Indexed vectors.
    pub vectors_count: u64,
    /// Storage segments.
    pub segments_count: u64,
    /// Bytes on disk, when reported.
    pub disk_data_size: u64,
    /// Bytes in memory, when reported.
    pub ram_data_size: u64,
    /// Configured vector dimension, when reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vector_size: Option<u32>,
    /// Configured distance label, when reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<Box<str>>,
}

/// Totals across every collection the store knows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionStatsSummary {
    /// Number of collections.
    pub total_collections: u64,
    /// Sum of vector counts.
    pub total_vectors: u64,
    /// Sum of on-disk sizes.
    pub total_disk_size: u64,
    /// Sum of in-memory sizes.
    pub total_ram_size: u64,
    /// Per-collection statistics.
    pub collections: Vec<CollectionInfo>,
}

impl CollectionStatsSummary {
    /// Sum per-collection statistics.
    #[must_use]
    pub fn from_collections(collections: Vec<CollectionInfo>) -> Self {
        let mut summary = Self {
            total_collections: u64::try_from(collections.len()).unwrap_or(u64::MAX),
            ..Self::default()
        };
        for info in &collections {
            summary.total_vectors = summary.total_vectors.saturating_add(info.vectors_count);
            summary.total_disk_size = summary.total_disk_size.saturating_add(info.disk_data_size);
            summary.total_ram_size = summary.total_ram_size.saturating_add(info.ram_data_size);
        }
        summary.collections = collections;
        summary
    }
}
