//! Health, metrics, and embedding benchmark reports.

use crate::{CollectionInfo, CollectionStatsSummary};
use serde::Serialize;
use std::collections::BTreeMap;

/// Readiness of the embedding provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddingStatus {
    /// Model identifier.
    pub model: Box<str>,
    /// Output dimension.
    pub dimension: u32,
    /// Whether the provider answered a probe.
    pub ready: bool,
}

/// Non-secret configuration echoed by the health report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSummary {
    /// Embedding model identifier.
    pub embedding_model: Box<str>,
    /// Configured vector dimension.
    pub vector_dimension: u32,
    /// Vector store endpoint, credentials stripped.
    pub vector_store_url: Box<str>,
}

/// Aggregate of one timer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSummary {
    /// Recorded samples.
    pub count: u64,
    /// Sum of samples.
    pub total_ms: u64,
    /// Largest sample.
    pub max_ms: u64,
}

impl TimerSummary {
    /// Fold one sample in.
    pub const fn record(&mut self, duration_ms: u64) {
        self.count = self.count.saturating_add(1);
        self.total_ms = self.total_ms.saturating_add(duration_ms);
        if duration_ms > self.max_ms {
            self.max_ms = duration_ms;
        }
    }
}

/// Point-in-time copy of in-process metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    /// Counter totals by name.
    pub counters: BTreeMap<Box<str>, u64>,
    /// Timer aggregates by name.
    pub timers: BTreeMap<Box<str>, TimerSummary>,
}

/// Result of a health probe across the store and the embedding provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    /// Whether the vector store answered.
    pub vector_store_healthy: bool,
    /// Embedding provider readiness.
    pub embedding: EmbeddingStatus,
    /// Collections the store reported, empty when unreachable.
    pub collections: Vec<Box<str>>,
    /// Configuration summary.
    pub service: ServiceSummary,
    /// Collection totals, when the store answered.
    pub stats: Option<CollectionStatsSummary>,
    /// In-process metrics, when the telemetry sink keeps them.
    pub metrics: Option<MetricsSnapshot>,
}

impl HealthReport {
    /// Healthy only when both the store and the embedding provider are.
    #[must_use]
    pub const fn is_healthy(&self) -> bool {
        self.vector_store_healthy && self.embedding.ready
    }

    /// Per-collection statistics, when the store answered.
    #[must_use]
    pub fn collection_infos(&self) -> &[CollectionInfo] {
        self.stats
            .as_ref()
            .map_or(&[], |stats| stats.collections.as_slice())
    }
}

/// Embedding model identity reported by the benchmark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelSummary {
    /// Provider identifier.
    pub provider: Box<str>,
    /// Model identifier.
    pub model: Box<str>,
    /// Output dimension.
    pub dimension: u32,
}

/// Timing of one single-text embedding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleEncoding {
    /// Wall time in milliseconds.
    pub time_ms: f64,
    /// Returned dimension.
    pub dimension: u32,
}

/// Timing of one batch embedding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchEncoding {
    /// Wall time in seconds.
    pub total_time_s: f64,
    /// Throughput.
    pub texts_per_second: f64,
    /// Texts embedded.
    pub texts_count: u64,
    /// Returned dimension.
    pub dimension: u32,
}

impl BatchEncoding {
    /// Derive throughput from a count and an elapsed time.
    #[must_use]
    pub fn from_elapsed(texts_count: u64, total_time_s: f64, dimension: u32) -> Self {
        let count = f64::from(u32::try_from(texts_count).unwrap_or(u32::MAX));
        let texts_per_second = if total_time_s > 0.0 {
            count / total_time_s
        } else {
            0.0
        };
        Self {
            total_time_s,
            texts_per_second,
            texts_count,
            dimension,
        }
    }
}

/// Embedding throughput benchmark.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkReport {
    /// Model under test.
    pub model_info: ModelSummary,
    /// Single-text timing.
    pub single_encoding: SingleEncoding,
    /// Batch timing.
    pub batch_encoding: BatchEncoding,
}
