//! Embedding throughput benchmark over a fixed sample corpus.

use knowledge_search_domain::{BatchEncoding, BenchmarkReport, ModelSummary, SingleEncoding};
use knowledge_search_ports::{EmbedBatchRequest, EmbeddingPort};
use knowledge_search_shared::{ErrorClass, ErrorCode, ErrorEnvelope, RequestContext, Result};
use std::time::Instant;

/// Sentences the benchmark encodes.
pub const SAMPLE_TEXTS: [&str; 5] = [
    "This is a sample text for benchmarking.",
    "Another example with technical content like API endpoints.",
    "Programming principles and best practices for error handling.",
    "Requirements for user authentication and authorization.",
    "Framework documentation for Go HTTP handlers.",
];

/// How many times the sample sentences repeat in the batch.
pub const SAMPLE_REPEAT: usize = 20;

/// Time one single encoding and one batch encoding.
pub async fn run_embedding_benchmark(
    ctx: &RequestContext,
    embedding: &dyn EmbeddingPort,
) -> Result<BenchmarkReport> {
    ctx.ensure_not_cancelled("benchmark.start")?;
    let info = embedding.model_info();

    let started_at = Instant::now();
    let single = embedding.embed(ctx, SAMPLE_TEXTS[0].into()).await?;
    let single_ms = started_at.elapsed().as_secs_f64() * 1000.0;

    let texts: Vec<Box<str>> = SAMPLE_TEXTS
        .iter()
        .cycle()
        .take(SAMPLE_TEXTS.len() * SAMPLE_REPEAT)
        .map(|text| Box::from(*text))
        .collect();
    let expected = texts.len();

    let started_at = Instant::now();
    let batch = embedding
        .embed_batch(ctx, EmbedBatchRequest { texts })
        .await?;
    let batch_s = started_at.elapsed().as_secs_f64();

    if batch.len() != expected {
        return Err(ErrorEnvelope::unexpected(
            ErrorCode::embedding_failed(),
            "batch embedding returned an unexpected number of vectors",
            ErrorClass::NonRetriable,
        )
        .with_metadata("expected", expected.to_string())
        .with_metadata("actual", batch.len().to_string()));
    }
    let batch_dimension = batch.first().map_or(info.dimension, |vector| vector.dimension());

    Ok(BenchmarkReport {
        model_info: ModelSummary {
            provider: info.provider.clone(),
            model: info.model.clone(),
            dimension: info.dimension,
        },
        single_encoding: SingleEncoding {
            time_ms: single_ms,
            dimension: single.dimension(),
        },
        batch_encoding: BatchEncoding::from_elapsed(
            u64::try_from(expected).unwrap_or(u64::MAX),
            batch_s,
            batch_dimension,
        ),
    })
}
