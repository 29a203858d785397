//! API v1 DTO mapping helpers.

use crate::v1::{
    ApiV1AggregationsDto, ApiV1BatchEncodingDto, ApiV1BenchmarkDto, ApiV1CollectionInfoDto,
    ApiV1CollectionStatsDto, ApiV1EmbeddingHealthDto, ApiV1EmbeddingStatus, ApiV1ErrorCode,
    ApiV1ErrorDto, ApiV1ErrorKind, ApiV1ErrorMeta, ApiV1HealthDto, ApiV1HealthStatus,
    ApiV1MetricsDto, ApiV1ModelInfoDto, ApiV1Result, ApiV1SearchDefaults, ApiV1SearchRequestDto,
    ApiV1SearchResponseDto, ApiV1SearchResultDto, ApiV1ServiceConfigDto, ApiV1SingleEncodingDto,
    ApiV1SystemInfoDto, ApiV1TimerDto,
};
use knowledge_search_domain::{
    BenchmarkReport, CollectionInfo, CollectionStatsSummary, ContentType, FacetCounts,
    HealthReport, HierarchyLevel, MetricsSnapshot, ScoredHit, SearchMode, SearchRequest,
    SearchRequestInput, SearchResponse, SearchScope,
};
use knowledge_search_shared::{ErrorCode, ErrorEnvelope, ErrorKind, Validate, is_secret_key};
use std::collections::BTreeMap;

const API_V1_REDACTED: &str = "[REDACTED]";
const API_V1_REDACTED_PREFIX: &str = "[REDACTED,len=";

/// Convert a shared `ErrorCode` into an API v1 error code string.
#[must_use]
pub fn error_code_to_api_v1(code: &ErrorCode) -> ApiV1ErrorCode {
    let namespace = sanitize_code_segment(code.namespace());
    let detail = sanitize_code_segment(code.code());
    format!("ERR_{namespace}_{detail}")
}

/// Map an `ErrorEnvelope` into an API v1 error DTO.
#[must_use]
pub fn error_envelope_to_api_v1_error(
    envelope: &ErrorEnvelope,
    extra_meta: Option<ApiV1ErrorMeta>,
) -> ApiV1ErrorDto {
    let mut merged = envelope.metadata.clone();
    if let Some(extra) = extra_meta {
        merged.extend(extra);
    }
    let meta = if merged.is_empty() {
        None
    } else {
        Some(redact_api_v1_meta(&merged))
    };

    ApiV1ErrorDto {
        code: error_code_to_api_v1(&envelope.code),
        message: envelope.message.clone(),
        kind: map_error_kind(envelope.kind),
        meta,
    }
}

/// Map a shared result into an API v1 result wrapper.
#[must_use]
pub fn result_to_api_v1_result<T>(
    result: Result<T, ErrorEnvelope>,
    extra_meta: Option<ApiV1ErrorMeta>,
) -> ApiV1Result<T> {
    match result {
        Ok(data) => ApiV1Result::ok(data),
        Err(error) => ApiV1Result::err(error_envelope_to_api_v1_error(&error, extra_meta)),
    }
}

/// Validate a search DTO and turn it into a domain request.
///
/// Unknown labels surface as `domain:*_unknown` errors carrying the
/// offending value in `input` metadata.
pub fn search_request_from_api_v1(
    dto: ApiV1SearchRequestDto,
    defaults: ApiV1SearchDefaults,
) -> Result<SearchRequest, ErrorEnvelope> {
    dto.validate()?;

    let content_types = dto
        .content_types
        .map(|labels| labels.iter().map(ContentType::parse).collect::<Result<Vec<_>, _>>())
        .transpose()?;
    let hierarchy_levels = dto
        .hierarchy_levels
        .map(|labels| {
            labels
                .iter()
                .map(HierarchyLevel::parse)
                .collect::<Result<Vec<_>, _>>()
        })
        .transpose()?;
    let scope = dto
        .scope
        .as_deref()
        .map(SearchScope::parse)
        .transpose()?
        .unwrap_or_default();
    let mode = dto
        .mode
        .as_deref()
        .map(SearchMode::parse)
        .transpose()?
        .unwrap_or_default();

    let input = SearchRequestInput {
        query: dto.query,
        projects: dto.projects,
        content_types,
        scope,
        mode,
        limit: dto.limit.unwrap_or_else(|| u64::from(defaults.limit)),
        score_threshold: dto.score_threshold.unwrap_or(defaults.score_threshold),
        include_content: dto.include_content.unwrap_or(true),
        framework: dto.framework,
        hierarchy_levels,
    };
    SearchRequest::parse(input).map_err(ErrorEnvelope::from)
}

/// Map a domain search response to its wire form.
#[must_use]
pub fn search_response_to_api_v1(response: SearchResponse) -> ApiV1SearchResponseDto {
    let aggregations = ApiV1AggregationsDto {
        content_types: facet_counts(response.aggregations.content_types),
        frameworks: facet_counts(response.aggregations.frameworks),
        projects: facet_counts(response.aggregations.projects),
        hierarchy_levels: facet_counts(response.aggregations.hierarchy_levels),
    };
    ApiV1SearchResponseDto {
        query: response.query.into_string(),
        results: response.hits.into_iter().map(hit_to_api_v1).collect(),
        total_found: response.total_found,
        processing_time_ms: response.processing_time_ms,
        search_strategy: response.search_strategy.into_string(),
        collections_searched: response
            .collections_searched
            .iter()
            .map(ToString::to_string)
            .collect(),
        aggregations,
    }
}

/// Map a health report to its wire form.
#[must_use]
pub fn health_report_to_api_v1(report: &HealthReport) -> ApiV1HealthDto {
    let status = if report.is_healthy() {
        ApiV1HealthStatus::Healthy
    } else {
        ApiV1HealthStatus::Unhealthy
    };
    let embedding_status = if report.embedding.ready {
        ApiV1EmbeddingStatus::Ready
    } else {
        ApiV1EmbeddingStatus::Unavailable
    };
    ApiV1HealthDto {
        status,
        vector_store_healthy: report.vector_store_healthy,
        embedding: ApiV1EmbeddingHealthDto {
            model: report.embedding.model.to_string(),
            dimension: report.embedding.dimension,
            status: embedding_status,
        },
        collections: report.collections.iter().map(ToString::to_string).collect(),
        system_info: ApiV1SystemInfoDto {
            config: ApiV1ServiceConfigDto {
                embedding_model: report.service.embedding_model.to_string(),
                vector_dimension: report.service.vector_dimension,
                vector_store_url: report.service.vector_store_url.to_string(),
            },
            stats: report.stats.as_ref().map(collection_stats_to_api_v1),
            metrics: report.metrics.as_ref().map(metrics_to_api_v1),
        },
    }
}

/// Map collection totals to their wire form.
#[must_use]
pub fn collection_stats_to_api_v1(summary: &CollectionStatsSummary) -> ApiV1CollectionStatsDto {
    ApiV1CollectionStatsDto {
        total_collections: summary.total_collections,
        total_vectors: summary.total_vectors,
        total_disk_size: summary.total_disk_size,
        total_ram_size: summary.total_ram_size,
        collections: summary.collections.iter().map(collection_info_to_api_v1).collect(),
    }
}

/// Map a benchmark report to its wire form.
#[must_use]
pub fn benchmark_report_to_api_v1(report: &BenchmarkReport) -> ApiV1BenchmarkDto {
    ApiV1BenchmarkDto {
        model_info: ApiV1ModelInfoDto {
            provider: report.model_info.provider.to_string(),
            model: report.model_info.model.to_string(),
            dimension: report.model_info.dimension,
        },
        single_encoding: ApiV1SingleEncodingDto {
            time_ms: report.single_encoding.time_ms,
            dimension: report.single_encoding.dimension,
        },
        batch_encoding: ApiV1BatchEncodingDto {
            total_time_s: report.batch_encoding.total_time_s,
            texts_per_second: report.batch_encoding.texts_per_second,
            texts_count: report.batch_encoding.texts_count,
            dimension: report.batch_encoding.dimension,
        },
    }
}

fn hit_to_api_v1(hit: ScoredHit) -> ApiV1SearchResultDto {
    ApiV1SearchResultDto {
        id: hit.id.into_string(),
        content: hit.content.map(str::into_string),
        metadata: hit.metadata,
        score: hit.score,
        collection: hit.collection.to_string(),
        highlights: None,
    }
}

fn collection_info_to_api_v1(info: &CollectionInfo) -> ApiV1CollectionInfoDto {
    ApiV1CollectionInfoDto {
        name: info.name.to_string(),
        status: info.status.to_string(),
        points_count: info.points_count,
        vectors_count: info.vectors_count,
        segments_count: info.segments_count,
        disk_data_size: info.disk_data_size,
        ram_data_size: info.ram_data_size,
        vector_size: info.vector_size,
        distance: info.distance.as_ref().map(ToString::to_string),
    }
}

fn metrics_to_api_v1(snapshot: &MetricsSnapshot) -> ApiV1MetricsDto {
    ApiV1MetricsDto {
        counters: snapshot
            .counters
            .iter()
            .map(|(name, value)| (name.to_string(), *value))
            .collect(),
        timers: snapshot
            .timers
            .iter()
            .map(|(name, timer)| {
                (
                    name.to_string(),
                    ApiV1TimerDto {
                        count: timer.count,
                        total_ms: timer.total_ms,
                        max_ms: timer.max_ms,
                    },
                )
            })
            .collect(),
    }
}

fn facet_counts(counts: FacetCounts) -> BTreeMap<String, u64> {
    counts
        .into_iter()
        .map(|(facet, count)| (facet.into_string(), count))
        .collect()
}

const fn map_error_kind(kind: ErrorKind) -> ApiV1ErrorKind {
    match kind {
        ErrorKind::Expected | ErrorKind::Unexpected => ApiV1ErrorKind::Expected,
        ErrorKind::Invariant => ApiV1ErrorKind::Invariant,
    }
}

fn sanitize_code_segment(segment: &str) -> String {
    segment
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() {
                ch.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

fn redact_api_v1_meta(meta: &ApiV1ErrorMeta) -> ApiV1ErrorMeta {
    meta.iter()
        .map(|(key, value)| {
            let redacted_value = if is_secret_key(key) {
                API_V1_REDACTED.to_string()
            } else if is_query_key(key) {
                format!("{API_V1_REDACTED_PREFIX}{}]", value.len())
            } else {
                value.clone()
            };
            (key.clone(), redacted_value)
        })
        .collect()
}

fn is_query_key(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    key == "query" || key.ends_with("query") || key == "content"
}

#[cfg(test)]
mod tests {
    use super::*;
    use knowledge_search_domain::{Aggregations, HitMetadata, TopologyRegistry};
    use knowledge_search_shared::ErrorClass;
    use serde_json::json;
    use std::error::Error;

    fn dto(query: &str) -> ApiV1SearchRequestDto {
        ApiV1SearchRequestDto {
            query: query.to_string(),
            ..ApiV1SearchRequestDto::default()
        }
    }

    #[test]
    fn mapping_redacts_sensitive_metadata() -> Result<(), Box<dyn Error>> {
        let envelope = ErrorEnvelope::expected(
            ErrorCode::new("domain", "content_type_unknown"),
            "unknown content type: docs",
        )
        .with_metadata("input", "docs")
        .with_metadata("token", "secret-token")
        .with_metadata("apiKey", "sk-123")
        .with_metadata("query", "hello world");

        let dto = error_envelope_to_api_v1_error(&envelope, None);
        let meta = dto
            .meta
            .ok_or_else(|| std::io::Error::other("meta should be present"))?;
        assert_eq!(dto.code, "ERR_DOMAIN_CONTENT_TYPE_UNKNOWN");
        assert_eq!(dto.kind, ApiV1ErrorKind::Expected);
        assert_eq!(meta.get("input").map(String::as_str), Some("docs"));
        assert_eq!(meta.get("token").map(String::as_str), Some("[REDACTED]"));
        assert_eq!(meta.get("apiKey").map(String::as_str), Some("[REDACTED]"));
        assert_eq!(
            meta.get("query").map(String::as_str),
            Some("[REDACTED,len=11]")
        );
        Ok(())
    }

    #[test]
    fn unexpected_errors_map_to_expected_kind() {
        let envelope = ErrorEnvelope::unexpected(
            ErrorCode::backend_unavailable(),
            "all collections failed",
            ErrorClass::Retriable,
        );
        let dto = error_envelope_to_api_v1_error(&envelope, None);
        assert_eq!(dto.kind, ApiV1ErrorKind::Expected);
        assert_eq!(dto.code, "ERR_SEARCH_BACKEND_UNAVAILABLE");
    }

    #[test]
    fn result_mapping_preserves_ok_and_err() {
        let ok_result: Result<u32, ErrorEnvelope> = Ok(10);
        let mapped = result_to_api_v1_result(ok_result, None);
        assert!(matches!(mapped, ApiV1Result::Ok { ok: true, .. }));

        let mut extra = BTreeMap::new();
        extra.insert("requestId".to_string(), "abc".to_string());
        let err_result: Result<u32, ErrorEnvelope> = Err(ErrorEnvelope::expected(
            ErrorCode::invalid_input(),
            "bad input",
        ));
        let mapped = result_to_api_v1_result(err_result, Some(extra));
        assert!(matches!(mapped, ApiV1Result::Err { ok: false, .. }));
    }

    #[test]
    fn request_mapping_applies_defaults() -> Result<(), ErrorEnvelope> {
        let defaults = ApiV1SearchDefaults {
            limit: 7,
            score_threshold: 0.4,
        };
        let request = search_request_from_api_v1(dto("http client"), defaults)?;
        assert_eq!(request.limit(), 7);
        assert!((request.score_threshold() - 0.4).abs() < f32::EPSILON);
        assert_eq!(request.scope(), SearchScope::All);
        assert_eq!(request.mode(), SearchMode::Hybrid);
        assert!(request.include_content());
        assert_eq!(request.content_types(), None);
        Ok(())
    }

    #[test]
    fn request_mapping_names_unknown_content_type() {
        let request = ApiV1SearchRequestDto {
            content_types: Some(vec!["framework".to_string(), "docs".to_string()]),
            ..dto("q")
        };
        let error = search_request_from_api_v1(request, ApiV1SearchDefaults::default()).err();
        let error = error.map(|error| {
            (
                error.code,
                error.metadata.get("input").cloned(),
                error.metadata.get("field").cloned(),
            )
        });
        assert_eq!(
            error,
            Some((
                ErrorCode::new("domain", "content_type_unknown"),
                Some("docs".to_string()),
                Some("content_types".to_string()),
            ))
        );
    }

    #[test]
    fn request_mapping_rejects_invalid_limit_before_domain() {
        let request = ApiV1SearchRequestDto {
            limit: Some(0),
            ..dto("q")
        };
        let error = search_request_from_api_v1(request, ApiV1SearchDefaults::default()).err();
        assert_eq!(error.map(|error| error.code), Some(ErrorCode::invalid_input()));
    }

    #[test]
    fn response_mapping_carries_every_field() -> Result<(), Box<dyn Error>> {
        let topology = TopologyRegistry::default();
        let mut metadata = HitMetadata::new();
        metadata.insert("content_type".to_string(), json!("principle"));
        let mut aggregations = Aggregations::default();
        aggregations.content_types.insert("principle".into(), 1);

        let response = SearchResponse {
            query: "q".into(),
            hits: vec![ScoredHit {
                id: "p-1".into(),
                score: 0.9,
                collection: topology.global_principles().clone(),
                metadata,
                content: Some("prefer composition".into()),
            }],
            total_found: 3,
            processing_time_ms: 1.5,
            search_strategy: "hybrid_multi_collection".into(),
            collections_searched: vec![topology.global_principles().clone()],
            aggregations,
        };

        let value = serde_json::to_value(search_response_to_api_v1(response))?;
        assert_eq!(
            value,
            json!({
                "query": "q",
                "results": [{
                    "id": "p-1",
                    "content": "prefer composition",
                    "metadata": { "content_type": "principle" },
                    "score": 0.9_f32,
                    "collection": "global-principles"
                }],
                "total_found": 3,
                "processing_time_ms": 1.5,
                "search_strategy": "hybrid_multi_collection",
                "collections_searched": ["global-principles"],
                "aggregations": {
                    "content_types": { "principle": 1 },
                    "frameworks": {},
                    "projects": {},
                    "hierarchy_levels": {}
                }
            })
        );
        Ok(())
    }

    #[test]
    fn response_without_content_serializes_null_content() -> Result<(), Box<dyn Error>> {
        let collection = TopologyRegistry::default().unified_index().clone();
        let response = SearchResponse {
            query: "q".into(),
            hits: vec![ScoredHit {
                id: "u-1".into(),
                score: 0.4,
                collection: collection.clone(),
                metadata: HitMetadata::new(),
                content: None,
            }],
            total_found: 1,
            processing_time_ms: 0.5,
            search_strategy: "semantic_multi_collection".into(),
            collections_searched: vec![collection],
            aggregations: Aggregations::default(),
        };

        let value = serde_json::to_value(search_response_to_api_v1(response))?;
        let hit = &value["results"][0];
        assert!(hit["content"].is_null());
        assert!(hit.as_object().is_some_and(|hit| hit.contains_key("content")));
        assert!(value.get("totalFound").is_none());
        assert_eq!(value["total_found"], json!(1));
        Ok(())
    }
}
