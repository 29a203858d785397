//! HTTP routes over the search runtime.

use crate::error::{ApiError, status_for};
use crate::middleware;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Extension, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use knowledge_search_api::v1::{
    ApiV1BenchmarkDto, ApiV1CollectionStatsDto, ApiV1HealthDto, ApiV1SearchDefaults,
    ApiV1SearchQueryDto, ApiV1SearchRequestDto, ApiV1SearchResponseDto,
    benchmark_report_to_api_v1, collection_stats_to_api_v1, health_report_to_api_v1,
    search_request_from_api_v1, search_response_to_api_v1,
};
use knowledge_search_app::{collections_overview, health_report, run_embedding_benchmark};
use knowledge_search_infra::SearchRuntime;
use knowledge_search_ports::{LogFields, error_payload};
use knowledge_search_shared::{ErrorCode, ErrorEnvelope, RequestContext, Result};
use serde_json::Value;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    runtime: SearchRuntime,
    defaults: ApiV1SearchDefaults,
    max_limit: u32,
}

impl AppState {
    /// Derive request defaults from the runtime config.
    #[must_use]
    pub fn new(runtime: SearchRuntime) -> Self {
        let search = &runtime.config().as_ref().search;
        let defaults = ApiV1SearchDefaults {
            limit: search.default_limit,
            score_threshold: search.default_score_threshold,
        };
        let max_limit = search.max_limit;
        Self {
            runtime,
            defaults,
            max_limit,
        }
    }

    /// Runtime behind the handlers.
    #[must_use]
    pub const fn runtime(&self) -> &SearchRuntime {
        &self.runtime
    }

    fn reply<T>(&self, ctx: &RequestContext, route: &'static str, result: Result<T>) -> Reply<T> {
        result.map(Json).map_err(|error| {
            let mut fields = LogFields::new();
            fields.insert("route".into(), Value::from(route));
            fields.insert("correlationId".into(), Value::from(ctx.correlation_id().as_str()));
            fields.insert("status".into(), Value::from(status_for(&error).as_u16()));
            fields.insert("error".into(), error_payload(&error));
            self.runtime
                .logger()
                .warn("server.request.failed", "Request failed", Some(fields));
            ApiError::new(error, ctx)
        })
    }
}

type Reply<T> = std::result::Result<Json<T>, ApiError>;

/// Build the router with every route and middleware applied.
pub fn router(state: AppState) -> Router {
    let cors = state.runtime.config().as_ref().server.cors_applies();
    let mut router = Router::new()
        .route("/search", get(search_get).post(search_post))
        .route("/health", get(health))
        .route("/collections", get(collections))
        .route("/benchmark", get(benchmark))
        .with_state(state);
    if cors {
        router = router.layer(axum::middleware::from_fn(middleware::cors));
    }
    router.layer(axum::middleware::from_fn(middleware::request_context))
}

async fn search_post(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    body: std::result::Result<Json<ApiV1SearchRequestDto>, JsonRejection>,
) -> Reply<ApiV1SearchResponseDto> {
    let result = match body {
        Ok(Json(dto)) => run_search(&state, &ctx, dto).await,
        Err(rejection) => Err(ErrorEnvelope::expected(
            ErrorCode::invalid_input(),
            format!("invalid search body: {}", rejection.body_text()),
        )),
    };
    state.reply(&ctx, "search", result)
}

async fn search_get(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    query: std::result::Result<Query<ApiV1SearchQueryDto>, QueryRejection>,
) -> Reply<ApiV1SearchResponseDto> {
    let result = match query {
        Ok(Query(query)) => match query.into_request_dto() {
            Ok(dto) => run_search(&state, &ctx, dto).await,
            Err(issue) => Err(issue.into()),
        },
        Err(rejection) => Err(ErrorEnvelope::expected(
            ErrorCode::invalid_input(),
            format!("invalid search query: {}", rejection.body_text()),
        )),
    };
    state.reply(&ctx, "search", result)
}

async fn run_search(
    state: &AppState,
    ctx: &RequestContext,
    dto: ApiV1SearchRequestDto,
) -> Result<ApiV1SearchResponseDto> {
    let request = search_request_from_api_v1(dto, state.defaults)?;
    if request.limit() > state.max_limit {
        return Err(ErrorEnvelope::expected(
            ErrorCode::new("domain", "limit_out_of_range"),
            format!("limit must be between 1 and {}", state.max_limit),
        )
        .with_metadata("input", request.limit().to_string()));
    }
    let response = state.runtime.search().search(ctx, &request).await?;
    Ok(search_response_to_api_v1(response))
}

async fn health(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Reply<ApiV1HealthDto> {
    let result = health_report(&ctx, state.runtime.health())
        .await
        .map(|report| health_report_to_api_v1(&report));
    state.reply(&ctx, "health", result)
}

async fn collections(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Reply<ApiV1CollectionStatsDto> {
    let result = collections_overview(&ctx, state.runtime.lifecycle())
        .await
        .map(|summary| collection_stats_to_api_v1(&summary));
    state.reply(&ctx, "collections", result)
}

async fn benchmark(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Reply<ApiV1BenchmarkDto> {
    let result = run_embedding_benchmark(&ctx, state.runtime.embedding())
        .await
        .map(|report| benchmark_report_to_api_v1(&report));
    state.reply(&ctx, "benchmark", result)
}
