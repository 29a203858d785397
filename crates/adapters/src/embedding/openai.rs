//! OpenAI-compatible HTTP embedding adapter.
//!
//! Talks to any server exposing `POST {base_url}/embeddings` with the
//! OpenAI request and response shapes (OpenAI, text-embeddings-inference,
//! vLLM, LiteLLM, ...).

use knowledge_search_config::EmbeddingConfig;
use knowledge_search_ports::{
    BoxFuture, EmbedBatchRequest, EmbedRequest, EmbeddingModelInfo, EmbeddingPort,
    EmbeddingVector,
};
use knowledge_search_shared::{ErrorClass, ErrorCode, ErrorEnvelope, RequestContext, Result};
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

const PROVIDER: &str = "openai_compatible";

/// HTTP embedding adapter configuration.
#[derive(Debug, Clone)]
pub struct HttpEmbeddingConfig {
    /// Base URL, without the `/embeddings` suffix.
    pub base_url: Box<str>,
    /// Model name sent with every request.
    pub model: Box<str>,
    /// Optional bearer token.
    pub api_key: Option<Box<str>>,
    /// Expected vector dimension.
    pub dimension: u32,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl HttpEmbeddingConfig {
    /// Build from the validated embedding config section.
    #[must_use]
    pub fn from_embedding_config(config: &EmbeddingConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            api_key: config
                .api_key
                .as_ref()
                .map(|key| key.expose().to_owned().into_boxed_str()),
            dimension: config.dimension,
            timeout_ms: config.timeout_ms,
        }
    }
}

/// OpenAI-compatible embedding adapter implementation.
pub struct HttpEmbedding {
    info: EmbeddingModelInfo,
    client: reqwest::Client,
    endpoint: Box<str>,
}

impl HttpEmbedding {
    /// Create a new adapter.
    pub fn new(config: &HttpEmbeddingConfig) -> Result<Self> {
        let model = normalize_required("model", &config.model)?;
        let base_url = normalize_required("base url", &config.base_url)?;
        let base_url = base_url.trim_end_matches('/');
        if config.timeout_ms == 0 {
            return Err(ErrorEnvelope::expected(
                ErrorCode::invalid_input(),
                "timeout must be greater than zero",
            ));
        }
        if config.dimension == 0 {
            return Err(ErrorEnvelope::expected(
                ErrorCode::invalid_input(),
                "dimension must be greater than zero",
            ));
        }

        let mut headers = HeaderMap::new();
        if let Some(api_key) = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
        {
            let mut auth_header =
                HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(|_| {
                    ErrorEnvelope::expected(
                        ErrorCode::invalid_input(),
                        "api key contains invalid header characters",
                    )
                })?;
            auth_header.set_sensitive(true);
            headers.insert(AUTHORIZATION, auth_header);
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .default_headers(headers)
            .build()
            .map_err(|error| {
                ErrorEnvelope::unexpected(
                    ErrorCode::new("embedding", "http_client_init_failed"),
                    format!("failed to build embedding client: {error}"),
                    ErrorClass::NonRetriable,
                )
            })?;

        Ok(Self {
            info: EmbeddingModelInfo {
                provider: PROVIDER.into(),
                model,
                dimension: config.dimension,
            },
            client,
            endpoint: format!("{base_url}/embeddings").into_boxed_str(),
        })
    }

    async fn embed_many(
        &self,
        ctx: &RequestContext,
        input: EmbeddingInput,
        expected_count: usize,
        operation: &'static str,
    ) -> Result<Vec<EmbeddingVector>> {
        ctx.ensure_not_cancelled(operation)?;
        if expected_count == 0 {
            return Err(ErrorEnvelope::expected(
                ErrorCode::invalid_input(),
                "embedding input must be non-empty",
            ));
        }

        let request = EmbeddingRequest {
            model: self.info.model.clone(),
            input: sanitize_input(input),
        };
        let response = self.send_request(ctx, &request, operation).await?;
        map_embeddings(response, expected_count, self.info.dimension)
    }

    async fn send_request(
        &self,
        ctx: &RequestContext,
        request: &EmbeddingRequest,
        operation: &'static str,
    ) -> Result<EmbeddingResponse> {
        let response = tokio::select! {
            () = ctx.cancelled() => return Err(cancelled_error(operation)),
            result = self.client.post(self.endpoint.as_ref()).json(request).send() => {
                result.map_err(|error| map_reqwest_error(&error))?
            }
        };

        let status = response.status();
        let payload = tokio::select! {
            () = ctx.cancelled() => return Err(cancelled_error(operation)),
            result = response.bytes() => result.map_err(|error| map_reqwest_error(&error))?,
        };

        if !status.is_success() {
            return Err(map_http_error(status, &payload));
        }

        serde_json::from_slice(&payload).map_err(|error| {
            ErrorEnvelope::unexpected(
                ErrorCode::new("embedding", "http_invalid_response"),
                format!("failed to decode embedding response: {error}"),
                ErrorClass::NonRetriable,
            )
        })
    }
}

impl EmbeddingPort for HttpEmbedding {
    fn model_info(&self) -> &EmbeddingModelInfo {
        &self.info
    }

    fn embed(
        &self,
        ctx: &RequestContext,
        request: EmbedRequest,
    ) -> BoxFuture<'_, Result<EmbeddingVector>> {
        let ctx = ctx.clone();
        let text = request.text;
        Box::pin(async move {
            let mut vectors = self
                .embed_many(&ctx, EmbeddingInput::Single(text), 1, "http_embedding.embed")
                .await?;
            vectors.pop().ok_or_else(|| {
                ErrorEnvelope::unexpected(
                    ErrorCode::new("embedding", "http_invalid_response"),
                    "missing embedding response",
                    ErrorClass::NonRetriable,
                )
            })
        })
    }

    fn embed_batch(
        &self,
        ctx: &RequestContext,
        request: EmbedBatchRequest,
    ) -> BoxFuture<'_, Result<Vec<EmbeddingVector>>> {
        let ctx = ctx.clone();
        let texts = request.texts;
        let expected_count = texts.len();
        Box::pin(async move {
            self.embed_many(
                &ctx,
                EmbeddingInput::Many(texts),
                expected_count,
                "http_embedding.embed_batch",
            )
            .await
        })
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest {
    model: Box<str>,
    input: EmbeddingInput,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum EmbeddingInput {
    Single(Box<str>),
    Many(Vec<Box<str>>),
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
    index: usize,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorDetail {
    Structured {
        message: String,
        #[serde(rename = "type")]
        error_type: Option<String>,
    },
    Plain(String),
}

fn normalize_required(label: &str, value: &str) -> Result<Box<str>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ErrorEnvelope::expected(
            ErrorCode::invalid_input(),
            format!("{label} must be set"),
        ));
    }
    Ok(trimmed.to_owned().into_boxed_str())
}

fn sanitize_text(text: Box<str>) -> Box<str> {
    if text.is_empty() { " ".into() } else { text }
}

fn sanitize_input(input: EmbeddingInput) -> EmbeddingInput {
    match input {
        EmbeddingInput::Single(text) => EmbeddingInput::Single(sanitize_text(text)),
        EmbeddingInput::Many(texts) => {
            EmbeddingInput::Many(texts.into_iter().map(sanitize_text).collect())
        },
    }
}

fn cancelled_error(operation: &'static str) -> ErrorEnvelope {
    ErrorEnvelope::cancelled("operation cancelled").with_metadata("operation", operation)
}

fn map_reqwest_error(error: &reqwest::Error) -> ErrorEnvelope {
    if error.is_timeout() {
        return ErrorEnvelope::unexpected(
            ErrorCode::timeout(),
            "embedding request timed out",
            ErrorClass::Retriable,
        );
    }
    if error.is_connect() {
        return ErrorEnvelope::unexpected(
            ErrorCode::io(),
            format!("embedding server connection failed: {error}"),
            ErrorClass::Retriable,
        );
    }
    ErrorEnvelope::unexpected(
        ErrorCode::new("embedding", "http_request_failed"),
        format!("embedding request failed: {error}"),
        ErrorClass::NonRetriable,
    )
}

fn map_http_error(status: StatusCode, payload: &[u8]) -> ErrorEnvelope {
    let envelope = match serde_json::from_slice::<ErrorResponse>(payload) {
        Ok(parsed) => {
            let (message, error_type) = match parsed.error {
                ErrorDetail::Structured {
                    message,
                    error_type,
                } => (message, error_type),
                ErrorDetail::Plain(message) => (message, None),
            };
            let envelope = match status.as_u16() {
                400 | 404 | 422 => ErrorEnvelope::expected(ErrorCode::invalid_input(), message),
                401 | 403 => ErrorEnvelope::expected(ErrorCode::permission_denied(), message),
                408 => {
                    ErrorEnvelope::unexpected(ErrorCode::timeout(), message, ErrorClass::Retriable)
                },
                429 => ErrorEnvelope::unexpected(
                    ErrorCode::rate_limited(),
                    message,
                    ErrorClass::Retriable,
                ),
                _ if status.is_server_error() => ErrorEnvelope::unexpected(
                    ErrorCode::dependency_unavailable(),
                    message,
                    ErrorClass::Retriable,
                ),
                _ => ErrorEnvelope::unexpected(
                    ErrorCode::new("embedding", "http_request_failed"),
                    message,
                    ErrorClass::NonRetriable,
                ),
            };
            match error_type {
                Some(error_type) => envelope.with_metadata("error_type", error_type),
                None => envelope,
            }
        },
        Err(_) => ErrorEnvelope::unexpected(
            ErrorCode::new("embedding", "http_request_failed"),
            "embedding request failed with non-JSON error",
            if status.is_server_error() {
                ErrorClass::Retriable
            } else {
                ErrorClass::NonRetriable
            },
        ),
    };

    envelope.with_metadata("status", status.as_u16().to_string())
}

fn map_embeddings(
    response: EmbeddingResponse,
    expected_count: usize,
    expected_dimension: u32,
) -> Result<Vec<EmbeddingVector>> {
    if response.data.len() != expected_count {
        return Err(invalid_response(format!(
            "embedding response count mismatch (expected {expected_count}, got {})",
            response.data.len()
        )));
    }

    let mut slots: Vec<Option<EmbeddingVector>> = vec![None; expected_count];
    for datum in response.data {
        let vector = EmbeddingVector::new(Arc::from(datum.embedding));
        vector.ensure_dimension(expected_dimension)?;
        let slot = slots
            .get_mut(datum.index)
            .ok_or_else(|| invalid_response("embedding response index out of range"))?;
        if slot.is_some() {
            return Err(invalid_response("embedding response index duplicated"));
        }
        *slot = Some(vector);
    }

    slots
        .into_iter()
        .map(|slot| slot.ok_or_else(|| invalid_response("embedding response missing index")))
        .collect()
}

fn invalid_response(message: impl Into<String>) -> ErrorEnvelope {
    ErrorEnvelope::unexpected(
        ErrorCode::new("embedding", "http_invalid_response"),
        message,
        ErrorClass::NonRetriable,
    )
}
