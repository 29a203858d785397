//! Error responses for the HTTP surface.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use knowledge_search_api::v1::{ApiV1ErrorMeta, ApiV1Result, error_envelope_to_api_v1_error};
use knowledge_search_shared::{ErrorCode, ErrorEnvelope, ErrorKind, RequestContext};

const DOMAIN_NAMESPACE: &str = "domain";

/// Failed request, rendered as an `ApiV1Result` error body.
#[derive(Debug)]
pub struct ApiError {
    envelope: ErrorEnvelope,
    request_id: Box<str>,
}

impl ApiError {
    /// Attach the request correlation id to an error.
    #[must_use]
    pub fn new(envelope: ErrorEnvelope, ctx: &RequestContext) -> Self {
        Self {
            envelope,
            request_id: ctx.correlation_id().as_str().into(),
        }
    }

    /// Status code the error maps to.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        status_for(&self.envelope)
    }

    /// Underlying envelope.
    #[must_use]
    pub const fn envelope(&self) -> &ErrorEnvelope {
        &self.envelope
    }
}

/// Map an error envelope onto an HTTP status.
#[must_use]
pub fn status_for(error: &ErrorEnvelope) -> StatusCode {
    let code = &error.code;
    if error.is_cancelled()
        || *code == ErrorCode::backend_unavailable()
        || *code == ErrorCode::timeout()
    {
        return StatusCode::SERVICE_UNAVAILABLE;
    }
    if *code == ErrorCode::not_found() {
        return StatusCode::NOT_FOUND;
    }
    let caller_error =
        *code == ErrorCode::invalid_input() || code.namespace() == DOMAIN_NAMESPACE;
    if error.kind == ErrorKind::Expected && caller_error {
        return StatusCode::BAD_REQUEST;
    }
    StatusCode::INTERNAL_SERVER_ERROR
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut meta = ApiV1ErrorMeta::new();
        meta.insert("requestId".to_owned(), self.request_id.into_string());
        let body: ApiV1Result<()> =
            ApiV1Result::err(error_envelope_to_api_v1_error(&self.envelope, Some(meta)));
        (status, Json(body)).into_response()
    }
}
