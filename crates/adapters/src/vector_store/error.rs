//! Qdrant error mapping helpers.

use knowledge_search_shared::{ErrorClass, ErrorCode, ErrorEnvelope};

/// Provider label attached to every Qdrant error.
pub const PROVIDER: &str = "qdrant";

#[derive(Debug, Clone)]
/// Context payload attached to Qdrant error envelopes.
pub struct QdrantErrorContext {
    /// Operation label for tracing failures.
    pub operation: &'static str,
    /// Collection name, when the request is collection-scoped.
    pub collection: Option<String>,
}

impl QdrantErrorContext {
    /// Context for a store-wide request.
    #[must_use]
    pub const fn store(operation: &'static str) -> Self {
        Self {
            operation,
            collection: None,
        }
    }

    /// Context for a request against one collection.
    #[must_use]
    pub fn collection(operation: &'static str, collection: &str) -> Self {
        Self {
            operation,
            collection: Some(collection.to_owned()),
        }
    }

    fn decorate(&self, envelope: ErrorEnvelope) -> ErrorEnvelope {
        let envelope = envelope
            .with_metadata("provider", PROVIDER)
            .with_metadata("operation", self.operation);
        match self.collection.as_ref() {
            Some(collection) => envelope.with_metadata("collection", collection.to_owned()),
            None => envelope,
        }
    }
}

/// Maps a non-success Qdrant REST response into the shared envelope.
pub fn map_rest_error(
    message: impl Into<String>,
    http_status: u16,
    ctx: &QdrantErrorContext,
) -> ErrorEnvelope {
    let message = message.into();
    let envelope = match http_status {
        404 => ErrorEnvelope::expected(ErrorCode::not_found(), message),
        401 | 403 => {
            ErrorEnvelope::unexpected(vdb_auth_code(), message, ErrorClass::NonRetriable)
        },
        400 | 422 => {
            ErrorEnvelope::unexpected(vdb_query_invalid_code(), message, ErrorClass::NonRetriable)
        },
        408 | 504 => ErrorEnvelope::unexpected(vdb_timeout_code(), message, ErrorClass::Retriable),
        429 | 500..=599 => {
            ErrorEnvelope::unexpected(vdb_connection_code(), message, ErrorClass::Retriable)
        },
        _ => ErrorEnvelope::unexpected(vdb_unknown_code(), message, ErrorClass::NonRetriable),
    };
    ctx.decorate(envelope)
        .with_metadata("status", http_status.to_string())
}

#[cfg(feature = "qdrant-rest")]
/// Maps reqwest transport errors into shared error envelopes.
pub fn map_rest_transport_error(error: &reqwest::Error, ctx: &QdrantErrorContext) -> ErrorEnvelope {
    let envelope = if error.is_timeout() {
        ErrorEnvelope::unexpected(
            vdb_timeout_code(),
            format!("Qdrant request timed out: {error}"),
            ErrorClass::Retriable,
        )
    } else if error.is_connect() {
        ErrorEnvelope::unexpected(
            vdb_connection_code(),
            format!("Qdrant connection failed: {error}"),
            ErrorClass::Retriable,
        )
    } else {
        ErrorEnvelope::unexpected(
            vdb_unknown_code(),
            format!("Qdrant request failed: {error}"),
            ErrorClass::NonRetriable,
        )
    };
    ctx.decorate(envelope)
}

#[cfg(feature = "qdrant-rest")]
/// Response body that could not be decoded.
pub(crate) fn invalid_response(message: impl Into<String>, ctx: &QdrantErrorContext) -> ErrorEnvelope {
    ctx.decorate(ErrorEnvelope::unexpected(
        ErrorCode::new("vector", "vdb_invalid_response"),
        message,
        ErrorClass::NonRetriable,
    ))
}

#[cfg(feature = "qdrant-rest")]
/// Request that ran past the adapter deadline.
pub(crate) fn timeout_error(ctx: &QdrantErrorContext) -> ErrorEnvelope {
    ctx.decorate(ErrorEnvelope::unexpected(
        vdb_timeout_code(),
        "Qdrant request timed out",
        ErrorClass::Retriable,
    ))
}

fn vdb_auth_code() -> ErrorCode {
    ErrorCode::new("vector", "vdb_auth")
}

fn vdb_timeout_code() -> ErrorCode {
    ErrorCode::new("vector", "vdb_timeout")
}

fn vdb_connection_code() -> ErrorCode {
    ErrorCode::new("vector", "vdb_connection")
}

fn vdb_query_invalid_code() -> ErrorCode {
    ErrorCode::new("vector", "vdb_query_invalid")
}

fn vdb_unknown_code() -> ErrorCode {
    ErrorCode::new("vector", "vdb_unknown")
}
