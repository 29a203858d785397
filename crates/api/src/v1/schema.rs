//! JSON Schema exports for API v1 search DTOs.

use crate::v1::{ApiV1SearchRequestDto, ApiV1SearchResponseDto};
use schemars::{Schema, schema_for};

/// JSON Schema for `ApiV1SearchRequestDto`.
#[must_use]
pub fn api_v1_search_request_schema() -> Schema {
    schema_for!(ApiV1SearchRequestDto)
}

/// JSON Schema for `ApiV1SearchResponseDto`.
#[must_use]
pub fn api_v1_search_response_schema() -> Schema {
    schema_for!(ApiV1SearchResponseDto)
}
