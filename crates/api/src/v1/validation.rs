//! API v1 DTO validation helpers (shape and limit checks only).

use crate::v1::ApiV1SearchRequestDto;
use knowledge_search_domain::{MAX_LIMIT, MIN_LIMIT};
use knowledge_search_shared::{ErrorCode, ErrorEnvelope, Validate, ValidationError};
use std::fmt;

/// Validation failure details for API v1 DTOs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiV1ValidationIssue {
    /// Field name that failed validation.
    pub field: &'static str,
    /// Human-readable validation error message.
    pub message: Box<str>,
}

impl ApiV1ValidationIssue {
    pub(crate) fn new(field: &'static str, message: impl Into<Box<str>>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ApiV1ValidationIssue {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ApiV1ValidationIssue {}

impl ValidationError for ApiV1ValidationIssue {
    fn empty(field: &'static str) -> Self {
        Self::new(field, "value must be non-empty")
    }

    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::new(field, reason.into())
    }

    fn out_of_range(field: &'static str, _value: String, min: String, max: String) -> Self {
        Self::new(field, format!("value must be between {min} and {max}"))
    }
}

impl From<ApiV1ValidationIssue> for ErrorEnvelope {
    fn from(issue: ApiV1ValidationIssue) -> Self {
        Self::expected(ErrorCode::invalid_input(), issue.to_string())
            .with_metadata("field", issue.field)
    }
}

impl Validate for ApiV1SearchRequestDto {
    type Error = ApiV1ValidationIssue;

    fn validate(&self) -> Result<(), Self::Error> {
        if self.query.trim().is_empty() {
            return Err(ApiV1ValidationIssue::empty("query"));
        }
        if let Some(limit) = self.limit
            && !(u64::from(MIN_LIMIT)..=u64::from(MAX_LIMIT)).contains(&limit)
        {
            return Err(ApiV1ValidationIssue::out_of_range(
                "limit",
                limit.to_string(),
                MIN_LIMIT.to_string(),
                MAX_LIMIT.to_string(),
            ));
        }
        if let Some(threshold) = self.score_threshold
            && !(threshold.is_finite() && (0.0..=1.0).contains(&threshold))
        {
            return Err(ApiV1ValidationIssue::out_of_range(
                "score_threshold",
                threshold.to_string(),
                "0.0".to_string(),
                "1.0".to_string(),
            ));
        }
        if let Some(projects) = &self.projects
            && projects.iter().any(|project| project.trim().is_empty())
        {
            return Err(ApiV1ValidationIssue::empty("projects"));
        }
        Ok(())
    }
}

/// Validate a search request DTO.
pub fn validate_search_request(dto: &ApiV1SearchRequestDto) -> Result<(), ApiV1ValidationIssue> {
    dto.validate()
}
