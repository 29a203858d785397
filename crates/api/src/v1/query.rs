//! Query-string form of the search request (`GET /search`).

use crate::v1::{ApiV1SearchRequestDto, ApiV1ValidationIssue};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Raw `GET /search` parameters. List fields are comma-separated.
///
/// Every field stays a string so that malformed numbers surface as API v1
/// validation errors rather than extractor rejections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiV1SearchQueryDto {
    /// Search query text.
    #[serde(default)]
    pub query: Option<String>,
    /// Comma-separated project names.
    #[serde(default)]
    pub projects: Option<String>,
    /// Comma-separated content types.
    #[serde(default)]
    pub content_types: Option<String>,
    /// Scope label.
    #[serde(default)]
    pub scope: Option<String>,
    /// Mode label.
    #[serde(default)]
    pub mode: Option<String>,
    /// Result limit.
    #[serde(default)]
    pub limit: Option<String>,
    /// Minimum score.
    #[serde(default)]
    pub score_threshold: Option<String>,
    /// `true` or `false`.
    #[serde(default)]
    pub include_content: Option<String>,
    /// Framework filter.
    #[serde(default)]
    pub framework: Option<String>,
    /// Comma-separated hierarchy levels.
    #[serde(default)]
    pub hierarchy_levels: Option<String>,
}

impl ApiV1SearchQueryDto {
    /// Convert into the JSON request shape.
    pub fn into_request_dto(self) -> Result<ApiV1SearchRequestDto, ApiV1ValidationIssue> {
        Ok(ApiV1SearchRequestDto {
            query: self.query.unwrap_or_default(),
            projects: split_list(self.projects.as_deref()),
            content_types: split_list(self.content_types.as_deref()),
            scope: non_blank(self.scope),
            mode: non_blank(self.mode),
            limit: parse_number("limit", self.limit.as_deref())?,
            score_threshold: parse_number("score_threshold", self.score_threshold.as_deref())?,
            include_content: parse_bool("include_content", self.include_content.as_deref())?,
            framework: non_blank(self.framework),
            hierarchy_levels: split_list(self.hierarchy_levels.as_deref()),
        })
    }
}

fn split_list(raw: Option<&str>) -> Option<Vec<String>> {
    let items: Vec<String> = raw?
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_owned)
        .collect();
    (!items.is_empty()).then_some(items)
}

fn non_blank(raw: Option<String>) -> Option<String> {
    raw.filter(|value| !value.trim().is_empty())
}

fn parse_number<T: FromStr>(
    field: &'static str,
    raw: Option<&str>,
) -> Result<Option<T>, ApiV1ValidationIssue> {
    let Some(raw) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(None);
    };
    raw.parse::<T>()
        .map(Some)
        .map_err(|_| ApiV1ValidationIssue::new(field, format!("`{raw}` is not a valid number")))
}

fn parse_bool(field: &'static str, raw: Option<&str>) -> Result<Option<bool>, ApiV1ValidationIssue> {
    let Some(raw) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(None);
    };
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(Some(true)),
        "false" | "0" | "no" => Ok(Some(false)),
        _ => Err(ApiV1ValidationIssue::new(
            field,
            format!("`{raw}` is not a valid boolean"),
        )),
    }
}
