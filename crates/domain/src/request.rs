//! Validated search requests.

use crate::{ContentType, HierarchyLevel, MetadataFilter, PrimitiveError, ProjectName, SearchMode, SearchScope};

/// Smallest accepted result limit.
pub const MIN_LIMIT: u32 = 1;
/// Largest accepted result limit.
pub const MAX_LIMIT: u32 = 100;
/// Limit used when the caller does not provide one.
pub const DEFAULT_LIMIT: u32 = 10;
/// Score threshold used when the caller does not provide one.
pub const DEFAULT_SCORE_THRESHOLD: f32 = 0.7;

/// Raw, unvalidated search parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequestInput {
    /// Free-text query.
    pub query: String,
    /// Projects to search; `None` means none were requested.
    pub projects: Option<Vec<String>>,
    /// Content types to restrict project collections to.
    pub content_types: Option<Vec<ContentType>>,
    /// Search breadth.
    pub scope: SearchScope,
    /// Strategy label echoed in the response.
    pub mode: SearchMode,
    /// Maximum hits to return.
    pub limit: u64,
    /// Minimum similarity score.
    pub score_threshold: f32,
    /// Whether hit content is returned.
    pub include_content: bool,
    /// Framework filter.
    pub framework: Option<String>,
    /// Hierarchy-level filter.
    pub hierarchy_levels: Option<Vec<HierarchyLevel>>,
}

impl SearchRequestInput {
    /// Input with defaults for everything but the query.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            projects: None,
            content_types: None,
            scope: SearchScope::default(),
            mode: SearchMode::default(),
            limit: u64::from(DEFAULT_LIMIT),
            score_threshold: DEFAULT_SCORE_THRESHOLD,
            include_content: true,
            framework: None,
            hierarchy_levels: None,
        }
    }
}

/// A search request whose limit, threshold, and names have been validated.
///
/// The router only ever sees this type.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    query: Box<str>,
    projects: Vec<ProjectName>,
    content_types: Option<Vec<ContentType>>,
    scope: SearchScope,
    mode: SearchMode,
    limit: u32,
    score_threshold: f32,
    include_content: bool,
    framework: Option<Box<str>>,
    hierarchy_levels: Vec<HierarchyLevel>,
}

impl SearchRequest {
    /// Validate raw input.
    ///
    /// An empty `content_types` list is treated like an absent one.
    pub fn parse(input: SearchRequestInput) -> Result<Self, PrimitiveError> {
        let query = input.query.trim();
        if query.is_empty() {
            return Err(PrimitiveError::EmptyQuery);
        }

        let limit = u32::try_from(input.limit)
            .ok()
            .filter(|limit| (MIN_LIMIT..=MAX_LIMIT).contains(limit))
            .ok_or(PrimitiveError::LimitOutOfRange {
                value: input.limit,
                min: MIN_LIMIT,
                max: MAX_LIMIT,
            })?;

        if !input.score_threshold.is_finite() || !(0.0..=1.0).contains(&input.score_threshold) {
            return Err(PrimitiveError::ScoreThresholdOutOfRange {
                value: input.score_threshold,
            });
        }

        let projects = input
            .projects
            .unwrap_or_default()
            .iter()
            .map(ProjectName::parse)
            .collect::<Result<Vec<_>, _>>()?;

        let framework = input
            .framework
            .as_deref()
            .map(str::trim)
            .filter(|framework| !framework.is_empty())
            .map(Box::<str>::from);

        Ok(Self {
            query: query.into(),
            projects,
            content_types: input.content_types.filter(|types| !types.is_empty()),
            scope: input.scope,
            mode: input.mode,
            limit,
            score_threshold: input.score_threshold,
            include_content: input.include_content,
            framework,
            hierarchy_levels: input.hierarchy_levels.unwrap_or_default(),
        })
    }

    /// Query text, trimmed.
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Requested projects, in request order.
    #[must_use]
    pub fn projects(&self) -> &[ProjectName] {
        &self.projects
    }

    /// Content-type restriction, if any.
    #[must_use]
    pub fn content_types(&self) -> Option<&[ContentType]> {
        self.content_types.as_deref()
    }

    /// Search breadth.
    #[must_use]
    pub const fn scope(&self) -> SearchScope {
        self.scope
    }

    /// Strategy label.
    #[must_use]
    pub const fn mode(&self) -> SearchMode {
        self.mode
    }

    /// Maximum hits to return.
    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// Minimum similarity score.
    #[must_use]
    pub const fn score_threshold(&self) -> f32 {
        self.score_threshold
    }

    /// Whether hit content is returned.
    #[must_use]
    pub const fn include_content(&self) -> bool {
        self.include_content
    }

    /// Framework filter.
    #[must_use]
    pub fn framework(&self) -> Option<&str> {
        self.framework.as_deref()
    }

    /// Hierarchy-level filter (empty when unset).
    #[must_use]
    pub fn hierarchy_levels(&self) -> &[HierarchyLevel] {
        &self.hierarchy_levels
    }

    /// Metadata filter derived from the framework and hierarchy-level fields.
    #[must_use]
    pub fn metadata_filter(&self) -> Option<MetadataFilter> {
        MetadataFilter::from_constraints(self.framework(), &self.hierarchy_levels)
    }
}
