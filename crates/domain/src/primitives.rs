//! Domain primitives with validated constructors.

use knowledge_search_shared::{ErrorCode, ErrorEnvelope};
use serde::Serialize;
use std::fmt;

/// Maximum accepted length for a project name.
pub const MAX_PROJECT_NAME_LEN: usize = 64;

/// Maximum accepted length for a configured global collection name.
pub const MAX_COLLECTION_NAME_LEN: usize = 255;

/// Validation failures for domain primitives and search requests.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PrimitiveError {
    /// `ProjectName` is empty after trimming.
    #[error("project name must be non-empty")]
    EmptyProjectName {
        /// Length of the raw input before trimming.
        input_length: usize,
    },
    /// `ProjectName` contains a character outside `[A-Za-z0-9._-]` or does
    /// not start with an alphanumeric character.
    #[error("project name must match /^[A-Za-z0-9][A-Za-z0-9._-]*$/")]
    InvalidProjectName {
        /// Trimmed input that failed validation.
        input: String,
    },
    /// `ProjectName` is longer than [`MAX_PROJECT_NAME_LEN`].
    #[error("project name must be at most {max} characters")]
    ProjectNameTooLong {
        /// Trimmed length.
        length: usize,
        /// Allowed maximum.
        max: usize,
    },
    /// A configured collection name is empty or malformed.
    #[error("collection name must match /^[A-Za-z0-9][A-Za-z0-9._-]*$/")]
    InvalidCollectionName {
        /// Trimmed input that failed validation.
        input: String,
    },
    /// Unknown content type label.
    #[error("unknown content type: {input}")]
    UnknownContentType {
        /// Offending value.
        input: String,
    },
    /// Unknown scope label.
    #[error("unknown search scope: {input}")]
    UnknownScope {
        /// Offending value.
        input: String,
    },
    /// Unknown search mode label.
    #[error("unknown search mode: {input}")]
    UnknownMode {
        /// Offending value.
        input: String,
    },
    /// Unknown hierarchy level label.
    #[error("unknown hierarchy level: {input}")]
    UnknownHierarchyLevel {
        /// Offending value.
        input: String,
    },
    /// Unknown distance metric label.
    #[error("unknown distance metric: {input}")]
    UnknownDistance {
        /// Offending value.
        input: String,
    },
    /// Query text is empty after trimming.
    #[error("query must be non-empty")]
    EmptyQuery,
    /// Result limit outside the accepted range.
    #[error("limit must be between {min} and {max}")]
    LimitOutOfRange {
        /// Requested value.
        value: u64,
        /// Minimum accepted value.
        min: u32,
        /// Maximum accepted value.
        max: u32,
    },
    /// Score threshold outside `[0, 1]` or not finite.
    #[error("score_threshold must be between 0.0 and 1.0")]
    ScoreThresholdOutOfRange {
        /// Requested value.
        value: f32,
    },
    /// Derived collection id is invalid (invariant violation).
    #[error("derived collection id is invalid (this is a bug)")]
    DerivedCollectionIdInvalid {
        /// Candidate identifier that failed validation.
        candidate: String,
    },
}

impl PrimitiveError {
    fn error_code(&self) -> ErrorCode {
        let code = match self {
            Self::EmptyProjectName { .. } => "project_name_empty",
            Self::InvalidProjectName { .. } => "project_name_invalid_char",
            Self::ProjectNameTooLong { .. } => "project_name_too_long",
            Self::InvalidCollectionName { .. } => "invalid_collection_name",
            Self::UnknownContentType { .. } => "content_type_unknown",
            Self::UnknownScope { .. } => "scope_unknown",
            Self::UnknownMode { .. } => "mode_unknown",
            Self::UnknownHierarchyLevel { .. } => "hierarchy_level_unknown",
            Self::UnknownDistance { .. } => "distance_unknown",
            Self::EmptyQuery => "query_empty",
            Self::LimitOutOfRange { .. } => "limit_out_of_range",
            Self::ScoreThresholdOutOfRange { .. } => "score_threshold_out_of_range",
            Self::DerivedCollectionIdInvalid { .. } => "derived_collection_id_invalid",
        };
        ErrorCode::new("domain", code)
    }

    const fn is_invariant(&self) -> bool {
        matches!(self, Self::DerivedCollectionIdInvalid { .. })
    }

    /// Name of the request field the error refers to, when there is one.
    #[must_use]
    pub const fn field(&self) -> Option<&'static str> {
        match self {
            Self::EmptyProjectName { .. }
            | Self::InvalidProjectName { .. }
            | Self::ProjectNameTooLong { .. } => Some("projects"),
            Self::UnknownContentType { .. } => Some("content_types"),
            Self::UnknownScope { .. } => Some("scope"),
            Self::UnknownMode { .. } => Some("mode"),
            Self::UnknownHierarchyLevel { .. } => Some("hierarchy_levels"),
            Self::EmptyQuery => Some("query"),
            Self::LimitOutOfRange { .. } => Some("limit"),
            Self::ScoreThresholdOutOfRange { .. } => Some("score_threshold"),
            Self::InvalidCollectionName { .. }
            | Self::UnknownDistance { .. }
            | Self::DerivedCollectionIdInvalid { .. } => None,
        }
    }
}

impl From<PrimitiveError> for ErrorEnvelope {
    fn from(error: PrimitiveError) -> Self {
        let mut envelope = if error.is_invariant() {
            Self::invariant(error.error_code(), error.to_string())
        } else {
            Self::expected(error.error_code(), error.to_string())
        };
        if let Some(field) = error.field() {
            envelope = envelope.with_metadata("field", field);
        }

        match error {
            PrimitiveError::EmptyProjectName { input_length } => {
                envelope.with_metadata("input_length", input_length.to_string())
            },
            PrimitiveError::InvalidProjectName { input }
            | PrimitiveError::InvalidCollectionName { input }
            | PrimitiveError::UnknownContentType { input }
            | PrimitiveError::UnknownScope { input }
            | PrimitiveError::UnknownMode { input }
            | PrimitiveError::UnknownHierarchyLevel { input }
            | PrimitiveError::UnknownDistance { input } => envelope.with_metadata("input", input),
            PrimitiveError::ProjectNameTooLong { length, max } => envelope
                .with_metadata("length", length.to_string())
                .with_metadata("max", max.to_string()),
            PrimitiveError::LimitOutOfRange { value, min, max } => envelope
                .with_metadata("value", value.to_string())
                .with_metadata("min", min.to_string())
                .with_metadata("max", max.to_string()),
            PrimitiveError::ScoreThresholdOutOfRange { value } => {
                envelope.with_metadata("value", value.to_string())
            },
            PrimitiveError::DerivedCollectionIdInvalid { candidate } => {
                envelope.with_metadata("candidate", candidate)
            },
            PrimitiveError::EmptyQuery => envelope,
        }
    }
}

/// Name of an independently scoped project.
///
/// Project names become part of collection identifiers, so they are
/// restricted to characters every supported vector store accepts.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ProjectName(Box<str>);

impl ProjectName {
    /// Parse a `ProjectName` from user input.
    pub fn parse(input: impl AsRef<str>) -> Result<Self, PrimitiveError> {
        let raw = input.as_ref();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(PrimitiveError::EmptyProjectName {
                input_length: raw.len(),
            });
        }
        if trimmed.len() > MAX_PROJECT_NAME_LEN {
            return Err(PrimitiveError::ProjectNameTooLong {
                length: trimmed.len(),
                max: MAX_PROJECT_NAME_LEN,
            });
        }
        if !is_valid_name(trimmed) {
            return Err(PrimitiveError::InvalidProjectName {
                input: trimmed.to_owned(),
            });
        }

        Ok(Self(trimmed.into()))
    }

    /// Access the underlying string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ProjectName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for ProjectName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Identifier of a backing vector collection.
///
/// Only the [`TopologyRegistry`](crate::TopologyRegistry) constructs these,
/// so every identifier in the system follows the same naming layout.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct CollectionId(Box<str>);

impl CollectionId {
    pub(crate) fn derived(candidate: String) -> Result<Self, PrimitiveError> {
        if candidate.len() > MAX_COLLECTION_NAME_LEN || !is_valid_name(&candidate) {
            return Err(PrimitiveError::DerivedCollectionIdInvalid { candidate });
        }
        Ok(Self(candidate.into_boxed_str()))
    }

    pub(crate) fn configured(input: &str) -> Result<Self, PrimitiveError> {
        let trimmed = input.trim();
        if trimmed.is_empty() || trimmed.len() > MAX_COLLECTION_NAME_LEN || !is_valid_name(trimmed)
        {
            return Err(PrimitiveError::InvalidCollectionName {
                input: trimmed.to_owned(),
            });
        }
        Ok(Self(trimmed.into()))
    }

    pub(crate) fn from_static(value: &'static str) -> Self {
        Self(value.into())
    }

    /// Access the underlying string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for CollectionId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for CollectionId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

fn is_valid_name(value: &str) -> bool {
    let mut chars = value.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    first.is_ascii_alphanumeric()
        && chars.all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.'))
}
