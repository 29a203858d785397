//! Closed vocabularies used in routing and filtering.

use crate::PrimitiveError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Category of indexed content. Each category lives in its own per-project collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    /// Framework documentation.
    Framework,
    /// Project requirements.
    Requirement,
    /// Programming principles.
    Principle,
}

impl ContentType {
    /// Every content type, in collection-layout order.
    pub const ALL: [Self; 3] = [Self::Framework, Self::Requirement, Self::Principle];

    /// Wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Framework => "framework",
            Self::Requirement => "requirement",
            Self::Principle => "principle",
        }
    }

    /// Suffix appended to `project-<name>-` for this type's collection.
    #[must_use]
    pub const fn collection_suffix(self) -> &'static str {
        match self {
            Self::Framework => "framework-docs",
            Self::Requirement => "requirements",
            Self::Principle => "local-principles",
        }
    }
}

/// Breadth of a search request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchScope {
    /// Only the requested projects' collections.
    Project,
    /// Only the global collections.
    Global,
    /// Global collections plus the requested projects' collections.
    #[default]
    All,
}

impl SearchScope {
    /// Wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Global => "global",
            Self::All => "all",
        }
    }
}

/// Requested search strategy. Routing is identical for every mode; the mode
/// is reported back in the response strategy label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Pure vector search.
    Semantic,
    /// Vector search with metadata filtering.
    #[default]
    Hybrid,
    /// Multi-tier contextual search.
    Contextual,
}

impl SearchMode {
    /// Wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Semantic => "semantic",
            Self::Hybrid => "hybrid",
            Self::Contextual => "contextual",
        }
    }
}

/// Granularity tag attached to indexed documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HierarchyLevel {
    /// Whole file.
    File,
    /// Package.
    Package,
    /// Function or method.
    Function,
    /// Concept.
    Concept,
    /// Module.
    Module,
    /// Class or type.
    Class,
}

impl HierarchyLevel {
    /// Wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Package => "package",
            Self::Function => "function",
            Self::Concept => "concept",
            Self::Module => "module",
            Self::Class => "class",
        }
    }
}

macro_rules! impl_label {
    ($ty:ty, $error:ident, [$($variant:ident),+ $(,)?]) => {
        impl $ty {
            /// Parse a label, ignoring case and surrounding whitespace.
            pub fn parse(input: impl AsRef<str>) -> Result<Self, PrimitiveError> {
                let raw = input.as_ref().trim();
                $(
                    if raw.eq_ignore_ascii_case(Self::$variant.as_str()) {
                        return Ok(Self::$variant);
                    }
                )+
                Err(PrimitiveError::$error { input: raw.to_owned() })
            }
        }

        impl FromStr for $ty {
            type Err = PrimitiveError;

            fn from_str(input: &str) -> Result<Self, Self::Err> {
                Self::parse(input)
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str(self.as_str())
            }
        }
    };
}

impl_label!(ContentType, UnknownContentType, [Framework, Requirement, Principle]);
impl_label!(SearchScope, UnknownScope, [Project, Global, All]);
impl_label!(SearchMode, UnknownMode, [Semantic, Hybrid, Contextual]);
impl_label!(
    HierarchyLevel,
    UnknownHierarchyLevel,
    [File, Package, Function, Concept, Module, Class]
);
