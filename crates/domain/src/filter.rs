//! Metadata filters pushed down to the vector store.

use crate::HierarchyLevel;
use serde::Serialize;

/// Payload key holding the framework label.
pub const FRAMEWORK_KEY: &str = "framework";

/// Payload key holding the hierarchy level label.
pub const HIERARCHY_LEVEL_KEY: &str = "hierarchy_level";

/// How a single payload field must match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldMatch {
    /// Field equals the value.
    Value(Box<str>),
    /// Field equals any of the values.
    Any(Vec<Box<str>>),
}

/// Condition on a single payload field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldCondition {
    /// Payload key.
    pub key: Box<str>,
    /// Match rule.
    #[serde(rename = "match")]
    pub matches: FieldMatch,
}

/// Filter applied identically to every routed collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum MetadataFilter {
    /// A single field condition.
    Field(FieldCondition),
    /// All conditions must hold.
    And {
        /// Conjuncts.
        must: Vec<FieldCondition>,
    },
}

impl MetadataFilter {
    /// Build the filter for optional framework and hierarchy-level constraints.
    ///
    /// Returns `None` when neither is set, a single condition when one is,
    /// and an `And` when both are. Blank frameworks and empty level lists
    /// count as unset.
    #[must_use]
    pub fn from_constraints(
        framework: Option<&str>,
        hierarchy_levels: &[HierarchyLevel],
    ) -> Option<Self> {
        let mut conditions = Vec::with_capacity(2);
        if let Some(framework) = framework.map(str::trim).filter(|value| !value.is_empty()) {
            conditions.push(FieldCondition {
                key: FRAMEWORK_KEY.into(),
                matches: FieldMatch::Value(framework.into()),
            });
        }
        if !hierarchy_levels.is_empty() {
            let mut levels: Vec<Box<str>> = Vec::with_capacity(hierarchy_levels.len());
            for level in hierarchy_levels {
                let label: Box<str> = level.as_str().into();
                if !levels.contains(&label) {
                    levels.push(label);
                }
            }
            conditions.push(FieldCondition {
                key: HIERARCHY_LEVEL_KEY.into(),
                matches: FieldMatch::Any(levels),
            });
        }

        match conditions.len() {
            0 => None,
            1 => conditions.pop().map(Self::Field),
            _ => Some(Self::And { must: conditions }),
        }
    }

    /// Conditions in evaluation order.
    #[must_use]
    pub fn conditions(&self) -> &[FieldCondition] {
        match self {
            Self::Field(condition) => std::slice::from_ref(condition),
            Self::And { must } => must,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_constraints_build_no_filter() {
        assert_eq!(MetadataFilter::from_constraints(None, &[]), None);
        assert_eq!(MetadataFilter::from_constraints(Some("  "), &[]), None);
    }

    #[test]
    fn single_constraint_is_a_bare_condition() {
        let filter = MetadataFilter::from_constraints(Some("go"), &[]);
        assert_eq!(
            filter,
            Some(MetadataFilter::Field(FieldCondition {
                key: "framework".into(),
                matches: FieldMatch::Value("go".into()),
            }))
        );
    }

    #[test]
    fn both_constraints_are_conjoined() {
        let filter = MetadataFilter::from_constraints(
            Some("go"),
            &[HierarchyLevel::Function, HierarchyLevel::Package, HierarchyLevel::Function],
        );
        assert!(matches!(filter, Some(MetadataFilter::And { ref must }) if must.len() == 2));
        let conditions = filter.as_ref().map(MetadataFilter::conditions).unwrap_or_default();
        assert_eq!(
            conditions.get(1).map(|condition| &condition.matches),
            Some(&FieldMatch::Any(vec!["function".into(), "package".into()]))
        );
    }
}
