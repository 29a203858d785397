//! Collection naming and layout.
//!
//! Every collection identifier in the system is produced here:
//!
//! - `project-<project>-framework-docs`
//! - `project-<project>-requirements`
//! - `project-<project>-local-principles`
//! - the two fixed globals (`global-principles`, `unified-index` by default)
//!
//! Identifiers are pure functions of their inputs.

use crate::{CollectionId, ContentType, PrimitiveError, ProjectName};

/// Default name of the global principles collection.
pub const DEFAULT_GLOBAL_PRINCIPLES: &str = "global-principles";

/// Default name of the cross-project unified index collection.
pub const DEFAULT_UNIFIED_INDEX: &str = "unified-index";

/// The three per-project collections, one per [`ContentType`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectCollections {
    /// Framework documentation collection.
    pub framework_docs: CollectionId,
    /// Requirements collection.
    pub requirements: CollectionId,
    /// Project-local principles collection.
    pub local_principles: CollectionId,
}

impl ProjectCollections {
    /// Identifier holding the given content type.
    #[must_use]
    pub const fn get(&self, content_type: ContentType) -> &CollectionId {
        match content_type {
            ContentType::Framework => &self.framework_docs,
            ContentType::Requirement => &self.requirements,
            ContentType::Principle => &self.local_principles,
        }
    }

    /// All three identifiers in [`ContentType::ALL`] order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<CollectionId> {
        ContentType::ALL
            .iter()
            .map(|content_type| self.get(*content_type).clone())
            .collect()
    }
}

/// Source of truth for collection identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopologyRegistry {
    globals: [CollectionId; 2],
}

impl TopologyRegistry {
    /// Build a registry with configured global collection names.
    pub fn new(global_principles: &str, unified_index: &str) -> Result<Self, PrimitiveError> {
        Ok(Self {
            globals: [
                CollectionId::configured(global_principles)?,
                CollectionId::configured(unified_index)?,
            ],
        })
    }

    /// The global principles collection.
    #[must_use]
    pub const fn global_principles(&self) -> &CollectionId {
        &self.globals[0]
    }

    /// The cross-project unified index collection.
    #[must_use]
    pub const fn unified_index(&self) -> &CollectionId {
        &self.globals[1]
    }

    /// The fixed global collections: principles first, then the unified index.
    #[must_use]
    pub const fn global_collections(&self) -> &[CollectionId] {
        &self.globals
    }

    /// Identifier for one content type of one project.
    pub fn collection_for(
        &self,
        project: &ProjectName,
        content_type: ContentType,
    ) -> Result<CollectionId, PrimitiveError> {
        CollectionId::derived(format!(
            "project-{project}-{}",
            content_type.collection_suffix()
        ))
    }

    /// All three identifiers of a project.
    ///
    /// Project names are validated to the same alphabet as collection ids,
    /// so an error here signals an invariant violation.
    pub fn project_collections(
        &self,
        project: &ProjectName,
    ) -> Result<ProjectCollections, PrimitiveError> {
        Ok(ProjectCollections {
            framework_docs: self.collection_for(project, ContentType::Framework)?,
            requirements: self.collection_for(project, ContentType::Requirement)?,
            local_principles: self.collection_for(project, ContentType::Principle)?,
        })
    }

    /// Globals followed by every collection of each listed project.
    pub fn all_collections(
        &self,
        projects: &[ProjectName],
    ) -> Result<Vec<CollectionId>, PrimitiveError> {
        let mut out = self.globals.to_vec();
        for project in projects {
            out.extend(self.project_collections(project)?.to_vec());
        }
        Ok(out)
    }
}

impl Default for TopologyRegistry {
    fn default() -> Self {
        Self {
            globals: [
                CollectionId::from_static(DEFAULT_GLOBAL_PRINCIPLES),
                CollectionId::from_static(DEFAULT_UNIFIED_INDEX),
            ],
        }
    }
}
