//! Store Trait
//!
//! This module defines the `ProjectStore` trait, the library boundary the
//! surrounding application consumes.
//!
//! Implementors of this trait are responsible for:
//! - Persisting and retrieving project metadata
//! - Appending activity-log events
//! - Persisting media assets and artifacts
//! - Reclaiming media bytes when a quota scope goes over budget
//!
//! All methods return a `Result` to handle potential storage errors; record
//! absence is an `Option::None`, never an error.

use crate::error_handling::types::StorageError;
use crate::storage::types::{
    Artifact, MediaAsset, MediaKind, NewArtifact, NewEvent, NewMedia, Project,
};

/// The `ProjectStore` trait defines the interface for the durable
/// project/media/artifact store.
pub trait ProjectStore: Send + Sync {
    /// Looks a project up by a caller-supplied id; when no id is supplied or
    /// the id does not resolve, synthesizes a new project with a fresh id,
    /// persists it and returns it. Idempotent per stored id.
    fn ensure_project(&self, id: Option<&str>, name: &str) -> Result<Project, StorageError>;

    /// Retrieves a project by id.
    fn get_project(&self, id: &str) -> Result<Option<Project>, StorageError>;

    /// Inserts or replaces a project by id, advancing `updated_at`.
    fn upsert_project(&self, project: &Project) -> Result<(), StorageError>;

    /// Appends an immutable event to the activity log. Never triggers quota
    /// enforcement.
    fn append_event(&self, project_id: &str, event: NewEvent) -> Result<(), StorageError>;

    /// Persists a media asset, then enforces the project budget followed by
    /// the global budget. Returns the persisted record regardless of whether
    /// enforcement evicted anything.
    fn save_media(&self, project_id: &str, media: NewMedia) -> Result<MediaAsset, StorageError>;

    /// Persists an artifact. Artifacts never count against quotas and never
    /// trigger enforcement.
    fn save_artifact(
        &self,
        project_id: &str,
        artifact: NewArtifact,
    ) -> Result<Artifact, StorageError>;

    /// Retrieves a media asset by id.
    fn get_media(&self, id: &str) -> Result<Option<MediaAsset>, StorageError>;

    /// Lists media for one project and kind. Unordered.
    fn list_media(&self, project_id: &str, kind: MediaKind)
        -> Result<Vec<MediaAsset>, StorageError>;

    /// Lists artifacts for one project and kind. Unordered.
    fn list_artifacts(&self, project_id: &str, kind: &str) -> Result<Vec<Artifact>, StorageError>;
}
