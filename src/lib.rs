//! moodstore — durable local persistence for a design-assistant application.
//!
//! Persists project metadata, an append-only activity log, binary media
//! assets (uploads, thumbnails, renders), and JSON analysis artifacts in a
//! single SQLite database, enforcing soft byte-size quotas per project and
//! globally. When a quota scope goes over budget after a media write, the
//! oldest `render` assets in that scope are reclaimed; uploads and
//! thumbnails are never evicted.
//!
//! The store is a plain library boundary: construct a
//! [`DatabaseStorage`](storage::database_storage::DatabaseStorage) once and
//! share it by reference. No process-global handle exists, so tests can run
//! several isolated stores side by side.

pub mod configuration;
pub mod error_handling;
pub mod storage;

pub use configuration::types::StoreConfig;
pub use error_handling::types::{ConfigError, StorageError};
pub use storage::database_storage::DatabaseStorage;
pub use storage::store_trait::ProjectStore;
pub use storage::types::{
    Artifact, EventRecord, MediaAsset, MediaKind, NewArtifact, NewEvent, NewMedia, Project,
    ProjectCaps, QuotaLimits,
};
