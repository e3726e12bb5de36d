use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::configuration::types::{StoreConfig, DEFAULT_GLOBAL_LIMIT_MB, DEFAULT_PROJECT_LIMIT_MB};

/// Project name used when the caller does not supply one.
pub const DEFAULT_PROJECT_NAME: &str = "Untitled Room";

/// A named workspace. Everything else in the store hangs off a project id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    /// Advanced on every mutation of the project row
    pub updated_at: DateTime<Utc>,
    /// Free-form key/value configuration owned by the caller
    pub settings: Value,
    pub caps: ProjectCaps,
}

/// Per-project quota override. Informational only; the enforcer reads its
/// budgets from the store's `QuotaLimits`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectCaps {
    pub per_project_mb: u64,
}

impl Default for ProjectCaps {
    fn default() -> Self {
        Self { per_project_mb: DEFAULT_PROJECT_LIMIT_MB }
    }
}

/// Settings a freshly synthesized project starts with.
pub fn default_settings() -> Value {
    json!({ "units": "m", "theme": "plum-peach" })
}

/// An immutable append-only log entry. Never mutated or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: String,
    pub project_id: String,
    pub created_at: DateTime<Utc>,
    /// Open string enum; the caller owns the vocabulary
    pub event_type: String,
    /// Opaque structured payload, shape owned by the caller
    pub payload: Value,
}

/// Caller-supplied fields of an event append.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEvent {
    pub event_type: String,
    pub payload: Value,
}

/// The three media kinds. Only `Render` is ever evicted by quota pressure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Input,
    Thumb,
    Render,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Input => "input",
            MediaKind::Thumb => "thumb",
            MediaKind::Render => "render",
        }
    }

    pub fn parse(s: &str) -> Option<MediaKind> {
        match s {
            "input" => Some(MediaKind::Input),
            "thumb" => Some(MediaKind::Thumb),
            "render" => Some(MediaKind::Render),
            _ => None,
        }
    }
}

/// A binary resource plus metadata.
///
/// `bytes` must equal the true payload size; the quota enforcer trusts this
/// field for all accounting and never re-measures the blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaAsset {
    pub id: String,
    pub project_id: String,
    pub created_at: DateTime<Utc>,
    pub kind: MediaKind,
    /// Weak back-reference to the asset this one was derived from.
    /// Advisory only; deleting the referenced asset does not cascade.
    pub related_id: Option<String>,
    pub blob: Vec<u8>,
    pub mime: String,
    pub bytes: u64,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Caller-supplied fields of a media write; id and timestamp are assigned by
/// the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMedia {
    pub kind: MediaKind,
    pub related_id: Option<String>,
    pub blob: Vec<u8>,
    pub mime: String,
    pub bytes: u64,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// A structured result snapshot, e.g. an analysis report. Excluded from
/// quota accounting and never evicted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub id: String,
    pub project_id: String,
    pub created_at: DateTime<Utc>,
    pub kind: String,
    pub json: Value,
}

/// Caller-supplied fields of an artifact write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewArtifact {
    pub kind: String,
    pub json: Value,
}

const MIB: u64 = 1024 * 1024;

/// Soft byte budgets for media, reclaimed best-effort after each write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaLimits {
    /// Budget over one project's media bytes
    pub project_limit_bytes: u64,
    /// Budget over all media bytes in the store
    pub global_limit_bytes: u64,
}

impl Default for QuotaLimits {
    fn default() -> Self {
        Self {
            project_limit_bytes: DEFAULT_PROJECT_LIMIT_MB * MIB,
            global_limit_bytes: DEFAULT_GLOBAL_LIMIT_MB * MIB,
        }
    }
}

impl From<&StoreConfig> for QuotaLimits {
    fn from(config: &StoreConfig) -> Self {
        Self {
            project_limit_bytes: config.project_limit_mb * MIB,
            global_limit_bytes: config.global_limit_mb * MIB,
        }
    }
}
