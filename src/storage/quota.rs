//! Soft quota enforcement over media bytes.
//!
//! Two budgets apply after every media write: a per-project budget over the
//! writing project's media, then a global budget over the whole store. When
//! a scope is over budget, renders are deleted oldest-first until enough
//! declared bytes have been reclaimed. `input` and `thumb` assets are never
//! evicted, so a scope may legitimately stay over budget; that is logged,
//! not raised.

use log::{debug, warn};
use sqlx::{Pool, Sqlite};

use crate::error_handling::types::StorageError;
use crate::storage::database_storage::tx_failed;
use crate::storage::types::QuotaLimits;

#[derive(Debug, sqlx::FromRow)]
struct EvictionCandidate {
    id: String,
    bytes: i64,
}

/// Project-scope pass: sum the project's media bytes and reclaim the overage
/// from its oldest renders.
pub(crate) async fn enforce_project_limit(
    pool: &Pool<Sqlite>,
    limits: &QuotaLimits,
    project_id: &str,
) -> Result<(), StorageError> {
    let total = media_bytes(pool, Some(project_id)).await?;
    if total <= limits.project_limit_bytes {
        return Ok(());
    }
    evict_renders(pool, Some(project_id), total - limits.project_limit_bytes).await
}

/// Global-scope pass: same algorithm over every project's media.
pub(crate) async fn enforce_global_limit(
    pool: &Pool<Sqlite>,
    limits: &QuotaLimits,
) -> Result<(), StorageError> {
    let total = media_bytes(pool, None).await?;
    if total <= limits.global_limit_bytes {
        return Ok(());
    }
    evict_renders(pool, None, total - limits.global_limit_bytes).await
}

/// Aggregates declared `bytes` over a scope. An empty scope sums to zero and
/// is trivially under budget.
async fn media_bytes(pool: &Pool<Sqlite>, project_id: Option<&str>) -> Result<u64, StorageError> {
    let total: i64 = match project_id {
        Some(project_id) => {
            sqlx::query_scalar("SELECT COALESCE(SUM(bytes), 0) FROM media WHERE project_id = ?1")
                .bind(project_id)
                .fetch_one(pool)
                .await
                .map_err(tx_failed)?
        }
        None => sqlx::query_scalar("SELECT COALESCE(SUM(bytes), 0) FROM media")
            .fetch_one(pool)
            .await
            .map_err(tx_failed)?,
    };
    Ok(total.max(0) as u64)
}

/// Deletes renders in the scope, oldest first, until `overage` declared
/// bytes have been reclaimed or no eligible record remains.
async fn evict_renders(
    pool: &Pool<Sqlite>,
    project_id: Option<&str>,
    overage: u64,
) -> Result<(), StorageError> {
    let candidates: Vec<EvictionCandidate> = match project_id {
        Some(project_id) => {
            sqlx::query_as(
                "SELECT id, bytes FROM media
                 WHERE kind = 'render' AND project_id = ?1
                 ORDER BY created_at ASC",
            )
            .bind(project_id)
            .fetch_all(pool)
            .await
            .map_err(tx_failed)?
        }
        None => {
            sqlx::query_as(
                "SELECT id, bytes FROM media WHERE kind = 'render' ORDER BY created_at ASC",
            )
            .fetch_all(pool)
            .await
            .map_err(tx_failed)?
        }
    };

    let mut remaining = overage as i64;
    for candidate in candidates {
        if remaining <= 0 {
            break;
        }
        sqlx::query("DELETE FROM media WHERE id = ?1")
            .bind(&candidate.id)
            .execute(pool)
            .await
            .map_err(tx_failed)?;
        remaining -= candidate.bytes;
        debug!("evicted render {} ({} bytes)", candidate.id, candidate.bytes);
    }

    if remaining > 0 {
        // Only inputs and thumbs are left; budgets are soft, so this is an
        // observed condition rather than a failure.
        warn!(
            "media quota still over budget by {} bytes after evicting all renders in scope",
            remaining
        );
    }
    Ok(())
}
