//! Collision-resistant identifier generation.
//!
//! Record ids are opaque strings with no encoded ordering. The primary path
//! is a UUIDv4 from OS entropy; when the entropy source is unavailable the
//! generator degrades to a clock/counter composite whose collision
//! probability is negligible for a single local store.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Builder;

static FALLBACK_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Returns a fresh unique id. Never fails.
pub fn new_id() -> String {
    let mut bytes = [0u8; 16];
    match getrandom::getrandom(&mut bytes) {
        Ok(()) => Builder::from_random_bytes(bytes).into_uuid().to_string(),
        Err(_) => fallback_id(),
    }
}

fn fallback_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    let n = FALLBACK_COUNTER.fetch_add(1, Ordering::Relaxed);
    // xorshift over counter and clock for the pseudo-random suffix
    let mut x = n ^ (millis as u64) ^ 0x9e37_79b9_7f4a_7c15;
    x ^= x << 13;
    x ^= x >> 7;
    x ^= x << 17;
    format!("id-{:08x}-{}", x as u32, millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_ids_are_unique() {
        let ids: HashSet<String> = (0..10_000).map(|_| new_id()).collect();
        assert_eq!(ids.len(), 10_000);
    }

    #[test]
    fn test_fallback_ids_are_unique() {
        let ids: HashSet<String> = (0..10_000).map(|_| fallback_id()).collect();
        assert_eq!(ids.len(), 10_000);
        assert!(ids.iter().all(|id| id.starts_with("id-")));
    }
}
