//! Validation-session cache
//!
//! A client that previewed an upload may submit the returned token instead
//! of re-uploading, provided the cached rows are still within their TTL.
//! Entries are single-use: taking a token consumes it.

use crate::models::ValidatedRow;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;
use uuid::Uuid;

struct CachedValidation {
    event_id: String,
    rows: Vec<ValidatedRow>,
    stored_at: Instant,
}

/// In-memory store of recent validation results, keyed by session token
pub struct SessionCache {
    ttl: Duration,
    inner: Mutex<HashMap<Uuid, CachedValidation>>,
}

impl SessionCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            inner: Mutex::new(HashMap::new()),
        }
    }

    /// Cache validated rows and return the session token
    pub fn store(&self, event_id: &str, rows: Vec<ValidatedRow>) -> Uuid {
        let token = Uuid::new_v4();
        let mut inner = self.inner.lock().expect("session cache lock poisoned");
        inner.insert(
            token,
            CachedValidation {
                event_id: event_id.to_string(),
                rows,
                stored_at: Instant::now(),
            },
        );
        token
    }

    /// Consume a token, returning its rows if it is known, unexpired and
    /// was created for the same event
    pub fn take(&self, token: Uuid, event_id: &str) -> Option<Vec<ValidatedRow>> {
        let mut inner = self.inner.lock().expect("session cache lock poisoned");
        let entry = inner.remove(&token)?;
        if entry.stored_at.elapsed() > self.ttl {
            debug!(%token, "Validation session expired");
            return None;
        }
        if entry.event_id != event_id {
            debug!(%token, "Validation session bound to a different event");
            return None;
        }
        Some(entry.rows)
    }

    /// Evict expired entries; returns how many were removed
    pub fn purge_expired(&self) -> usize {
        let mut inner = self.inner.lock().expect("session cache lock poisoned");
        let before = inner.len();
        inner.retain(|_, entry| entry.stored_at.elapsed() <= self.ttl);
        before - inner.len()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("session cache lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> ValidatedRow {
        ValidatedRow {
            row: 2,
            student_name: "Asha".to_string(),
            grade: "5".to_string(),
            section: None,
            dynamic_data: Default::default(),
        }
    }

    #[test]
    fn test_store_and_take() {
        let cache = SessionCache::new(Duration::from_secs(60));
        let token = cache.store("evt-1", vec![row()]);
        let rows = cache.take(token, "evt-1").unwrap();
        assert_eq!(rows.len(), 1);
        // Single use
        assert!(cache.take(token, "evt-1").is_none());
    }

    #[test]
    fn test_unknown_token() {
        let cache = SessionCache::new(Duration::from_secs(60));
        assert!(cache.take(Uuid::new_v4(), "evt-1").is_none());
    }

    #[test]
    fn test_expired_token_rejected() {
        let cache = SessionCache::new(Duration::ZERO);
        let token = cache.store("evt-1", vec![row()]);
        std::thread::sleep(Duration::from_millis(5));
        assert!(cache.take(token, "evt-1").is_none());
    }

    #[test]
    fn test_event_mismatch_rejected() {
        let cache = SessionCache::new(Duration::from_secs(60));
        let token = cache.store("evt-1", vec![row()]);
        assert!(cache.take(token, "evt-2").is_none());
    }

    #[test]
    fn test_purge_expired() {
        let cache = SessionCache::new(Duration::ZERO);
        cache.store("evt-1", vec![row()]);
        cache.store("evt-1", vec![row()]);
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(cache.purge_expired(), 2);
        assert!(cache.is_empty());
    }
}
