//! Server-held session credentials.
//!
//! One opaque bearer credential per caller session, keyed by the opaque
//! session id carried in the browser cookie. The store is the single
//! source of truth for the credential; the cookie never carries the
//! token itself.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use nanoid::nanoid;

#[derive(Debug, Clone)]
struct SessionEntry {
    credential: String,
    last_touched: Instant,
}

/// In-process store of per-session bearer credentials.
///
/// A session is single-owner (one browser), so no cross-request locking
/// beyond the map's own sharding is needed.
#[derive(Debug, Clone)]
pub struct SessionStore {
    entries: std::sync::Arc<DashMap<String, SessionEntry>>,
    idle_timeout: Duration,
}

impl SessionStore {
    /// Create a store with the given idle timeout.
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            entries: std::sync::Arc::new(DashMap::new()),
            idle_timeout,
        }
    }

    /// Generate a fresh opaque session id.
    pub fn generate_id() -> String {
        format!("ses_{}", nanoid!(24))
    }

    /// Record `credential` for `session_id`, overwriting any prior
    /// value and resetting the idle timer.
    pub fn store(&self, session_id: &str, credential: String) {
        self.entries.insert(
            session_id.to_string(),
            SessionEntry {
                credential,
                last_touched: Instant::now(),
            },
        );
    }

    /// Read the current credential, touching the idle timer.
    ///
    /// Returns `None` when no credential is held or the idle timeout
    /// has elapsed since the last touch; an expired entry is dropped.
    pub fn read(&self, session_id: &str) -> Option<String> {
        let mut entry = self.entries.get_mut(session_id)?;
        if entry.last_touched.elapsed() > self.idle_timeout {
            drop(entry);
            self.entries.remove(session_id);
            return None;
        }
        entry.last_touched = Instant::now();
        Some(entry.credential.clone())
    }

    /// Remove the credential immediately (sign-out).
    pub fn clear(&self, session_id: &str) {
        self.entries.remove(session_id);
    }
}
