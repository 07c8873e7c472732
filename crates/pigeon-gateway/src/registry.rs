//! Connection registry
//!
//! The authoritative map of which user identifiers are online and which
//! connection serves each of them.

use std::sync::Arc;

use dashmap::DashMap;

use crate::connection::ConnectionHandle;

/// Concurrent map of user identifier to live connection
///
/// A registry instance is created by its owner and injected into whatever
/// needs it; there is no process-wide static. The online count is derived
/// from the map length, so it can never drift from the true set of
/// registrations.
#[derive(Debug, Clone, Default)]
pub struct ConnectionRegistry {
    by_user: Arc<DashMap<String, ConnectionHandle>>,
}

impl ConnectionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            by_user: Arc::new(DashMap::new()),
        }
    }

    /// Register a connection for a user identifier
    ///
    /// A second registration under the same identifier replaces the first
    /// (last writer wins) and returns the displaced handle. The displaced
    /// connection is not closed; it stays open at the transport level but
    /// no longer receives routed deliveries.
    pub fn register(
        &self,
        user_id: impl Into<String>,
        handle: ConnectionHandle,
    ) -> Option<ConnectionHandle> {
        self.by_user.insert(user_id.into(), handle)
    }

    /// Remove the registration for a user identifier
    ///
    /// Idempotent: removing an unknown identifier is a no-op.
    pub fn unregister(&self, user_id: &str) -> Option<ConnectionHandle> {
        self.by_user.remove(user_id).map(|(_, handle)| handle)
    }

    /// Current connection for a user identifier, if online
    pub fn lookup(&self, user_id: &str) -> Option<ConnectionHandle> {
        self.by_user.get(user_id).map(|entry| entry.value().clone())
    }

    /// Whether a user identifier is currently registered
    pub fn is_online(&self, user_id: &str) -> bool {
        self.by_user.contains_key(user_id)
    }

    /// Number of distinct user identifiers currently registered
    pub fn online_count(&self) -> usize {
        self.by_user.len()
    }

    /// All registered user identifiers
    pub fn online_users(&self) -> Vec<String> {
        self.by_user.iter().map(|entry| entry.key().clone()).collect()
    }
}
