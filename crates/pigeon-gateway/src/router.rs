//! Message routing
//!
//! Consumes lifecycle events and inbound frames from connections, keeps the
//! registry current, and forwards envelopes to their recipients. Every
//! failure path here is local: a bad frame or a dead recipient is logged
//! and dropped, never surfaced back to the sender and never allowed to take
//! down the connection loop.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::connection::ConnectionHandle;
use crate::envelope::Envelope;
use crate::registry::ConnectionRegistry;

/// Acknowledgment sent to every freshly registered connection
pub const CONNECT_ACK: &str = "连接成功";

/// Routes inbound envelopes and server pushes via the registry
#[derive(Debug, Clone)]
pub struct MessageRouter {
    registry: Arc<ConnectionRegistry>,
}

impl MessageRouter {
    /// Create a router over an injected registry
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// The registry this router delivers through
    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Number of distinct users currently online
    pub fn online_count(&self) -> usize {
        self.registry.online_count()
    }

    /// A connection opened for `user_id`
    ///
    /// Registers the connection (replacing any prior registration for the
    /// same identifier) and acknowledges it before any routed message can
    /// arrive.
    pub fn on_open(&self, user_id: &str, handle: ConnectionHandle) {
        let ack_target = handle.clone();
        let displaced = self.registry.register(user_id, handle);
        if displaced.is_some() {
            warn!(
                "User {} reconnected, previous connection orphaned",
                user_id
            );
        }
        info!(
            "User connected: {}, online count: {}",
            user_id,
            self.registry.online_count()
        );
        if let Err(e) = ack_target.send(CONNECT_ACK) {
            warn!("Failed to ack connection for {}: {}", user_id, e);
        }
    }

    /// A connection for `user_id` closed
    pub fn on_close(&self, user_id: &str) {
        self.registry.unregister(user_id);
        info!(
            "User disconnected: {}, online count: {}",
            user_id,
            self.registry.online_count()
        );
    }

    /// The transport reported an error for `user_id`
    ///
    /// Log only. Close and error are independent events with no ordering
    /// between them; the close callback is the authoritative removal signal.
    pub fn on_error(&self, user_id: &str, err: &dyn std::error::Error) {
        error!("Transport error for user {}: {}", user_id, err);
    }

    /// A text frame arrived from `from_user_id`
    ///
    /// Blank input is ignored. Anything unroutable is dropped with a log
    /// line; the sender gets no reply either way.
    pub fn on_message(&self, from_user_id: &str, raw: &str) {
        if raw.trim().is_empty() {
            return;
        }
        debug!("Message from {}: {}", from_user_id, raw);

        let mut envelope = match Envelope::parse(raw) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!("Dropping malformed message from {}: {}", from_user_id, e);
                return;
            }
        };
        envelope.stamp_sender(from_user_id);

        let to_user_id = match envelope.to_user_id() {
            Some(id) => id.to_string(),
            None => {
                warn!("Dropping unaddressed message from {}", from_user_id);
                return;
            }
        };
        match self.registry.lookup(&to_user_id) {
            Some(recipient) => {
                if let Err(e) = recipient.send(envelope.to_string()) {
                    warn!(
                        "Failed to deliver message from {} to {}: {}",
                        from_user_id, to_user_id, e
                    );
                }
            }
            None => {
                debug!(
                    "Dropping message from {} to offline user {}",
                    from_user_id, to_user_id
                );
            }
        }
    }

    /// Server-initiated push of plain text to a user
    ///
    /// Returns whether a delivery was attempted; an offline recipient is
    /// logged and reported as `false`, never as an error.
    pub fn push_to_user(&self, user_id: &str, text: &str) -> bool {
        match self.registry.lookup(user_id) {
            Some(conn) => {
                debug!("Pushing to {}: {}", user_id, text);
                if let Err(e) = conn.send(text) {
                    warn!("Failed to push to {}: {}", user_id, e);
                }
                true
            }
            None => {
                warn!("User {} not online, push dropped", user_id);
                false
            }
        }
    }
}
