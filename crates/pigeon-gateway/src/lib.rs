//! Pigeon Gateway - WebSocket relay for point-to-point message push
//!
//! Clients connect on `/api/pushMessage/{userId}`; the gateway registers
//! each connection in a [`ConnectionRegistry`] and a [`MessageRouter`]
//! forwards inbound envelopes to their addressed recipient. Delivery is
//! best-effort: malformed or unaddressable messages are logged and dropped,
//! nothing is queued for offline users.

mod connection;
mod envelope;
mod gateway;
mod registry;
mod router;

pub use connection::{ConnectionHandle, SendError};
pub use envelope::{Envelope, EnvelopeError, FROM_USER_ID, TO_USER_ID};
pub use gateway::{Gateway, GatewayConfig, GatewayError, ENDPOINT_PREFIX};
pub use registry::ConnectionRegistry;
pub use router::{MessageRouter, CONNECT_ACK};
