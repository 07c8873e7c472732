//! WebSocket connection handles
//!
//! A `ConnectionHandle` is the sending side of one live client session.

use std::net::SocketAddr;

use tokio::sync::mpsc;

/// Handle to a WebSocket connection for sending text frames
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    /// User identifier bound at connect time, immutable for the session
    user_id: String,
    /// Client address
    addr: SocketAddr,
    /// Channel feeding the connection's writer task
    sender: mpsc::UnboundedSender<String>,
}

impl ConnectionHandle {
    /// Create a new connection handle
    pub fn new(
        user_id: impl Into<String>,
        addr: SocketAddr,
        sender: mpsc::UnboundedSender<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            addr,
            sender,
        }
    }

    /// Enqueue a text frame for this connection
    ///
    /// The frame is written to the socket by the connection's own writer
    /// task. Failure means the writer task is gone; the caller logs it and
    /// moves on, the close event is what removes the registration.
    pub fn send(&self, text: impl Into<String>) -> Result<(), SendError> {
        self.sender.send(text.into()).map_err(|_| SendError::Closed)
    }

    /// User identifier this connection serves
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Peer address
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Whether the writer task is still accepting frames
    pub fn is_open(&self) -> bool {
        !self.sender.is_closed()
    }
}

/// Connection-level send errors
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("Connection closed")]
    Closed,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_addr() -> SocketAddr {
        "127.0.0.1:0".parse().unwrap()
    }

    #[test]
    fn send_reaches_writer_channel() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = ConnectionHandle::new("10", test_addr(), tx);
        handle.send("hello").unwrap();
        assert_eq!(rx.try_recv().unwrap(), "hello");
    }

    #[test]
    fn send_after_writer_gone_is_closed_error() {
        let (tx, rx) = mpsc::unbounded_channel::<String>();
        drop(rx);
        let handle = ConnectionHandle::new("10", test_addr(), tx);
        assert!(matches!(handle.send("hello"), Err(SendError::Closed)));
        assert!(!handle.is_open());
    }
}
