//! Gateway main structure
//!
//! The WebSocket server that accepts client connections on
//! `/api/pushMessage/{userId}` and feeds lifecycle events into the router.

use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_async, accept_hdr_async};
use tracing::{debug, error, info, warn};

use crate::connection::ConnectionHandle;
use crate::registry::ConnectionRegistry;
use crate::router::MessageRouter;

/// Path prefix clients connect on; the rest of the path is the user id
pub const ENDPOINT_PREFIX: &str = "/api/pushMessage/";

/// Gateway configuration
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Bind address (e.g., "127.0.0.1:18790")
    pub bind: String,
    /// Maximum number of registered connections
    pub max_connections: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:18790".to_string(),
            max_connections: 1000,
        }
    }
}

/// The WebSocket relay server
#[derive(Debug, Clone)]
pub struct Gateway {
    config: GatewayConfig,
    registry: Arc<ConnectionRegistry>,
    router: MessageRouter,
}

impl Gateway {
    /// Create a new Gateway instance
    pub fn new(config: GatewayConfig) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let router = MessageRouter::new(Arc::clone(&registry));
        Self {
            config,
            registry,
            router,
        }
    }

    /// The connection registry
    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// The message router, for server-side pushes
    pub fn router(&self) -> &MessageRouter {
        &self.router
    }

    /// Bind the configured address
    ///
    /// Split from [`serve`](Self::serve) so callers can bind port 0 and
    /// read the actual address back before serving.
    pub async fn bind(&self) -> Result<TcpListener, GatewayError> {
        let addr: SocketAddr = self.config.bind.parse()?;
        Ok(TcpListener::bind(&addr).await?)
    }

    /// Accept connections on `listener` until the task is dropped
    pub async fn serve(&self, listener: TcpListener) -> Result<(), GatewayError> {
        info!("Gateway listening on ws://{}", listener.local_addr()?);

        loop {
            let (stream, peer_addr) = listener.accept().await?;
            debug!("New connection from {}", peer_addr);

            if self.registry.online_count() >= self.config.max_connections {
                warn!("Connection limit reached, rejecting {}", peer_addr);
                let _ = self.reject_connection(stream).await;
                continue;
            }

            let gateway = self.clone();
            tokio::spawn(async move {
                if let Err(e) = gateway.handle_connection(stream, peer_addr).await {
                    error!("Connection error for {}: {}", peer_addr, e);
                }
            });
        }
    }

    /// Bind and serve
    pub async fn run(&self) -> Result<(), GatewayError> {
        let listener = self.bind().await?;
        self.serve(listener).await
    }

    /// Reject a connection that cannot be served
    async fn reject_connection(&self, stream: TcpStream) -> Result<(), GatewayError> {
        let ws_stream = accept_async(stream).await?;
        let (mut sender, _) = ws_stream.split();
        sender
            .send(Message::Text("server at capacity".to_string()))
            .await?;
        sender.close().await?;
        Ok(())
    }

    /// Handle one WebSocket connection for its whole lifetime
    async fn handle_connection(
        &self,
        stream: TcpStream,
        addr: SocketAddr,
    ) -> Result<(), GatewayError> {
        let mut user_id = None;
        let ws_stream = accept_hdr_async(stream, |req: &Request, resp: Response| {
            match user_id_from_path(req.uri().path()) {
                Some(id) => {
                    user_id = Some(id);
                    Ok(resp)
                }
                None => {
                    let mut reject = ErrorResponse::new(Some(format!(
                        "expected {}{{userId}}",
                        ENDPOINT_PREFIX
                    )));
                    *reject.status_mut() = StatusCode::BAD_REQUEST;
                    Err(reject)
                }
            }
        })
        .await?;
        let Some(user_id) = user_id else {
            // unreachable: the handshake callback either set it or errored
            return Ok(());
        };

        let (mut sender, mut receiver) = ws_stream.split();

        // Outbound queue for this connection; the registry hands clones of
        // the sending half to whoever routes a message here.
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        let handle = ConnectionHandle::new(user_id.clone(), addr, tx);
        self.router.on_open(&user_id, handle);

        loop {
            tokio::select! {
                // Drain the outbound queue onto the socket
                outbound = rx.recv() => match outbound {
                    Some(text) => {
                        if let Err(e) = sender.send(Message::Text(text)).await {
                            self.router.on_error(&user_id, &e);
                            break;
                        }
                    }
                    None => break,
                },

                // Inbound frames from the client
                inbound = receiver.next() => match inbound {
                    Some(Ok(Message::Text(text))) => {
                        self.router.on_message(&user_id, &text);
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        debug!("Connection {} closed by client", addr);
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        self.router.on_error(&user_id, &e);
                        break;
                    }
                    None => break,
                },
            }
        }

        self.router.on_close(&user_id);
        info!("Connection {} ({}) disconnected", addr, user_id);
        Ok(())
    }
}

/// Extract the user id from a connect path
fn user_id_from_path(path: &str) -> Option<String> {
    let rest = path.strip_prefix(ENDPOINT_PREFIX)?;
    let rest = rest.split('?').next().unwrap_or(rest);
    if rest.is_empty() || rest.contains('/') {
        return None;
    }
    Some(rest.to_string())
}

/// Gateway-level errors
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("Address parse error: {0}")]
    AddrParse(#[from] std::net::AddrParseError),
}
