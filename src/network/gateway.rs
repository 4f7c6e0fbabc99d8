//! Gateway - WebSocket and plain TCP listeners that accept incoming
//! connections.
//!
//! The Gateway binds its sockets and spawns one Connection task per client.

use super::connection::Connection;
use super::transport::Transport;
use crate::auth::AuthProvider;
use crate::config::{Config, WebSocketConfig};
use crate::handlers::Registry;
use crate::state::Matrix;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::accept_hdr_async_with_config;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig as ProtocolConfig;
use tracing::{error, info, instrument, warn};

/// Path prefix of the WebSocket endpoint; the token follows it.
const WS_PATH_PREFIX: &str = "/ws/";

/// The Gateway accepts incoming connections and spawns handlers.
pub struct Gateway {
    websocket_listener: TcpListener,
    websocket_config: WebSocketConfig,
    plaintext_listener: Option<TcpListener>,
    matrix: Arc<Matrix>,
    registry: Arc<Registry>,
    auth: Arc<dyn AuthProvider>,
}

impl Gateway {
    /// Bind the listeners named in `config`.
    pub async fn bind(
        config: &Config,
        matrix: Arc<Matrix>,
        registry: Arc<Registry>,
        auth: Arc<dyn AuthProvider>,
    ) -> anyhow::Result<Self> {
        let websocket_listener = TcpListener::bind(config.listen.address).await?;
        info!(address = %websocket_listener.local_addr()?, "WebSocket listener bound");

        let plaintext_listener = match config.plaintext {
            Some(ref plain) => {
                let listener = TcpListener::bind(plain.address).await?;
                info!(address = %listener.local_addr()?, "Plaintext listener bound");
                Some(listener)
            }
            None => None,
        };

        Ok(Self {
            websocket_listener,
            websocket_config: config.listen.clone(),
            plaintext_listener,
            matrix,
            registry,
            auth,
        })
    }

    /// Run the gateway, accepting connections forever.
    #[instrument(skip(self), name = "gateway")]
    pub async fn run(self) -> anyhow::Result<()> {
        if let Some(plaintext_listener) = self.plaintext_listener {
            let matrix = Arc::clone(&self.matrix);
            let registry = Arc::clone(&self.registry);
            let auth = Arc::clone(&self.auth);

            tokio::spawn(async move {
                loop {
                    match plaintext_listener.accept().await {
                        Ok((stream, addr)) => {
                            info!(%addr, "Plaintext connection accepted");
                            let transport =
                                Transport::plain(stream, matrix.limits.max_line_length);
                            let connection = Connection::new_plaintext(
                                transport,
                                addr,
                                Arc::clone(&matrix),
                                Arc::clone(&registry),
                                Arc::clone(&auth),
                            );
                            tokio::spawn(async move {
                                let id = connection.id();
                                if let Err(e) = connection.run().await {
                                    error!(conn = %id, %addr, error = %e, "Plaintext connection error");
                                }
                                info!(conn = %id, %addr, "Plaintext connection closed");
                            });
                        }
                        Err(e) => {
                            error!(error = %e, "Failed to accept plaintext connection");
                        }
                    }
                }
            });
        }

        loop {
            match self.websocket_listener.accept().await {
                Ok((stream, addr)) => {
                    info!(%addr, "WebSocket connection attempt");
                    let matrix = Arc::clone(&self.matrix);
                    let registry = Arc::clone(&self.registry);
                    let auth = Arc::clone(&self.auth);
                    let ws_config = self.websocket_config.clone();

                    tokio::spawn(async move {
                        accept_websocket(stream, addr, ws_config, matrix, registry, auth).await;
                    });
                }
                Err(e) => {
                    error!(error = %e, "Failed to accept WebSocket connection");
                }
            }
        }
    }
}

/// Perform the WebSocket handshake and run the connection.
async fn accept_websocket(
    stream: TcpStream,
    addr: SocketAddr,
    ws_config: WebSocketConfig,
    matrix: Arc<Matrix>,
    registry: Arc<Registry>,
    auth: Arc<dyn AuthProvider>,
) {
    let mut token = None;
    let callback = |req: &Request, response: Response| {
        let origin = req
            .headers()
            .get(http::header::ORIGIN)
            .and_then(|o| o.to_str().ok());
        if !ws_config.origin_allowed(origin) {
            warn!(%addr, origin = ?origin, "WebSocket origin rejected");
            return Err(reject(http::StatusCode::FORBIDDEN, "Origin not allowed"));
        }

        match token_from_path(req.uri().path()) {
            Some(t) => {
                token = Some(t.to_string());
                Ok(response)
            }
            None => Err(reject(http::StatusCode::NOT_FOUND, "Expected /ws/<token>")),
        }
    };

    let protocol = protocol_config(matrix.limits.max_line_length);
    let ws_stream = match accept_hdr_async_with_config(stream, callback, Some(protocol)).await {
        Ok(ws_stream) => ws_stream,
        Err(e) => {
            warn!(%addr, error = %e, "WebSocket handshake failed");
            return;
        }
    };
    let Some(token) = token else {
        return;
    };
    info!(%addr, "WebSocket handshake successful");

    let transport = Transport::websocket(ws_stream, matrix.limits.max_line_length);
    let connection = Connection::new_websocket(transport, token, addr, matrix, registry, auth);
    let id = connection.id();
    if let Err(e) = connection.run().await {
        error!(conn = %id, %addr, error = %e, "WebSocket connection error");
    }
    info!(conn = %id, %addr, "WebSocket connection closed");
}

/// Room for the JSON envelope around a line (`cmd`, `working-dir`).
const ENVELOPE_SLACK: usize = 4096;

/// Frame limits for accepted WebSockets.
///
/// A JSON string escape is at most six bytes per input byte, so a line of
/// `max_line_length` bytes always fits. Larger messages are refused by
/// tungstenite before they are buffered.
fn protocol_config(max_line_length: usize) -> ProtocolConfig {
    let max_message = max_line_length.saturating_mul(6).saturating_add(ENVELOPE_SLACK);
    ProtocolConfig {
        max_message_size: Some(max_message),
        max_frame_size: Some(max_message),
        ..Default::default()
    }
}

/// Extract `<token>` from `/ws/<token>`.
fn token_from_path(path: &str) -> Option<&str> {
    let token = path.strip_prefix(WS_PATH_PREFIX)?;
    (!token.is_empty() && !token.contains('/')).then_some(token)
}

fn reject(status: http::StatusCode, reason: &str) -> ErrorResponse {
    let mut response = http::Response::new(Some(reason.to_string()));
    *response.status_mut() = status;
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_path() {
        assert_eq!(token_from_path("/ws/abc.def"), Some("abc.def"));
        assert_eq!(token_from_path("/ws/"), None);
        assert_eq!(token_from_path("/ws/a/b"), None);
        assert_eq!(token_from_path("/other/abc"), None);
    }

    #[test]
    fn protocol_limits_follow_line_length() {
        let config = protocol_config(256);
        let max = config.max_message_size.unwrap();
        assert!(max >= 256 * 6);
        assert!(max < 64 << 20);
        assert_eq!(config.max_frame_size, Some(max));
    }

    #[test]
    fn reject_sets_status() {
        let response = reject(http::StatusCode::FORBIDDEN, "no");
        assert_eq!(response.status(), http::StatusCode::FORBIDDEN);
        assert_eq!(response.body().as_deref(), Some("no"));
    }
}
