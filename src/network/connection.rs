//! Connection - handles an individual client connection.
//!
//! Each Connection runs in its own Tokio task:
//!
//! ```text
//! Phase 1: Authenticate (token from the WebSocket path or the first TCP line)
//!    ↓
//! Phase 2: Register the session, welcome, presence refresh
//!    ↓
//! Phase 3: tokio::select! over
//!    - the next inbound line  → echo, parse, broadcast or dispatch
//!    - the session's outbound queue → write to the socket
//!    ↓
//! Phase 4: Deregister, presence refresh
//! ```
//!
//! Lines from one connection are handled strictly in order; a line is fully
//! processed before the next one is read.

use super::transport::{Inbound, Transport};
use crate::auth::AuthProvider;
use crate::error::RegistryError;
use crate::handlers::{Context, Registry};
use crate::state::{ConnId, Matrix};
use crate::telemetry::spans;
use portal_proto::{Command, Frame, InboundFrame, MsgType, ParseContext, ParseError};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{Instrument, debug, info, warn};

/// A client connection handler.
pub struct Connection {
    id: ConnId,
    addr: SocketAddr,
    transport: Transport,
    /// Token captured during the WebSocket handshake.
    token: Option<String>,
    matrix: Arc<Matrix>,
    registry: Arc<Registry>,
    auth: Arc<dyn AuthProvider>,
}

impl Connection {
    /// Create a handler for an accepted WebSocket whose path carried `token`.
    pub fn new_websocket(
        transport: Transport,
        token: String,
        addr: SocketAddr,
        matrix: Arc<Matrix>,
        registry: Arc<Registry>,
        auth: Arc<dyn AuthProvider>,
    ) -> Self {
        Self {
            id: ConnId::new(),
            addr,
            transport,
            token: Some(token),
            matrix,
            registry,
            auth,
        }
    }

    /// Create a handler for a plain TCP client; its first line is the token.
    pub fn new_plaintext(
        transport: Transport,
        addr: SocketAddr,
        matrix: Arc<Matrix>,
        registry: Arc<Registry>,
        auth: Arc<dyn AuthProvider>,
    ) -> Self {
        Self {
            id: ConnId::new(),
            addr,
            transport,
            token: None,
            matrix,
            registry,
            auth,
        }
    }

    pub fn id(&self) -> ConnId {
        self.id
    }

    /// Run the connection until the client leaves.
    pub async fn run(mut self) -> anyhow::Result<()> {
        let span = spans::connection(
            &self.id.to_string(),
            &self.addr.to_string(),
            self.transport.kind(),
        );
        async move {
            let Some(username) = self.authenticate().await? else {
                self.transport.close().await;
                return Ok(());
            };

            let (tx, rx) = mpsc::channel(self.matrix.limits.outbound_queue);
            match self.matrix.sessions.register(self.id, &username, tx) {
                Ok(_) => {}
                Err(RegistryError::DuplicateUsername(name)) => {
                    info!(username = %name, "rejecting duplicate login");
                    let text = crate::error::HandlerError::UsernameInUse(name).user_text();
                    self.transport.send(&Frame::notice(text)).await?;
                    deregister(&self.matrix, self.id);
                    self.transport.close().await;
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            }
            info!(
                username = %username,
                server = %self.matrix.server_info.name,
                online = self.matrix.sessions.len(),
                "Client registered"
            );

            let result = self.session_loop(&username, rx).await;

            deregister(&self.matrix, self.id);
            self.transport.close().await;
            result
        }
        .instrument(span)
        .await
    }

    /// Resolve the client's token to a username.
    ///
    /// `Ok(None)` means the client left or was refused.
    async fn authenticate(&mut self) -> anyhow::Result<Option<String>> {
        let token = match self.token.take() {
            Some(token) => token,
            None => match self.transport.recv().await? {
                Some(Inbound::Frame(frame)) => frame.cmd,
                Some(Inbound::Oversized) | None => return Ok(None),
            },
        };

        match self.auth.verify(&token).await {
            Ok(username) => Ok(Some(username)),
            Err(e) => {
                warn!(error = %e, "authentication failed");
                crate::metrics::record_auth_failure();
                self.transport
                    .send(&Frame::notice("Authentication failed"))
                    .await?;
                Ok(None)
            }
        }
    }

    async fn session_loop(
        &mut self,
        username: &str,
        mut outbound: mpsc::Receiver<Frame>,
    ) -> anyhow::Result<()> {
        let broadcaster = &self.matrix.broadcaster;
        broadcaster.send_to(
            self.id,
            Frame::notice(format!("Connected as user: {username}")),
        );
        for line in &self.matrix.motd {
            broadcaster.send_to(self.id, Frame::notice(line.clone()));
        }
        broadcaster.presence_refresh();

        loop {
            tokio::select! {
                inbound = self.transport.recv() => {
                    match inbound? {
                        Some(Inbound::Frame(frame)) => self.handle_frame(frame).await?,
                        Some(Inbound::Oversized) => {
                            let max = self.matrix.limits.max_line_length;
                            self.transport
                                .send(&Frame::notice(format!("Line too long (max {max} bytes)")))
                                .await?;
                        }
                        None => return Ok(()),
                    }
                }
                Some(frame) = outbound.recv() => {
                    self.transport.send(&frame).await?;
                }
            }
        }
    }

    /// Process one client line to completion.
    async fn handle_frame(&mut self, frame: InboundFrame) -> anyhow::Result<()> {
        let Some(session) = self.matrix.sessions.get(self.id) else {
            anyhow::bail!("session vanished from the registry");
        };
        if let Some(ref hint) = frame.working_dir
            && *hint != session.working_dir
        {
            debug!(client = %hint, server = %session.working_dir, "client working dir differs");
        }

        let command = match Command::parse(&frame.cmd, &ParseContext::new(&session.working_dir)) {
            Ok(command) => command,
            Err(ParseError::Empty) => return Ok(()),
        };

        self.transport
            .send(&Frame::Echo {
                line: command.full.clone(),
            })
            .await?;
        debug!(kind = command.msg_type.as_str(), "line parsed");

        match command.msg_type {
            MsgType::Global | MsgType::Portal => {
                let body = command.body().unwrap_or_default();
                let broadcaster = &self.matrix.broadcaster;
                let outcome = if command.msg_type == MsgType::Global {
                    broadcaster.global(self.id, body)
                } else {
                    broadcaster.portal(self.id, body)
                };
                if let Err(e) = outcome {
                    self.transport.send(&Frame::notice(e.user_text())).await?;
                }
            }
            MsgType::Command => {
                let ctx = Context::new(self.id, &self.matrix, &self.registry);
                let result = self.registry.dispatch(&ctx, &command).await;
                self.transport
                    .send(&Frame::Result {
                        text: result.text,
                        working_dir: result.working_dir,
                    })
                    .await?;
            }
        }
        Ok(())
    }
}

/// Drop the session of `id`, if it has one, and tell the others.
///
/// Returns whether a presence refresh went out. Connections that never got
/// a session leave without one.
fn deregister(matrix: &Matrix, id: ConnId) -> bool {
    match matrix.sessions.remove(id) {
        Some(session) => {
            info!(username = %session.username, "Client disconnected");
            if matrix.sessions.is_empty() {
                debug!("last session closed");
            }
            matrix.broadcaster.presence_refresh();
            true
        }
        None => false,
    }
}
