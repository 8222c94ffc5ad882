//! Per-connection protocol loop
//!
//! Each accepted stream is served by two tasks. The handler task reads frames
//! and applies them in arrival order; the writer task drains the connection's
//! outbound queue into the socket. Either one can end the connection by
//! calling [`Client::close`], which wakes the other.

use crate::broadcast::broadcast;
use crate::client::{Client, ConnectionId};
use crate::error::ServerError;
use crate::registry::SharedRegistry;
use log::{debug, info, warn};
use shared::command::ParsedFrame;
use shared::{Command, FrameReader, Player, ProtocolError, PONG};
use std::net::SocketAddr;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, watch};

/// Lifecycle of a connection. Only moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConnectionState {
    Connecting,
    Active,
    Closing,
    Closed,
}

/// What woke the handler.
enum Event {
    Frame(Result<Option<String>, ProtocolError>),
    Shutdown,
}

/// Serves one stream until it closes, then removes its player.
pub async fn handle_connection<S>(
    stream: S,
    id: ConnectionId,
    addr: SocketAddr,
    registry: SharedRegistry,
    max_frame_len: usize,
) where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (read_half, write_half) = tokio::io::split(stream);
    let (client, outbound) = Client::new(id, addr);

    let shutdown = client.shutdown_signal();
    let writer = tokio::spawn(write_outbound(write_half, outbound, client.clone(), shutdown));

    let reader = FrameReader::with_max_frame_len(read_half, max_frame_len);
    let mut connection = Connection::new(client, reader, registry);
    connection.run().await;

    if let Err(e) = writer.await {
        warn!("Writer task for connection {} panicked: {}", id, e);
    }
}

/// Drains queued messages into the socket until the connection closes.
async fn write_outbound<W>(
    mut writer: W,
    mut outbound: mpsc::Receiver<String>,
    client: Client,
    mut shutdown: watch::Receiver<bool>,
) where
    W: AsyncWrite + Unpin,
{
    loop {
        tokio::select! {
            biased;

            message = outbound.recv() => {
                let Some(message) = message else { break };
                if let Err(e) = writer.write_all(message.as_bytes()).await {
                    warn!("Write to connection {} failed: {}", client.id, e);
                    client.close();
                    break;
                }
            }
            _ = shutdown.changed() => break,
        }
    }

    if let Err(e) = writer.shutdown().await {
        debug!("Shutdown of connection {} failed: {}", client.id, e);
    }
}

/// Protocol state of one connection.
pub struct Connection<R> {
    client: Client,
    reader: FrameReader<R>,
    registry: SharedRegistry,
    state: ConnectionState,
}

impl<R: AsyncRead + Unpin> Connection<R> {
    pub fn new(client: Client, reader: FrameReader<R>, registry: SharedRegistry) -> Self {
        Self {
            client,
            reader,
            registry,
            state: ConnectionState::Connecting,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    fn transition(&mut self, next: ConnectionState) {
        debug!(
            "Connection {}: {:?} -> {:?}",
            self.client.id, self.state, next
        );
        self.state = next;
    }

    /// Registers the player, announces it and processes frames until the
    /// connection ends. The player is removed on every exit path.
    pub async fn run(&mut self) {
        let mut shutdown = self.client.shutdown_signal();
        if self.client.is_closed() {
            self.close().await;
            return;
        }
        self.activate().await;

        while self.state == ConnectionState::Active {
            let event = tokio::select! {
                frame = self.reader.read_frame() => Event::Frame(frame),
                _ = shutdown.changed() => Event::Shutdown,
            };

            match event {
                Event::Frame(Ok(Some(frame))) => {
                    if let Err(e) = self.process_frame(&frame).await {
                        warn!("Connection {} failed: {}", self.client.id, e);
                        self.transition(ConnectionState::Closing);
                    }
                }
                Event::Frame(Ok(None)) => {
                    info!("Connection {} closed by peer", self.client.id);
                    self.transition(ConnectionState::Closing);
                }
                Event::Frame(Err(e)) => {
                    match ServerError::from(e) {
                        ServerError::Protocol(ProtocolError::Framing { pending }) => info!(
                            "Connection {} closed mid-frame, dropping {} bytes",
                            self.client.id, pending
                        ),
                        other => warn!(
                            "Connection {} disconnected forcefully: {}",
                            self.client.id, other
                        ),
                    }
                    self.transition(ConnectionState::Closing);
                }
                Event::Shutdown => {
                    debug!("Connection {} asked to close", self.client.id);
                    self.transition(ConnectionState::Closing);
                }
            }
        }

        self.close().await;
    }

    async fn activate(&mut self) {
        let registered = self.registry.write().await.register(self.client.clone());
        match registered {
            Some(player) => {
                self.transition(ConnectionState::Active);
                self.announce(&player.data_frame()).await;
            }
            None => self.transition(ConnectionState::Closing),
        }
    }

    async fn close(&mut self) {
        if self.state == ConnectionState::Closed {
            return;
        }
        self.transition(ConnectionState::Closing);

        if let Some(player) = self.registry.write().await.remove(&self.client.id) {
            info!("Disconnecting player {}", player.name);
        }
        self.client.close();
        self.transition(ConnectionState::Closed);
    }

    /// Applies one frame. An error ends the connection.
    pub async fn process_frame(&mut self, text: &str) -> Result<(), ServerError> {
        let frame = ParsedFrame::parse(text);
        match frame.check() {
            Ok(()) => {}
            Err(e @ ProtocolError::UnknownCommand(_)) => {
                debug!("Ignoring frame on connection {}: {}", self.client.id, e)
            }
            Err(e) => warn!("Connection {}: {}", self.client.id, e),
        }

        match Command::from(&frame) {
            Command::Ping => self.client.send(PONG)?,
            Command::Disconnect => {
                info!("Connection {} requested disconnect", self.client.id);
                self.transition(ConnectionState::Closing);
            }
            Command::SetPlayerData { name, color, team } => {
                let updated = self
                    .update_player(|player| {
                        if let Some(name) = name {
                            player.name = name;
                        }
                        if let Some(color) = color {
                            player.color = color;
                        }
                        if let Some(team) = team {
                            player.team = team;
                        }
                    })
                    .await;

                if let Some(player) = updated {
                    info!(
                        "Name: {}, color: {}, team: {}",
                        player.name, player.color, player.team
                    );
                    self.announce(&player.data_frame()).await;
                }
            }
            Command::SetPlayerPosition { x, y, z } => {
                let updated = self
                    .update_player(|player| player.position.apply(x, y, z))
                    .await;

                if let Some(player) = updated {
                    debug!(
                        "{} moved to X: {} Y: {} Z: {}",
                        player.name, player.position.x, player.position.y, player.position.z
                    );
                    self.announce(&player.position_frame()).await;
                }
            }
            Command::Unknown(_) | Command::None => {}
        }

        Ok(())
    }

    /// Updates this connection's player; a missing entry drops the command.
    async fn update_player<F>(&self, change: F) -> Option<Player>
    where
        F: FnOnce(&mut Player),
    {
        let updated = self.registry.write().await.update(&self.client.id, change);
        if updated.is_none() {
            warn!("{}, dropping command", ServerError::RegistryMiss(self.client.id));
        }
        updated
    }

    async fn announce(&self, message: &str) {
        let report = broadcast(&self.registry, message).await;
        if !report.failed.is_empty() {
            debug!(
                "Broadcast from connection {} dropped {} peers",
                self.client.id,
                report.failed.len()
            );
        }
    }
}
