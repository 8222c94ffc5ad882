//! Listener that accepts TCP connections and spawns a handler for each

use crate::client::ConnectionId;
use crate::config::ServerConfig;
use crate::connection::handle_connection;
use crate::error::ServerError;
use crate::registry::{shared_registry, SharedRegistry};
use log::{debug, error, info};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;

/// Relay server owning the listening socket and the player registry
pub struct Server {
    listener: TcpListener,
    registry: SharedRegistry,
    config: ServerConfig,
    next_connection_id: u64,
}

impl Server {
    /// Binds to the configured host and port.
    pub async fn bind(config: ServerConfig) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(config.address()).await?;
        info!("Server listening on {}", listener.local_addr()?);
        Ok(Self::from_listener(listener, config))
    }

    /// Serves an already bound listener.
    pub fn from_listener(listener: TcpListener, config: ServerConfig) -> Self {
        Self {
            listener,
            registry: shared_registry(),
            config,
            next_connection_id: 0,
        }
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    pub fn registry(&self) -> SharedRegistry {
        self.registry.clone()
    }

    /// Accepts connections forever
    ///
    /// Every accepted stream gets its own task. A failed accept is logged and
    /// retried; it never stops the listener or touches running connections.
    pub async fn run(mut self) -> Result<(), ServerError> {
        info!("Started listening to players");

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    if let Err(e) = stream.set_nodelay(true) {
                        debug!("Could not disable Nagle for {}: {}", addr, e);
                    }

                    let id = ConnectionId(self.next_connection_id);
                    self.next_connection_id += 1;
                    info!("Player connected from {} as connection {}", addr, id);

                    tokio::spawn(handle_connection(
                        stream,
                        id,
                        addr,
                        self.registry.clone(),
                        self.config.max_frame_len,
                    ));
                }
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
            }
        }
    }
}
