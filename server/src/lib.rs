//! # Position Relay Server
//!
//! Relays player identity and position between game clients connected over
//! TCP. Every client sends small text commands; the server keeps one player
//! record per connection and rebroadcasts each change to every connected
//! client, the sender included.
//!
//! ## Connection Lifecycle
//!
//! A connection moves through `Connecting`, `Active`, `Closing` and `Closed`.
//! On becoming active it registers a player with default values and announces
//! it to everybody. Explicit `DISC`, a closed socket, a stream that ends
//! mid-frame and a failed write all lead to the same cleanup: the player is
//! removed from the registry and the socket is released.
//!
//! ## Concurrency
//!
//! Each connection runs in its own task and processes its frames strictly in
//! arrival order. The [`registry::PlayerRegistry`] is the only shared state;
//! it sits behind an async `RwLock` that is held for one register, update,
//! remove or snapshot call at a time, never across socket I/O. Broadcasts
//! iterate a snapshot and queue text on per-connection channels, so a slow or
//! dead peer never blocks the others.
//!
//! ## Module Organization
//!
//! - `registry`: connection to player mapping and identity assignment
//! - `client`: cloneable handle used to queue output and request shutdown
//! - `broadcast`: fan-out of one message to a registry snapshot
//! - `connection`: per-connection protocol state machine and writer task
//! - `network`: TCP acceptor
//! - `config`, `error`: settings and error types
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = Server::bind(ServerConfig::default()).await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod broadcast;
pub mod client;
pub mod config;
pub mod connection;
pub mod error;
pub mod network;
pub mod registry;

pub use config::ServerConfig;
pub use error::ServerError;
pub use network::Server;
