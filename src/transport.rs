//! Transport abstraction for the relay network client.
//!
//! The relay client hops between several servers during a session, so it
//! does not take a single connected [`Transport`]. It takes a [`Connector`]
//! that opens a fresh transport for each server address it is sent to.
//!
//! # Implementing a Custom Transport
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use relay_lobby_client::error::LobbyError;
//! use relay_lobby_client::transport::{Connector, Transport};
//!
//! struct MyTransport { /* ... */ }
//!
//! #[async_trait]
//! impl Transport for MyTransport {
//!     async fn send(&mut self, message: String) -> Result<(), LobbyError> {
//!         // frame and write `message`
//!         todo!()
//!     }
//!
//!     async fn recv(&mut self) -> Option<Result<String, LobbyError>> {
//!         // next whole message, or None once the peer hung up
//!         todo!()
//!     }
//!
//!     async fn close(&mut self) -> Result<(), LobbyError> {
//!         todo!()
//!     }
//! }
//!
//! struct MyConnector;
//!
//! #[async_trait]
//! impl Connector for MyConnector {
//!     async fn connect(&self, address: &str) -> Result<Box<dyn Transport>, LobbyError> {
//!         // Open a connection to `address`
//!         todo!()
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::error::LobbyError;

/// One open connection to a relay server, carrying whole JSON messages.
///
/// Framing is the implementation's business: one `send` is one message on
/// the server side, one `Some(Ok(_))` from `recv` is one message from it.
///
/// The relay task polls [`recv`](Transport::recv) inside `tokio::select!`,
/// so it must be cancel-safe: a dropped `recv` future may not eat a message.
#[async_trait]
pub trait Transport: Send + 'static {
    /// Hand one JSON message to the server.
    ///
    /// # Errors
    ///
    /// [`LobbyError::TransportSend`], or [`LobbyError::TransportClosed`] after
    /// [`close`](Transport::close).
    async fn send(&mut self, message: String) -> Result<(), LobbyError>;

    /// Wait for the next JSON message.
    ///
    /// `None` means the server hung up cleanly; `Some(Err(_))` is a broken
    /// connection.
    async fn recv(&mut self) -> Option<Result<String, LobbyError>>;

    /// Say goodbye to the server. Calling it twice is harmless.
    ///
    /// # Errors
    ///
    /// The close handshake failed. Resources are released anyway.
    async fn close(&mut self) -> Result<(), LobbyError>;
}

/// Opens transports to backend servers by address.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Connect to `address` (name server, master or game server).
    ///
    /// # Errors
    ///
    /// Any error that prevents the connection from being established.
    async fn connect(&self, address: &str) -> Result<Box<dyn Transport>, LobbyError>;
}
