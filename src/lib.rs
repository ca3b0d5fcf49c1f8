//! # Relay Lobby Client
//!
//! Client-side session and matchmaking state machine for relay-style
//! multiplayer backends.
//!
//! A [`Session`] sits between a game loop and a [`NetworkClient`]. The host
//! issues requests through the session; the backend answers asynchronously
//! through an [`EventSink`]; and once per frame the host calls
//! [`Session::service`], which replays everything that arrived, in order, as
//! [`SessionListener`] callbacks.
//!
//! ## Features
//!
//! - **Single-flight operations**: at most one correlated request
//!   (connect, join, leave, ...) is outstanding; stale responses are dropped
//! - **Room mirror**: [`Registry`] tracks the current room, its actors and
//!   the lobby room list
//! - **Host migration**: the listener hears about master changes once per
//!   change, after everything else in the tick
//! - **Relay backend**: `tokio-runtime` provides [`RelayNetworkClient`], and
//!   the default `transport-websocket` feature adds [`WebSocketConnector`]
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use relay_lobby_client::{
//!     LobbyConfig, RelayConfig, RelayNetworkClient, Session, SessionListener,
//!     WebSocketConnector,
//! };
//!
//! struct Game;
//! impl SessionListener for Game {}
//!
//! let relay = RelayNetworkClient::new(
//!     WebSocketConnector::new(),
//!     RelayConfig::new("wss://ns.example.com"),
//! );
//! let mut session = Session::init(LobbyConfig::new("my-app", "1.0"), relay);
//! session.connect("player-1", "eu")?;
//!
//! let mut game = Game;
//! loop {
//!     session.service(&mut game);
//!     // ... render a frame ...
//! }
//! ```

pub mod config;
pub mod error;
pub mod error_codes;
pub mod event;
pub mod listener;
pub mod network;
pub mod operation;
pub mod options;
pub mod protocol;
#[cfg(feature = "tokio-runtime")]
pub mod relay;
pub mod room;
pub mod session;
pub mod state;
pub mod transport;
pub mod transports;

// Re-export primary types for ergonomic imports.
pub use config::{ConnectionProtocol, LobbyConfig};
pub use error::{LobbyError, Result};
pub use error_codes::ErrorCode;
pub use event::{EventSink, NetworkEvent};
pub use listener::SessionListener;
pub use network::{NetworkClient, Request};
pub use operation::{Completion, Operation, OperationResult, ResponseKind, NO_ACTOR};
pub use options::{
    EventCaching, EventTarget, InterestGroups, MatchmakingMode, MultiplayerEvent,
    ReceiverOption, RoomCreateOption,
};
pub use protocol::{ClientMessage, ServerMessage};
pub use room::{
    Actor, ActorEntry, ActorId, ActorInfo, AppStats, PropertyChanges, PropertyMap, Registry,
    Room, RoomSnapshot, RoomSummary,
};
pub use session::{generate_user_id, Session};
pub use state::{ClientState, NetworkState};
pub use transport::{Connector, Transport};

#[cfg(feature = "tokio-runtime")]
pub use relay::{RelayConfig, RelayNetworkClient};

#[cfg(feature = "transport-websocket")]
pub use transports::{WebSocketConnector, WebSocketTransport};
