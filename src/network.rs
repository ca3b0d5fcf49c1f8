//! The seam between [`Session`](crate::Session) and whatever actually talks
//! to the backend.
//!
//! A [`NetworkClient`] accepts [`Request`]s synchronously and reports
//! everything that happens afterwards through the [`EventSink`] it was
//! initialized with. It never calls back into the session directly.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::LobbyConfig;
use crate::error::Result;
use crate::event::EventSink;
use crate::options::{InterestGroups, MatchmakingMode, MultiplayerEvent, RoomCreateOption};
use crate::room::{ActorId, PropertyMap};

/// Requests a session issues to its network client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Request {
    Connect {
        user_id: String,
        user_name: String,
        region: String,
    },
    /// Return to the master server after losing the game server.
    ReconnectToMaster,
    Disconnect,
    JoinRandomRoom {
        max_players: u8,
        mode: MatchmakingMode,
        #[serde(default)]
        filter: PropertyMap,
    },
    JoinRandomOrCreateRoom {
        room_name: String,
        options: RoomCreateOption,
        max_players: u8,
        mode: MatchmakingMode,
        #[serde(default)]
        filter: PropertyMap,
    },
    JoinRoom {
        room_name: String,
        rejoin: bool,
    },
    JoinOrCreateRoom {
        room_name: String,
        options: RoomCreateOption,
    },
    CreateRoom {
        room_name: String,
        options: RoomCreateOption,
    },
    LeaveRoom {
        will_come_back: bool,
    },
    RaiseEvent {
        event: MultiplayerEvent,
        #[serde(with = "serde_bytes")]
        payload: Vec<u8>,
    },
    RemoveEventCache {
        event_code: u8,
        /// Empty means every actor's cached copies.
        #[serde(default)]
        actors: Vec<ActorId>,
    },
    JoinGroups(InterestGroups),
    LeaveGroups(InterestGroups),
    SetRoomProperties {
        changes: Vec<(String, String)>,
    },
    SetLobbyPropertyKeys {
        keys: Vec<String>,
    },
    SetRoomOpen {
        open: bool,
    },
    SetRoomVisible {
        visible: bool,
    },
    SetMaster {
        actor_id: ActorId,
    },
    SetActorProperties {
        actor_id: ActorId,
        changes: Vec<(String, String)>,
    },
    SetUserName {
        name: String,
    },
}

impl Request {
    /// Whether this request must be sent to the game server.
    pub fn needs_room(&self) -> bool {
        matches!(
            self,
            Self::LeaveRoom { .. }
                | Self::RaiseEvent { .. }
                | Self::RemoveEventCache { .. }
                | Self::JoinGroups(_)
                | Self::LeaveGroups(_)
                | Self::SetRoomProperties { .. }
                | Self::SetLobbyPropertyKeys { .. }
                | Self::SetRoomOpen { .. }
                | Self::SetRoomVisible { .. }
                | Self::SetMaster { .. }
                | Self::SetActorProperties { .. }
                | Self::SetUserName { .. }
        )
    }

    /// Whether this request is one of the join/create family.
    pub fn is_matchmaking(&self) -> bool {
        matches!(
            self,
            Self::JoinRandomRoom { .. }
                | Self::JoinRandomOrCreateRoom { .. }
                | Self::JoinRoom { .. }
                | Self::JoinOrCreateRoom { .. }
                | Self::CreateRoom { .. }
        )
    }
}

/// A backend connection driven by a [`Session`](crate::Session).
///
/// Implementations must not block: `send` either hands the request to the
/// connection or refuses it at once.
pub trait NetworkClient {
    /// Attach to a session. Called exactly once, before any other method.
    fn init(&mut self, config: &LobbyConfig, sink: EventSink);

    /// Issue a request.
    ///
    /// # Errors
    ///
    /// Returns [`LobbyError::Rejected`](crate::LobbyError::Rejected) (or a
    /// transport error) when the request cannot be issued. Nothing is sent
    /// and no event will follow.
    fn send(&mut self, request: Request) -> Result<()>;

    /// Tear the connection down without reporting anything. Called when the
    /// session is replaced.
    fn shutdown(&mut self);

    /// Change the round-trip-time probe interval.
    fn set_ping_interval(&mut self, _interval: Duration) {}

    /// Backend clock in milliseconds, or `0` when unknown.
    fn server_time_ms(&self) -> i64 {
        0
    }

    /// Last measured round-trip time in milliseconds.
    fn round_trip_time_ms(&self) -> u32 {
        0
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;

    #[test]
    fn request_is_adjacently_tagged() {
        let json = serde_json::to_value(Request::JoinRoom {
            room_name: "arena".into(),
            rejoin: true,
        })
        .unwrap();
        assert_eq!(json["type"], "join_room");
        assert_eq!(json["data"]["room_name"], "arena");

        let json = serde_json::to_value(Request::Disconnect).unwrap();
        assert_eq!(json["type"], "disconnect");
    }

    #[test]
    fn room_scoped_requests() {
        assert!(Request::LeaveRoom {
            will_come_back: false
        }
        .needs_room());
        assert!(!Request::ReconnectToMaster.needs_room());
        assert!(Request::CreateRoom {
            room_name: "r".into(),
            options: RoomCreateOption::default(),
        }
        .is_matchmaking());
    }
}
