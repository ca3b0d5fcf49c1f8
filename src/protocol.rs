//! JSON wire messages spoken by [`RelayNetworkClient`](crate::relay::RelayNetworkClient).
//!
//! The same message set is used against the name server, the master server
//! and game servers; each server only sends the subset that concerns it.
//! Room-scoped and matchmaking requests travel as [`ClientMessage::Operation`]
//! wrapping the session's own [`Request`].

use serde::{Deserialize, Serialize};

use crate::config::ConnectionProtocol;
use crate::network::Request;
use crate::operation::ResponseKind;
use crate::room::{ActorId, ActorInfo, AppStats, RoomSnapshot, RoomSummary};

// ── Messages ────────────────────────────────────────────────────────

/// Message types sent from client to server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ClientMessage {
    /// First message on every connection.
    Authenticate {
        app_id: String,
        app_version: String,
        user_id: String,
        user_name: String,
        /// Only sent to the name server.
        #[serde(skip_serializing_if = "Option::is_none")]
        region: Option<String>,
        protocol: ConnectionProtocol,
    },
    /// Enter the master server's lobby.
    JoinLobby,
    /// Round-trip-time probe.
    Ping { client_time_ms: u64 },
    /// A session request forwarded verbatim.
    Operation(Request),
}

/// Message types sent from server to client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ServerMessage {
    /// Name server answer: where the region's master server lives.
    MasterAddress { address: String },
    /// Authentication successful.
    Authenticated {
        #[serde(default)]
        user_id: String,
    },
    /// Entered the master server's lobby.
    LobbyJoined,
    AppStats(AppStats),
    /// Full room list.
    RoomList { rooms: Vec<RoomSummary> },
    /// Incremental room list change.
    RoomListUpdate {
        #[serde(default)]
        updated: Vec<RoomSummary>,
        #[serde(default)]
        removed: Vec<String>,
    },
    /// Terminal response to a matchmaking or leave request.
    ///
    /// On the master server a successful join carries `game_server`: the
    /// client must move there and repeat the request. On a game server a
    /// successful join carries `room`.
    OperationResponse {
        kind: ResponseKind,
        error_code: i32,
        #[serde(default)]
        error_message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        actor_id: Option<ActorId>,
        #[serde(skip_serializing_if = "Option::is_none")]
        game_server: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        room: Option<Box<RoomSnapshot>>,
    },
    ActorJoined { actor: ActorInfo },
    ActorLeft {
        actor_id: ActorId,
        /// The actor keeps its slot for a rejoin.
        #[serde(default)]
        inactive: bool,
        /// Remove silently.
        #[serde(default)]
        cleanup: bool,
    },
    /// Custom event raised by another actor.
    Event {
        actor_id: ActorId,
        code: u8,
        #[serde(with = "serde_bytes")]
        payload: Vec<u8>,
    },
    RoomPropertiesChanged { changes: Vec<(String, String)> },
    ActorPropertiesChanged {
        actor_id: ActorId,
        changes: Vec<(String, String)>,
    },
    MasterChanged { actor_id: ActorId },
    /// Pong response to ping.
    Pong {
        client_time_ms: u64,
        server_time_ms: i64,
    },
    /// Error message.
    Error { error_code: i32, message: String },
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
    fn operation_wraps_request() {
        let msg = ClientMessage::Operation(Request::LeaveRoom {
            will_come_back: true,
        });
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "Operation");
        assert_eq!(json["data"]["type"], "leave_room");
        assert_eq!(json["data"]["data"]["will_come_back"], true);
    }

    #[test]
    fn authenticate_omits_region_for_master() {
        let msg = ClientMessage::Authenticate {
            app_id: "app".into(),
            app_version: "1.0".into(),
            user_id: "u".into(),
            user_name: "U".into(),
            region: None,
            protocol: ConnectionProtocol::Wss,
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert!(json["data"].get("region").is_none());
        assert_eq!(json["data"]["protocol"], "wss");
    }
}
