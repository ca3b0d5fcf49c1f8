//! Coarse session states and the fold from transport-level states.
//!
//! The network client reports fine-grained [`NetworkState`]s as it walks the
//! directory → master → game server chain. Hosts only see the seven
//! [`ClientState`]s; [`ClientState::from`] is the total mapping between the two.

use std::fmt;

/// Coarse lifecycle state exposed to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ClientState {
    /// Not connected. Initial and terminal state.
    #[default]
    Disconnected,
    /// Walking the name server and master server towards the lobby.
    ConnectingToLobby,
    /// Connected to the master server and listed in the lobby.
    InLobby,
    /// Moving to a game server to enter a room.
    JoiningRoom,
    /// Joined to a room on a game server.
    InRoom,
    /// A leave request is in flight.
    LeavingRoom,
    /// A disconnect request is in flight.
    Disconnecting,
}

impl ClientState {
    /// Every coarse state, in lifecycle order.
    pub const ALL: [ClientState; 7] = [
        Self::Disconnected,
        Self::ConnectingToLobby,
        Self::InLobby,
        Self::JoiningRoom,
        Self::InRoom,
        Self::LeavingRoom,
        Self::Disconnecting,
    ];

    /// Returns the state name used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "Disconnected",
            Self::ConnectingToLobby => "ConnectingToLobby",
            Self::InLobby => "InLobby",
            Self::JoiningRoom => "JoiningRoom",
            Self::InRoom => "InRoom",
            Self::LeavingRoom => "LeavingRoom",
            Self::Disconnecting => "Disconnecting",
        }
    }

    /// Whether a room mirror may exist in this state.
    pub(crate) fn holds_room(self) -> bool {
        matches!(self, Self::JoiningRoom | Self::InRoom | Self::LeavingRoom)
    }
}

impl fmt::Display for ClientState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Low-level connection state reported by the network client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NetworkState {
    Uninitialized,
    Error,
    Disconnected,
    ConnectingToNameServer,
    ConnectedToNameServer,
    ConnectingToMasterServer,
    ConnectedToMaster,
    JoinedLobby,
    ConnectingToGameServer,
    ConnectedToGameServer,
    Joined,
    Disconnecting,
}

impl NetworkState {
    /// Every low-level state.
    pub const ALL: [NetworkState; 12] = [
        Self::Uninitialized,
        Self::Error,
        Self::Disconnected,
        Self::ConnectingToNameServer,
        Self::ConnectedToNameServer,
        Self::ConnectingToMasterServer,
        Self::ConnectedToMaster,
        Self::JoinedLobby,
        Self::ConnectingToGameServer,
        Self::ConnectedToGameServer,
        Self::Joined,
        Self::Disconnecting,
    ];
}

impl From<NetworkState> for ClientState {
    fn from(state: NetworkState) -> Self {
        match state {
            NetworkState::Uninitialized | NetworkState::Error | NetworkState::Disconnected => {
                Self::Disconnected
            }
            NetworkState::ConnectingToNameServer
            | NetworkState::ConnectedToNameServer
            | NetworkState::ConnectingToMasterServer
            | NetworkState::ConnectedToMaster => Self::ConnectingToLobby,
            NetworkState::JoinedLobby => Self::InLobby,
            NetworkState::ConnectingToGameServer | NetworkState::ConnectedToGameServer => {
                Self::JoiningRoom
            }
            NetworkState::Joined => Self::InRoom,
            NetworkState::Disconnecting => Self::Disconnecting,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn fold_covers_every_network_state() {
        let expected = [
            (NetworkState::Uninitialized, ClientState::Disconnected),
            (NetworkState::Error, ClientState::Disconnected),
            (NetworkState::Disconnected, ClientState::Disconnected),
            (NetworkState::ConnectingToNameServer, ClientState::ConnectingToLobby),
            (NetworkState::ConnectedToNameServer, ClientState::ConnectingToLobby),
            (NetworkState::ConnectingToMasterServer, ClientState::ConnectingToLobby),
            (NetworkState::ConnectedToMaster, ClientState::ConnectingToLobby),
            (NetworkState::JoinedLobby, ClientState::InLobby),
            (NetworkState::ConnectingToGameServer, ClientState::JoiningRoom),
            (NetworkState::ConnectedToGameServer, ClientState::JoiningRoom),
            (NetworkState::Joined, ClientState::InRoom),
            (NetworkState::Disconnecting, ClientState::Disconnecting),
        ];
        assert_eq!(expected.len(), NetworkState::ALL.len());
        for state in NetworkState::ALL {
            let (_, coarse) = expected
                .iter()
                .find(|(low, _)| *low == state)
                .expect("every network state has an expectation");
            assert_eq!(ClientState::from(state), *coarse, "{state:?}");
        }
    }

    #[test]
    fn only_lobby_and_room_states_are_reachable_from_connected_states() {
        let reached: Vec<ClientState> = NetworkState::ALL
            .iter()
            .map(|s| ClientState::from(*s))
            .collect();
        for coarse in ClientState::ALL {
            if matches!(coarse, ClientState::LeavingRoom) {
                // LeavingRoom is only entered locally by `leave_room`.
                assert!(!reached.contains(&coarse));
            } else {
                assert!(reached.contains(&coarse), "{coarse} is never produced");
            }
        }
    }

    #[test]
    fn display_uses_state_names() {
        assert_eq!(ClientState::InLobby.to_string(), "InLobby");
        assert_eq!(ClientState::default(), ClientState::Disconnected);
    }
}
