#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing
)]
//! Shared test utilities for the lobby client integration tests.
//!
//! Provides a recording [`MockNetwork`], a [`RecordingListener`] that logs
//! every callback, and a scripted relay backend ([`FakeConnector`]) that
//! answers client messages per server address.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use relay_lobby_client::{
    ActorId, ActorInfo, AppStats, ClientMessage, ClientState, Connector, EventSink, LobbyConfig,
    LobbyError, NetworkClient, NetworkEvent, NetworkState, OperationResult, PropertyChanges,
    Registry, Request, ResponseKind, RoomSnapshot, RoomSummary, ServerMessage, Session,
    SessionListener, Transport,
};

// ── MockNetwork ─────────────────────────────────────────────────────

/// Records every request and hands the test the session's sink.
#[derive(Default)]
pub struct MockNetwork {
    pub sink: Option<EventSink>,
    pub sent: Vec<Request>,
    /// When set, every `send` is refused with this reason.
    pub reject: Option<String>,
    pub shutdowns: Arc<AtomicUsize>,
}

impl MockNetwork {
    pub fn rejecting(reason: &str) -> Self {
        Self {
            reject: Some(reason.to_string()),
            ..Self::default()
        }
    }
}

impl NetworkClient for MockNetwork {
    fn init(&mut self, _config: &LobbyConfig, sink: EventSink) {
        self.sink = Some(sink);
    }

    fn send(&mut self, request: Request) -> Result<(), LobbyError> {
        if let Some(reason) = &self.reject {
            return Err(LobbyError::Rejected(reason.clone()));
        }
        self.sent.push(request);
        Ok(())
    }

    fn shutdown(&mut self) {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn new_session() -> Session<MockNetwork> {
    Session::init(LobbyConfig::new("test-app", "1.0"), MockNetwork::default())
}

/// Push events as if the network client reported them.
pub fn push(session: &Session<MockNetwork>, events: impl IntoIterator<Item = NetworkEvent>) {
    let sink = session.network().sink.clone().unwrap();
    for event in events {
        assert!(sink.push(event));
    }
}

// ── RecordingListener ───────────────────────────────────────────────

/// One delivered listener callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Callback {
    Result(OperationResult),
    State(ClientState),
    Stats(AppStats),
    ActorJoined { actor_id: ActorId, is_local: bool },
    ActorLeft { actor_id: ActorId, was_suspended: bool },
    Custom { actor_id: ActorId, code: u8, payload: Vec<u8> },
    RoomList(Vec<String>),
    RoomProperties(Vec<(String, String)>),
    PlayerProperties(ActorId),
    HostChanged { new: ActorId, old: Option<ActorId> },
}

#[derive(Debug, Default)]
pub struct RecordingListener {
    pub calls: Vec<Callback>,
}

impl RecordingListener {
    pub fn take(&mut self) -> Vec<Callback> {
        std::mem::take(&mut self.calls)
    }

    pub fn results(&self) -> Vec<&OperationResult> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Callback::Result(r) => Some(r),
                _ => None,
            })
            .collect()
    }

    pub fn states(&self) -> Vec<ClientState> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Callback::State(s) => Some(*s),
                _ => None,
            })
            .collect()
    }
}

impl SessionListener for RecordingListener {
    fn on_operation_result(&mut self, result: &OperationResult) {
        self.calls.push(Callback::Result(result.clone()));
    }

    fn on_state_changed(&mut self, state: ClientState) {
        self.calls.push(Callback::State(state));
    }

    fn on_stats_changed(&mut self, stats: AppStats) {
        self.calls.push(Callback::Stats(stats));
    }

    fn on_actor_joined(&mut self, _registry: &Registry, actor_id: ActorId, is_local: bool) {
        self.calls.push(Callback::ActorJoined { actor_id, is_local });
    }

    fn on_actor_left(&mut self, _registry: &Registry, actor_id: ActorId, was_suspended: bool) {
        self.calls.push(Callback::ActorLeft {
            actor_id,
            was_suspended,
        });
    }

    fn on_custom_event(&mut self, actor_id: ActorId, event_code: u8, payload: &[u8]) {
        self.calls.push(Callback::Custom {
            actor_id,
            code: event_code,
            payload: payload.to_vec(),
        });
    }

    fn on_room_list_changed(&mut self, rooms: &[RoomSummary]) {
        self.calls
            .push(Callback::RoomList(rooms.iter().map(|r| r.name.clone()).collect()));
    }

    fn on_room_properties_changed(&mut self, _registry: &Registry, changes: &mut PropertyChanges) {
        let mut drained = Vec::new();
        while let Some(change) = changes.pop() {
            drained.push(change);
        }
        self.calls.push(Callback::RoomProperties(drained));
    }

    fn on_player_properties_changed(&mut self, _registry: &Registry, actor_id: ActorId) {
        self.calls.push(Callback::PlayerProperties(actor_id));
    }

    fn on_host_changed(&mut self, new: ActorId, old: Option<ActorId>) {
        self.calls.push(Callback::HostChanged { new, old });
    }
}

// ── Builders ────────────────────────────────────────────────────────

pub fn actor(id: ActorId, name: &str) -> ActorInfo {
    ActorInfo {
        id,
        name: name.to_string(),
        user_id: format!("{name}-id"),
        properties: Default::default(),
    }
}

/// A room named `name` holding `actors`, seen from `local`.
pub fn snapshot(name: &str, master: ActorId, local: ActorId, actors: &[ActorId]) -> RoomSnapshot {
    RoomSnapshot {
        name: name.to_string(),
        max_players: 4,
        open: true,
        visible: true,
        master_actor_id: master,
        local_actor_id: local,
        properties: Default::default(),
        lobby_keys: Vec::new(),
        actors: actors
            .iter()
            .map(|&id| actor(id, &format!("player{id}")))
            .collect(),
    }
}

pub fn summary(name: &str, player_count: u8) -> RoomSummary {
    RoomSummary {
        name: name.to_string(),
        max_players: 4,
        player_count,
        open: true,
        properties: Default::default(),
    }
}

pub fn response(kind: ResponseKind, error_code: i32) -> NetworkEvent {
    NetworkEvent::OperationResponse {
        kind,
        error_code,
        error_message: if error_code == 0 {
            String::new()
        } else {
            format!("error {error_code}")
        },
        actor_id: None,
        room: None,
    }
}

pub fn joined(kind: ResponseKind, room: RoomSnapshot) -> NetworkEvent {
    NetworkEvent::OperationResponse {
        kind,
        error_code: 0,
        error_message: String::new(),
        actor_id: Some(room.local_actor_id),
        room: Some(Box::new(room)),
    }
}

/// Connect and reach the lobby, discarding the callbacks.
pub fn reach_lobby(session: &mut Session<MockNetwork>, listener: &mut RecordingListener) {
    session.connect("alice", "eu").unwrap();
    push(
        session,
        [
            NetworkEvent::StateChanged(NetworkState::ConnectingToNameServer),
            NetworkEvent::StateChanged(NetworkState::ConnectedToMaster),
            NetworkEvent::StateChanged(NetworkState::JoinedLobby),
        ],
    );
    session.service(listener);
    assert_eq!(session.state(), ClientState::InLobby);
    listener.take();
}

/// From the lobby, join `room` and reach `InRoom`, discarding the callbacks.
pub fn reach_room(
    session: &mut Session<MockNetwork>,
    listener: &mut RecordingListener,
    room: RoomSnapshot,
) {
    reach_lobby(session, listener);
    session.join_room(room.name.clone(), false).unwrap();
    push(
        session,
        [
            NetworkEvent::StateChanged(NetworkState::ConnectingToGameServer),
            joined(ResponseKind::JoinRoom, room),
            NetworkEvent::StateChanged(NetworkState::Joined),
        ],
    );
    session.service(listener);
    assert_eq!(session.state(), ClientState::InRoom);
    listener.take();
}

// ── Fake relay backend ──────────────────────────────────────────────

/// Computes the replies of the server at `address` to one client message.
pub type Responder = Arc<dyn Fn(&str, &ClientMessage) -> Vec<ServerMessage> + Send + Sync>;

/// Log of `(address, message)` pairs received by the fake backend.
pub type MessageLog = Arc<StdMutex<Vec<(String, ClientMessage)>>>;

/// A [`Connector`] whose servers answer through a [`Responder`].
pub struct FakeConnector {
    responder: Responder,
    refused: Vec<String>,
    pub log: MessageLog,
    pub connections: Arc<StdMutex<Vec<String>>>,
}

impl FakeConnector {
    pub fn new(responder: Responder) -> Self {
        Self {
            responder,
            refused: Vec::new(),
            log: Arc::new(StdMutex::new(Vec::new())),
            connections: Arc::new(StdMutex::new(Vec::new())),
        }
    }

    /// Refuse connections to `address`.
    pub fn refusing(mut self, address: &str) -> Self {
        self.refused.push(address.to_string());
        self
    }
}

#[async_trait]
impl Connector for FakeConnector {
    async fn connect(&self, address: &str) -> Result<Box<dyn Transport>, LobbyError> {
        if self.refused.iter().any(|a| a == address) {
            return Err(LobbyError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                format!("{address} refused"),
            )));
        }
        self.connections.lock().unwrap().push(address.to_string());
        Ok(Box::new(FakeServerConnection {
            address: address.to_string(),
            responder: Arc::clone(&self.responder),
            inbox: VecDeque::new(),
            log: Arc::clone(&self.log),
        }))
    }
}

/// One connection to a fake server. Replies are queued as soon as a client
/// message is sent and handed out by `recv`.
struct FakeServerConnection {
    address: String,
    responder: Responder,
    inbox: VecDeque<String>,
    log: MessageLog,
}

#[async_trait]
impl Transport for FakeServerConnection {
    async fn send(&mut self, message: String) -> Result<(), LobbyError> {
        let msg: ClientMessage = serde_json::from_str(&message)?;
        for reply in (self.responder)(&self.address, &msg) {
            self.inbox.push_back(serde_json::to_string(&reply)?);
        }
        self.log.lock().unwrap().push((self.address.clone(), msg));
        Ok(())
    }

    async fn recv(&mut self) -> Option<Result<String, LobbyError>> {
        match self.inbox.pop_front() {
            Some(message) => Some(Ok(message)),
            None => std::future::pending().await,
        }
    }

    async fn close(&mut self) -> Result<(), LobbyError> {
        Ok(())
    }
}
