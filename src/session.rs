//! The poll-driven session: guarded host calls, the service tick and host
//! migration detection.
//!
//! [`Session`] owns its [`NetworkClient`] and the receiving end of the event
//! queue. Host calls return immediately; everything the backend reports is
//! turned into [`SessionListener`] callbacks from inside [`Session::service`].
//!
//! # Example
//!
//! ```rust,ignore
//! let mut session = Session::init(LobbyConfig::new("app", "1.0"), network);
//! session.connect("player-1", "eu")?;
//!
//! loop {
//!     session.service(&mut listener);
//!     if session.is_in_lobby() {
//!         session.join_random_room(4, MatchmakingMode::FillOldestRoom, None)?;
//!     }
//!     // render a frame…
//! }
//! ```

use std::time::Duration;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{LobbyConfig, MIN_PING_INTERVAL};
use crate::error::{LobbyError, Result};
use crate::event::{EventQueue, NetworkEvent, Queued};
use crate::listener::SessionListener;
use crate::network::{NetworkClient, Request};
use crate::operation::{Completion, Operation, OperationResult, PendingOperation, ResponseKind};
use crate::options::{
    validate_event_code, InterestGroups, MatchmakingMode, MultiplayerEvent, RoomCreateOption,
};
use crate::room::{
    Actor, ActorEntry, ActorId, AppStats, PropertyChanges, PropertyMap, Registry, Room,
    RoomSummary,
};
use crate::state::ClientState;

/// Build a user id from a display name and a random suffix.
pub fn generate_user_id(user_name: &str) -> String {
    format!("{user_name}-{}", Uuid::new_v4().simple())
}

/// A client session against the matchmaking backend.
///
/// Only one session should drive a given network client. Replacing the
/// session with [`reinit`](Self::reinit) discards the pending operation and
/// every undelivered event of the old one.
pub struct Session<N: NetworkClient> {
    config: LobbyConfig,
    network: N,
    queue: EventQueue,
    state: ClientState,
    /// Last state reported through `on_state_changed`.
    notified_state: ClientState,
    pending: PendingOperation,
    registry: Registry,
    region: String,
    user_id: String,
    user_name: String,
    remembered_master: Option<ActorId>,
    /// Set once `network.shutdown()` has run.
    shut_down: bool,
}

impl<N: NetworkClient> Session<N> {
    /// Create a session and attach `network` to its event queue.
    pub fn init(config: LobbyConfig, mut network: N) -> Self {
        let queue = EventQueue::new();
        network.init(&config, queue.sink());
        debug!(
            app_id = %config.app_id,
            app_version = %config.app_version,
            protocol = ?config.protocol,
            "session initialized"
        );
        Self {
            config,
            network,
            queue,
            state: ClientState::Disconnected,
            notified_state: ClientState::Disconnected,
            pending: PendingOperation::new(),
            registry: Registry::default(),
            region: String::new(),
            user_id: String::new(),
            user_name: String::new(),
            remembered_master: None,
            shut_down: false,
        }
    }

    /// Tear this session down and start over with a new network client.
    ///
    /// The old client is shut down first. No callback is ever produced for
    /// its pending operation or its queued events.
    pub fn reinit(&mut self, config: LobbyConfig, network: N) {
        if let Some(op) = self.pending.current() {
            debug!(%op, "re-initializing, abandoning pending operation");
        }
        self.shut_down_network();
        *self = Self::init(config, network);
    }

    // ── Correlated operations ───────────────────────────────────────

    /// Connect through the name server to the lobby of `region`.
    ///
    /// # Errors
    ///
    /// [`LobbyError::MissingRegion`] for an empty region,
    /// [`LobbyError::OperationPending`] while another operation is
    /// outstanding, or the network client's refusal.
    pub fn connect(&mut self, user_id: impl Into<String>, region: impl Into<String>) -> Result<()> {
        let user_id = user_id.into();
        let region = region.into();
        if region.is_empty() {
            return Err(LobbyError::MissingRegion);
        }
        let user_name = if self.user_name.is_empty() {
            user_id.clone()
        } else {
            self.user_name.clone()
        };
        self.issue(
            Operation::Connect,
            Request::Connect {
                user_id: user_id.clone(),
                user_name,
                region: region.clone(),
            },
        )?;
        info!(%user_id, %region, "connecting");
        self.user_id = user_id;
        self.region = region;
        self.enter(ClientState::ConnectingToLobby);
        Ok(())
    }

    /// Return to the master server, e.g. after the game server dropped.
    ///
    /// # Errors
    ///
    /// [`LobbyError::OperationPending`] or the network client's refusal.
    pub fn reconnect_to_master(&mut self) -> Result<()> {
        self.issue(Operation::Reconnect, Request::ReconnectToMaster)?;
        self.enter(ClientState::ConnectingToLobby);
        Ok(())
    }

    /// Close the connection. Completion is reported as a
    /// [`Operation::Disconnect`] result.
    ///
    /// # Errors
    ///
    /// [`LobbyError::OperationPending`] or the network client's refusal.
    pub fn disconnect(&mut self) -> Result<()> {
        self.issue(Operation::Disconnect, Request::Disconnect)?;
        self.enter(ClientState::Disconnecting);
        Ok(())
    }

    /// Join any open room matching `filter`.
    ///
    /// # Errors
    ///
    /// [`LobbyError::OperationPending`] or the network client's refusal.
    pub fn join_random_room(
        &mut self,
        max_players: u8,
        mode: MatchmakingMode,
        filter: Option<&PropertyMap>,
    ) -> Result<()> {
        self.issue(
            Operation::JoinRandomRoom,
            Request::JoinRandomRoom {
                max_players,
                mode,
                filter: filter.cloned().unwrap_or_default(),
            },
        )
    }

    /// Join any open room matching `filter`, or create `room_name` if none
    /// matches.
    ///
    /// # Errors
    ///
    /// [`LobbyError::OperationPending`] or the network client's refusal.
    pub fn join_random_or_create_room(
        &mut self,
        room_name: impl Into<String>,
        options: Option<&RoomCreateOption>,
        max_players: u8,
        mode: MatchmakingMode,
        filter: Option<&PropertyMap>,
    ) -> Result<()> {
        self.issue(
            Operation::JoinRandomOrCreateRoom,
            Request::JoinRandomOrCreateRoom {
                room_name: room_name.into(),
                options: options.cloned().unwrap_or_default(),
                max_players,
                mode,
                filter: filter.cloned().unwrap_or_default(),
            },
        )
    }

    /// Join a room by name. With `rejoin`, reclaim a suspended slot.
    ///
    /// # Errors
    ///
    /// [`LobbyError::OperationPending`] or the network client's refusal.
    pub fn join_room(&mut self, room_name: impl Into<String>, rejoin: bool) -> Result<()> {
        self.issue(
            Operation::JoinRoom,
            Request::JoinRoom {
                room_name: room_name.into(),
                rejoin,
            },
        )
    }

    /// Create `room_name`, or with `join` join it if it already exists.
    ///
    /// # Errors
    ///
    /// [`LobbyError::OperationPending`] or the network client's refusal.
    pub fn create_or_join_room(
        &mut self,
        join: bool,
        room_name: impl Into<String>,
        options: Option<&RoomCreateOption>,
    ) -> Result<()> {
        let room_name = room_name.into();
        let options = options.cloned().unwrap_or_default();
        if join {
            self.issue(
                Operation::JoinOrCreateRoom,
                Request::JoinOrCreateRoom { room_name, options },
            )
        } else {
            self.issue(
                Operation::CreateRoom,
                Request::CreateRoom { room_name, options },
            )
        }
    }

    /// Leave the current room. With `will_come_back` the slot is kept for a
    /// later rejoin.
    ///
    /// # Errors
    ///
    /// [`LobbyError::NotInRoom`], [`LobbyError::OperationPending`] or the
    /// network client's refusal.
    pub fn leave_room(&mut self, will_come_back: bool) -> Result<()> {
        if !self.is_joined_to_room() {
            return Err(LobbyError::NotInRoom);
        }
        self.issue(Operation::LeaveRoom, Request::LeaveRoom { will_come_back })?;
        self.enter(ClientState::LeavingRoom);
        Ok(())
    }

    fn issue(&mut self, op: Operation, request: Request) -> Result<()> {
        let network = &mut self.network;
        let result = self.pending.try_begin(op, || network.send(request));
        match &result {
            Ok(()) => debug!(%op, "operation issued"),
            Err(e) => debug!(%op, "operation refused: {e}"),
        }
        result
    }

    /// Apply a locally decided state now and announce it in queue order.
    fn enter(&mut self, state: ClientState) {
        self.apply_state(state);
        self.queue.push_local(state);
    }

    fn apply_state(&mut self, next: ClientState) {
        let prev = std::mem::replace(&mut self.state, next);
        if next == ClientState::Disconnected {
            self.registry.clear();
            self.remembered_master = None;
        } else if prev.holds_room() && !next.holds_room() {
            if self.registry.destroy_room() {
                debug!(from = %prev, to = %next, "room mirror dropped");
            }
            self.remembered_master = None;
        }
    }

    // ── Service tick ────────────────────────────────────────────────

    /// Deliver everything queued since the last tick, then check for host
    /// migration.
    ///
    /// Events queued while this call runs are delivered by the next one.
    pub fn service<L: SessionListener + ?Sized>(&mut self, listener: &mut L) {
        for item in self.queue.snapshot() {
            match item {
                Queued::Local(state) => self.transition(state, listener),
                Queued::Network(event) => self.dispatch(event, listener),
            }
        }
        self.check_host_migration(listener);
    }

    fn dispatch<L: SessionListener + ?Sized>(&mut self, event: NetworkEvent, listener: &mut L) {
        if self.config.verbose {
            debug!(?event, "dispatching");
        }
        match event {
            NetworkEvent::StateChanged(state) => self.transition(ClientState::from(state), listener),
            NetworkEvent::OperationResponse {
                kind,
                error_code,
                error_message,
                actor_id,
                room,
            } => {
                let Some(op) = self.pending.complete_if(kind) else {
                    debug!(
                        ?kind,
                        pending = ?self.pending.current(),
                        "dropping stale response"
                    );
                    return;
                };
                if error_code == 0 {
                    if kind.enters_room() {
                        if let Some(snapshot) = room {
                            let room = self.registry.install(*snapshot);
                            debug!(room = %room.name, actors = room.player_count(), "room mirror installed");
                            self.remembered_master = Some(room.master_actor_id);
                        }
                    } else if kind == ResponseKind::LeaveRoom {
                        self.registry.destroy_room();
                        self.remembered_master = None;
                    }
                }
                Self::report(
                    listener,
                    Completion::Operation(op),
                    error_code,
                    error_message,
                    actor_id,
                );
            }
            NetworkEvent::ConnectionError {
                error_code,
                error_message,
            } => {
                let abandoned = self.pending.clear();
                warn!(error_code, %error_message, ?abandoned, "connection error");
                Self::report(
                    listener,
                    Completion::ConnectionError { abandoned },
                    error_code,
                    error_message,
                    None,
                );
            }
            NetworkEvent::Disconnected => {
                self.transition(ClientState::Disconnected, listener);
                match self.pending.current() {
                    None | Some(Operation::Disconnect) => {
                        self.pending.clear();
                        Self::report(
                            listener,
                            Completion::Operation(Operation::Disconnect),
                            0,
                            String::new(),
                            None,
                        );
                    }
                    Some(op) => debug!(%op, "dropping disconnect confirmation"),
                }
            }
            NetworkEvent::AppStats(stats) => {
                self.registry.set_stats(stats);
                listener.on_stats_changed(stats);
            }
            NetworkEvent::ActorJoined { actor, is_local } => {
                let actor_id = actor.id;
                self.registry.add_actor(actor);
                if self.remembered_master.is_none() {
                    self.remembered_master = self.registry.master_actor_id();
                }
                listener.on_actor_joined(&self.registry, actor_id, is_local);
            }
            NetworkEvent::ActorLeft { actor_id, cleanup } => {
                self.registry.remove_actor(actor_id);
                if cleanup {
                    debug!(actor_id, "actor cleaned up");
                } else {
                    listener.on_actor_left(&self.registry, actor_id, false);
                }
            }
            NetworkEvent::ActorSuspended { actor_id } => {
                self.registry.suspend_actor(actor_id);
                listener.on_actor_left(&self.registry, actor_id, true);
            }
            NetworkEvent::CustomEvent {
                actor_id,
                event_code,
                payload,
            } => listener.on_custom_event(actor_id, event_code, &payload),
            NetworkEvent::RoomList(rooms) => {
                self.registry.replace_room_list(rooms);
                listener.on_room_list_changed(self.registry.room_list());
            }
            NetworkEvent::RoomPropertiesChanged(changes) => {
                self.registry.merge_room_properties(&changes);
                let mut changes = PropertyChanges::from(changes);
                listener.on_room_properties_changed(&self.registry, &mut changes);
            }
            NetworkEvent::ActorPropertiesChanged { actor_id, changes } => {
                self.registry.merge_actor_properties(actor_id, &changes);
                listener.on_player_properties_changed(&self.registry, actor_id);
            }
            NetworkEvent::MasterChanged(actor_id) => self.registry.set_master(actor_id),
        }
    }

    fn transition<L: SessionListener + ?Sized>(&mut self, next: ClientState, listener: &mut L) {
        self.apply_state(next);
        if next != self.notified_state {
            debug!(from = %self.notified_state, to = %next, "state changed");
            self.notified_state = next;
            listener.on_state_changed(next);
        }
        let reached = match next {
            ClientState::InLobby => Some((ResponseKind::LobbyReached, None)),
            ClientState::InRoom => Some((
                ResponseKind::RoomRejoined,
                self.registry.room().map(|r| r.local_actor_id),
            )),
            _ => None,
        };
        if let Some((kind, actor_id)) = reached {
            if let Some(op) = self.pending.complete_if(kind) {
                Self::report(listener, Completion::Operation(op), 0, String::new(), actor_id);
            }
        }
    }

    fn report<L: SessionListener + ?Sized>(
        listener: &mut L,
        completion: Completion,
        error_code: i32,
        error_message: String,
        actor_id: Option<ActorId>,
    ) {
        listener.on_operation_result(&OperationResult {
            completion,
            error_code,
            error_message,
            actor_id,
        });
    }

    fn check_host_migration<L: SessionListener + ?Sized>(&mut self, listener: &mut L) {
        let Some(current) = self.registry.master_actor_id() else {
            return;
        };
        if self.remembered_master == Some(current) {
            return;
        }
        let old = self.remembered_master.replace(current);
        info!(new = current, old = ?old, "host changed");
        listener.on_host_changed(current, old);
    }

    // ── Room mutators ───────────────────────────────────────────────

    fn room_request(&mut self, request: Request) -> Result<()> {
        if !self.is_joined_to_room() {
            return Err(LobbyError::NotInRoom);
        }
        self.network.send(request)
    }

    /// Send a custom event to the room.
    ///
    /// # Errors
    ///
    /// [`LobbyError::InvalidEventCode`], [`LobbyError::InvalidInterestGroup`],
    /// [`LobbyError::NotInRoom`] or the network client's refusal.
    pub fn raise_event(&mut self, event: &MultiplayerEvent, payload: &[u8]) -> Result<()> {
        event.validate()?;
        self.room_request(Request::RaiseEvent {
            event: event.clone(),
            payload: payload.to_vec(),
        })
    }

    /// Drop cached copies of `event_code`. An empty `actors` slice removes
    /// every actor's copies.
    ///
    /// # Errors
    ///
    /// [`LobbyError::InvalidEventCode`], [`LobbyError::NotInRoom`] or the
    /// network client's refusal.
    pub fn remove_event_cache(&mut self, event_code: u8, actors: &[ActorId]) -> Result<()> {
        validate_event_code(event_code)?;
        self.room_request(Request::RemoveEventCache {
            event_code,
            actors: actors.to_vec(),
        })
    }

    /// # Errors
    ///
    /// [`LobbyError::InvalidInterestGroup`], [`LobbyError::NotInRoom`] or the
    /// network client's refusal.
    pub fn join_event_target_groups(&mut self, groups: &[u8]) -> Result<()> {
        let groups = InterestGroups::Only(groups.to_vec());
        groups.validate()?;
        self.room_request(Request::JoinGroups(groups))
    }

    /// # Errors
    ///
    /// [`LobbyError::NotInRoom`] or the network client's refusal.
    pub fn join_all_event_target_groups(&mut self) -> Result<()> {
        self.room_request(Request::JoinGroups(InterestGroups::All))
    }

    /// # Errors
    ///
    /// [`LobbyError::InvalidInterestGroup`], [`LobbyError::NotInRoom`] or the
    /// network client's refusal.
    pub fn leave_event_target_groups(&mut self, groups: &[u8]) -> Result<()> {
        let groups = InterestGroups::Only(groups.to_vec());
        groups.validate()?;
        self.room_request(Request::LeaveGroups(groups))
    }

    /// # Errors
    ///
    /// [`LobbyError::NotInRoom`] or the network client's refusal.
    pub fn leave_all_event_target_groups(&mut self) -> Result<()> {
        self.room_request(Request::LeaveGroups(InterestGroups::All))
    }

    /// Set one room property. An empty value removes it.
    ///
    /// The mirror is updated at once; the backend echo arrives later as a
    /// property change.
    ///
    /// # Errors
    ///
    /// [`LobbyError::NotInRoom`] or the network client's refusal.
    pub fn set_room_property(&mut self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        self.apply_room_properties(vec![(key.into(), value.into())])
    }

    /// # Errors
    ///
    /// [`LobbyError::NotInRoom`] or the network client's refusal.
    pub fn set_room_properties(&mut self, properties: &PropertyMap) -> Result<()> {
        self.apply_room_properties(
            properties
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }

    /// # Errors
    ///
    /// [`LobbyError::NotInRoom`] or the network client's refusal.
    pub fn remove_room_properties<I, S>(&mut self, keys: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.apply_room_properties(keys.into_iter().map(|k| (k.into(), String::new())).collect())
    }

    fn apply_room_properties(&mut self, changes: Vec<(String, String)>) -> Result<()> {
        self.room_request(Request::SetRoomProperties {
            changes: changes.clone(),
        })?;
        self.registry.merge_room_properties(&changes);
        Ok(())
    }

    /// Choose which room properties are listed in the lobby.
    ///
    /// # Errors
    ///
    /// [`LobbyError::NotInRoom`] or the network client's refusal.
    pub fn set_lobby_property_keys(&mut self, keys: Vec<String>) -> Result<()> {
        self.room_request(Request::SetLobbyPropertyKeys { keys: keys.clone() })?;
        if let Some(room) = self.registry.room_mut() {
            room.lobby_keys = keys;
        }
        Ok(())
    }

    /// # Errors
    ///
    /// [`LobbyError::NotInRoom`] or the network client's refusal.
    pub fn set_room_open(&mut self, open: bool) -> Result<()> {
        self.room_request(Request::SetRoomOpen { open })?;
        if let Some(room) = self.registry.room_mut() {
            room.open = open;
        }
        Ok(())
    }

    /// # Errors
    ///
    /// [`LobbyError::NotInRoom`] or the network client's refusal.
    pub fn set_room_visible(&mut self, visible: bool) -> Result<()> {
        self.room_request(Request::SetRoomVisible { visible })?;
        if let Some(room) = self.registry.room_mut() {
            room.visible = visible;
        }
        Ok(())
    }

    /// Ask the backend to make `actor_id` the master actor. The mirror
    /// changes when the backend confirms.
    ///
    /// # Errors
    ///
    /// [`LobbyError::NotInRoom`] or the network client's refusal.
    pub fn set_host(&mut self, actor_id: ActorId) -> Result<()> {
        self.room_request(Request::SetMaster { actor_id })
    }

    /// Set the display name. Inside a room it is also published to the
    /// other actors.
    ///
    /// # Errors
    ///
    /// The network client's refusal while in a room.
    pub fn set_user_name(&mut self, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        if self.is_joined_to_room() {
            self.network.send(Request::SetUserName { name: name.clone() })?;
            if let Some(room) = self.registry.room_mut() {
                let local = room.local_actor_id;
                room.rename_actor(local, &name);
            }
        }
        self.user_name = name;
        Ok(())
    }

    /// # Errors
    ///
    /// [`LobbyError::NotInRoom`] or the network client's refusal.
    pub fn set_local_actor_property(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<()> {
        self.apply_local_actor_properties(vec![(key.into(), value.into())])
    }

    /// # Errors
    ///
    /// [`LobbyError::NotInRoom`] or the network client's refusal.
    pub fn set_local_actor_properties(&mut self, properties: &PropertyMap) -> Result<()> {
        self.apply_local_actor_properties(
            properties
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }

    fn apply_local_actor_properties(&mut self, changes: Vec<(String, String)>) -> Result<()> {
        let actor_id = self.local_actor_id().ok_or(LobbyError::NotInRoom)?;
        self.room_request(Request::SetActorProperties {
            actor_id,
            changes: changes.clone(),
        })?;
        self.registry.merge_actor_properties(actor_id, &changes);
        Ok(())
    }

    /// Change the round-trip-time probe interval. Values below 1 ms are
    /// clamped to 1 ms.
    pub fn set_ping_interval(&mut self, interval: Duration) {
        self.config.ping_interval = interval.max(MIN_PING_INTERVAL);
        self.network.set_ping_interval(self.config.ping_interval);
    }

    // ── Queries ─────────────────────────────────────────────────────

    pub fn state(&self) -> ClientState {
        self.state
    }

    pub fn is_in_lobby(&self) -> bool {
        self.state == ClientState::InLobby
    }

    pub fn is_joined_to_room(&self) -> bool {
        self.state == ClientState::InRoom
    }

    /// `true` in every state but [`ClientState::Disconnected`].
    pub fn is_active(&self) -> bool {
        self.state != ClientState::Disconnected
    }

    pub fn pending_operation(&self) -> Option<Operation> {
        self.pending.current()
    }

    pub fn config(&self) -> &LobbyConfig {
        &self.config
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    pub fn server_time_ms(&self) -> i64 {
        self.network.server_time_ms()
    }

    pub fn round_trip_time_ms(&self) -> u32 {
        self.network.round_trip_time_ms()
    }

    /// Master actor of the mirrored room.
    pub fn master_actor_id(&self) -> Option<ActorId> {
        self.registry.master_actor_id()
    }

    pub fn room(&self) -> Option<&Room> {
        self.registry.room()
    }

    pub fn room_list(&self) -> &[RoomSummary] {
        self.registry.room_list()
    }

    pub fn room_names(&self) -> Vec<String> {
        self.registry
            .room_list()
            .iter()
            .map(|r| r.name.clone())
            .collect()
    }

    /// Actors of the mirrored room in ascending id order.
    pub fn actors(&self) -> Vec<ActorEntry> {
        self.registry.room().map(Room::entries).unwrap_or_default()
    }

    pub fn actor(&self, actor_id: ActorId) -> Option<&Actor> {
        self.registry.actor(actor_id)
    }

    pub fn user_name_of(&self, actor_id: ActorId) -> Option<&str> {
        self.actor(actor_id).map(|a| a.name.as_str())
    }

    pub fn user_id_of(&self, actor_id: ActorId) -> Option<&str> {
        self.actor(actor_id).map(|a| a.user_id.as_str())
    }

    pub fn local_actor(&self) -> Option<&Actor> {
        self.registry.room().and_then(Room::local_actor)
    }

    pub fn local_actor_id(&self) -> Option<ActorId> {
        self.registry.room().map(|r| r.local_actor_id)
    }

    /// `true` if the local actor is the room's master actor.
    pub fn is_host(&self) -> bool {
        self.registry
            .room()
            .is_some_and(|r| r.local_actor_id == r.master_actor_id)
    }

    pub fn stats(&self) -> AppStats {
        self.registry.stats()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn network(&self) -> &N {
        &self.network
    }

    pub fn network_mut(&mut self) -> &mut N {
        &mut self.network
    }
}

impl<N: NetworkClient> std::fmt::Debug for Session<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state)
            .field("pending", &self.pending.current())
            .field("region", &self.region)
            .field("user_id", &self.user_id)
            .field("room", &self.registry.room().map(|r| r.name.as_str()))
            .finish()
    }
}

impl<N: NetworkClient> Session<N> {
    fn shut_down_network(&mut self) {
        if !std::mem::replace(&mut self.shut_down, true) {
            self.network.shutdown();
        }
    }
}

impl<N: NetworkClient> Drop for Session<N> {
    fn drop(&mut self) {
        self.shut_down_network();
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
    use crate::event::EventSink;
    use crate::room::RoomSnapshot;
    use crate::state::NetworkState;

    /// Accepts everything and remembers the sink.
    #[derive(Default)]
    struct Loopback {
        sink: Option<EventSink>,
        sent: Vec<Request>,
    }

    impl NetworkClient for Loopback {
        fn init(&mut self, _config: &LobbyConfig, sink: EventSink) {
            self.sink = Some(sink);
        }

        fn send(&mut self, request: Request) -> Result<()> {
            self.sent.push(request);
            Ok(())
        }

        fn shutdown(&mut self) {}
    }

    fn session() -> Session<Loopback> {
        Session::init(LobbyConfig::new("app", "1.0"), Loopback::default())
    }

    fn push(session: &Session<Loopback>, event: NetworkEvent) {
        assert!(session.network().sink.as_ref().unwrap().push(event));
    }

    #[test]
    fn generated_user_ids_are_unique_and_prefixed() {
        let a = generate_user_id("alice");
        let b = generate_user_id("alice");
        assert!(a.starts_with("alice-"));
        assert_ne!(a, b);
    }

    #[test]
    fn local_transition_is_visible_before_service() {
        let mut s = session();
        s.connect("u1", "eu").unwrap();
        assert_eq!(s.network().sent.len(), 1);
        assert_eq!(s.state(), ClientState::ConnectingToLobby);
        assert!(s.is_active());
        assert_eq!(s.region(), "eu");
        assert_eq!(s.user_id(), "u1");
    }

    #[test]
    fn leaving_room_state_drops_mirror() {
        let mut s = session();
        s.apply_state(ClientState::InRoom);
        s.registry.install(RoomSnapshot {
            name: "r".into(),
            max_players: 2,
            open: true,
            visible: true,
            master_actor_id: 1,
            local_actor_id: 1,
            properties: PropertyMap::new(),
            lobby_keys: Vec::new(),
            actors: Vec::new(),
        });
        s.remembered_master = Some(1);

        s.apply_state(ClientState::LeavingRoom);
        assert!(s.room().is_some());

        s.apply_state(ClientState::ConnectingToLobby);
        assert!(s.room().is_none());
        assert_eq!(s.remembered_master, None);
    }

    #[test]
    fn service_with_unit_listener() {
        let mut s = session();
        push(&s, NetworkEvent::StateChanged(NetworkState::ConnectingToNameServer));
        s.service(&mut ());
        assert_eq!(s.state(), ClientState::ConnectingToLobby);
    }

    #[test]
    fn ping_interval_is_clamped() {
        let mut s = session();
        s.set_ping_interval(Duration::ZERO);
        assert_eq!(s.config().ping_interval, Duration::from_millis(1));
    }
}
