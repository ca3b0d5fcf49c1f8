//! A [`NetworkClient`] that speaks the JSON relay protocol over any
//! [`Connector`].
//!
//! [`RelayNetworkClient`] is a thin handle. A background task owns the one
//! live connection and walks it from the name server to the region's master
//! server and on to game servers, reporting every hop through the session's
//! [`EventSink`].
//!
//! # Example
//!
//! ```rust,ignore
//! let relay = RelayNetworkClient::new(
//!     WebSocketConnector::new(),
//!     RelayConfig::new("wss://ns.example.com"),
//! );
//! let mut session = Session::init(LobbyConfig::new("app", "1.0"), relay);
//! session.connect("player-1", "eu")?;
//! ```

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU32, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, oneshot};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::config::{ConnectionProtocol, LobbyConfig, MIN_PING_INTERVAL};
use crate::error::{LobbyError, Result};
use crate::error_codes::ErrorCode;
use crate::event::{EventSink, NetworkEvent};
use crate::network::{NetworkClient, Request};
use crate::operation::ResponseKind;
use crate::protocol::{ClientMessage, ServerMessage};
use crate::room::{ActorId, RoomSummary};
use crate::state::NetworkState;
use crate::transport::{Connector, Transport};

/// Default timeout for opening a connection to any server.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default timeout for the graceful shutdown.
const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

// ── Configuration ───────────────────────────────────────────────────

/// Configuration for a [`RelayNetworkClient`].
///
/// ```
/// use relay_lobby_client::relay::RelayConfig;
/// use std::time::Duration;
///
/// let config = RelayConfig::new("wss://ns.example.com")
///     .with_connect_timeout(Duration::from_secs(3))
///     .with_shutdown_timeout(Duration::from_millis(200));
/// assert_eq!(config.name_server_address, "wss://ns.example.com");
/// ```
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Address of the name server, handed to the [`Connector`].
    pub name_server_address: String,
    /// Timeout for opening each server connection.
    ///
    /// Defaults to **10 seconds**.
    pub connect_timeout: Duration,
    /// Timeout for [`RelayNetworkClient::close`].
    ///
    /// Defaults to **1 second**. A zero timeout aborts the background task
    /// immediately.
    pub shutdown_timeout: Duration,
}

impl RelayConfig {
    pub fn new(name_server_address: impl Into<String>) -> Self {
        Self {
            name_server_address: name_server_address.into(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }
}

// ── Shared state ────────────────────────────────────────────────────

/// Which server the background task is talking to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ServerRole {
    Idle = 0,
    /// Between servers.
    Connecting = 1,
    NameServer = 2,
    Master = 3,
    GameServer = 4,
}

impl ServerRole {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Connecting,
            2 => Self::NameServer,
            3 => Self::Master,
            4 => Self::GameServer,
            _ => Self::Idle,
        }
    }
}

/// State shared between the handle and the background task.
struct Shared {
    role: AtomicU8,
    knows_master: AtomicBool,
    rtt_ms: AtomicU32,
    /// Server clock minus local clock, once a pong has arrived.
    server_offset_ms: AtomicI64,
    has_server_time: AtomicBool,
    epoch: Instant,
}

impl Shared {
    fn new() -> Self {
        Self {
            role: AtomicU8::new(ServerRole::Idle as u8),
            knows_master: AtomicBool::new(false),
            rtt_ms: AtomicU32::new(0),
            server_offset_ms: AtomicI64::new(0),
            has_server_time: AtomicBool::new(false),
            epoch: Instant::now(),
        }
    }

    fn role(&self) -> ServerRole {
        ServerRole::from_u8(self.role.load(Ordering::Acquire))
    }

    fn set_role(&self, role: ServerRole) {
        self.role.store(role as u8, Ordering::Release);
    }

    fn local_ms(&self) -> u64 {
        u64::try_from(self.epoch.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    fn record_pong(&self, client_time_ms: u64, server_time_ms: i64) {
        let now = self.local_ms();
        let rtt = now.saturating_sub(client_time_ms);
        self.rtt_ms
            .store(u32::try_from(rtt).unwrap_or(u32::MAX), Ordering::Release);
        let now = i64::try_from(now).unwrap_or(i64::MAX);
        let half_rtt = i64::try_from(rtt / 2).unwrap_or(0);
        self.server_offset_ms.store(
            server_time_ms.saturating_add(half_rtt).saturating_sub(now),
            Ordering::Release,
        );
        self.has_server_time.store(true, Ordering::Release);
    }

    fn server_time_ms(&self) -> i64 {
        if !self.has_server_time.load(Ordering::Acquire) {
            return 0;
        }
        let now = i64::try_from(self.local_ms()).unwrap_or(i64::MAX);
        now.saturating_add(self.server_offset_ms.load(Ordering::Acquire))
    }
}

enum Command {
    Request(Request),
    PingInterval(Duration),
}

// ── Client handle ───────────────────────────────────────────────────

/// Relay protocol client. Requires a tokio runtime when
/// [`NetworkClient::init`] is called.
pub struct RelayNetworkClient {
    config: RelayConfig,
    connector: Arc<dyn Connector>,
    shared: Arc<Shared>,
    cmd_tx: Option<mpsc::UnboundedSender<Command>>,
    task: Option<tokio::task::JoinHandle<()>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl RelayNetworkClient {
    pub fn new(connector: impl Connector, config: RelayConfig) -> Self {
        Self {
            config,
            connector: Arc::new(connector),
            shared: Arc::new(Shared::new()),
            cmd_tx: None,
            task: None,
            shutdown_tx: None,
        }
    }

    /// The server the background task is currently attached to.
    pub fn role(&self) -> ServerRole {
        self.shared.role()
    }

    /// Returns `true` while the background task is running.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Close the connection and stop the background task.
    ///
    /// A final `Disconnected` is reported if a connection was open.
    pub async fn close(&mut self) {
        debug!("RelayNetworkClient: close requested");

        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        if let Some(mut task) = self.task.take() {
            match tokio::time::timeout(self.config.shutdown_timeout, &mut task).await {
                Ok(Ok(())) => {}
                Ok(Err(join_err)) => {
                    warn!("relay loop terminated with join error: {join_err}");
                }
                Err(_) => {
                    warn!("relay loop did not exit within timeout; aborting task");
                    task.abort();
                    if let Err(join_err) = task.await {
                        debug!("relay loop aborted: {join_err}");
                    }
                }
            }
        }

        self.cmd_tx = None;
        self.shared.set_role(ServerRole::Idle);
    }

    fn check_role(&self, request: &Request) -> Result<()> {
        let role = self.shared.role();
        let allowed = match request {
            Request::Connect { .. } => role == ServerRole::Idle,
            Request::ReconnectToMaster => {
                role == ServerRole::Idle && self.shared.knows_master.load(Ordering::Acquire)
            }
            Request::Disconnect => role != ServerRole::Idle,
            r if r.is_matchmaking() => role == ServerRole::Master,
            r if r.needs_room() => role == ServerRole::GameServer,
            _ => true,
        };
        if allowed {
            Ok(())
        } else {
            Err(LobbyError::Rejected(format!(
                "{} is not possible while {role:?}",
                request_name(request)
            )))
        }
    }
}

impl NetworkClient for RelayNetworkClient {
    fn init(&mut self, config: &LobbyConfig, sink: EventSink) {
        self.shutdown();

        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                error!("relay client needs a tokio runtime: {e}");
                return;
            }
        };

        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<Command>();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        self.shared = Arc::new(Shared::new());

        let relay = RelayLoop {
            connector: Arc::clone(&self.connector),
            shared: Arc::clone(&self.shared),
            sink,
            name_server_address: self.config.name_server_address.clone(),
            connect_timeout: self.config.connect_timeout,
            app_id: config.app_id.clone(),
            app_version: config.app_version.clone(),
            protocol: config.protocol,
            ping_interval: config.ping_interval,
            user_id: String::new(),
            user_name: String::new(),
            master_address: None,
            conn: None,
            role: ServerRole::Idle,
            pending_join: None,
            local_actor: None,
            rooms: Vec::new(),
        };

        self.task = Some(handle.spawn(relay.run(cmd_rx, shutdown_rx)));
        self.cmd_tx = Some(cmd_tx);
        self.shutdown_tx = Some(shutdown_tx);
    }

    fn send(&mut self, request: Request) -> Result<()> {
        let Some(cmd_tx) = self.cmd_tx.as_ref() else {
            return Err(LobbyError::Rejected("relay client is not running".into()));
        };
        self.check_role(&request)?;
        if matches!(request, Request::Connect { .. } | Request::ReconnectToMaster) {
            self.shared.set_role(ServerRole::Connecting);
        }
        cmd_tx
            .send(Command::Request(request))
            .map_err(|_| LobbyError::TransportClosed)
    }

    fn shutdown(&mut self) {
        self.cmd_tx = None;
        self.shutdown_tx = None;
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.shared.set_role(ServerRole::Idle);
    }

    fn set_ping_interval(&mut self, interval: Duration) {
        if let Some(cmd_tx) = self.cmd_tx.as_ref() {
            let _ = cmd_tx.send(Command::PingInterval(interval));
        }
    }

    fn server_time_ms(&self) -> i64 {
        self.shared.server_time_ms()
    }

    fn round_trip_time_ms(&self) -> u32 {
        self.shared.rtt_ms.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for RelayNetworkClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayNetworkClient")
            .field("name_server", &self.config.name_server_address)
            .field("role", &self.role())
            .field("has_task", &self.task.is_some())
            .finish()
    }
}

impl Drop for RelayNetworkClient {
    fn drop(&mut self) {
        // No executor to drive a graceful close from here.
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

fn request_name(request: &Request) -> &'static str {
    match request {
        Request::Connect { .. } => "connect",
        Request::ReconnectToMaster => "reconnect",
        Request::Disconnect => "disconnect",
        r if r.is_matchmaking() => "matchmaking",
        r if r.needs_room() => "room request",
        _ => "request",
    }
}

/// Apply an incremental room list change to the full list.
pub(crate) fn merge_room_list(
    rooms: &mut Vec<RoomSummary>,
    updated: Vec<RoomSummary>,
    removed: &[String],
) {
    rooms.retain(|r| !removed.contains(&r.name));
    for room in updated {
        match rooms.iter_mut().find(|r| r.name == room.name) {
            Some(existing) => *existing = room,
            None => rooms.push(room),
        }
    }
}

/// Ping timer; a zero period (the config field is unchecked) becomes 1 ms.
fn ping_timer(period: Duration) -> tokio::time::Interval {
    let mut timer = tokio::time::interval(period.max(MIN_PING_INTERVAL));
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    timer
}

// ── Relay loop ──────────────────────────────────────────────────────

struct RelayLoop {
    connector: Arc<dyn Connector>,
    shared: Arc<Shared>,
    sink: EventSink,
    name_server_address: String,
    connect_timeout: Duration,
    app_id: String,
    app_version: String,
    protocol: ConnectionProtocol,
    ping_interval: Duration,
    user_id: String,
    user_name: String,
    master_address: Option<String>,
    conn: Option<Box<dyn Transport>>,
    role: ServerRole,
    /// Matchmaking request to repeat once the game server accepts us.
    pending_join: Option<Request>,
    local_actor: Option<ActorId>,
    rooms: Vec<RoomSummary>,
}

async fn recv_from(conn: &mut Option<Box<dyn Transport>>) -> Option<Result<String>> {
    match conn {
        Some(transport) => transport.recv().await,
        None => std::future::pending().await,
    }
}

impl RelayLoop {
    /// Multiplexes host requests, server messages and pings via `tokio::select!`.
    ///
    /// Exits when the handle is dropped or closed.
    async fn run(
        mut self,
        mut cmd_rx: mpsc::UnboundedReceiver<Command>,
        mut shutdown_rx: oneshot::Receiver<()>,
    ) {
        debug!("relay loop started");
        let mut ping = ping_timer(self.ping_interval);

        loop {
            tokio::select! {
                cmd = cmd_rx.recv() => {
                    match cmd {
                        Some(Command::Request(request)) => self.handle_request(request).await,
                        Some(Command::PingInterval(interval)) => {
                            debug!(?interval, "ping interval changed");
                            ping = ping_timer(interval);
                        }
                        None => {
                            debug!("command channel closed, shutting down relay loop");
                            self.close_connection().await;
                            break;
                        }
                    }
                }

                _ = &mut shutdown_rx => {
                    debug!("shutdown signal received");
                    let was_connected = self.role != ServerRole::Idle;
                    self.close_connection().await;
                    self.set_role(ServerRole::Idle);
                    if was_connected {
                        self.push_state(NetworkState::Disconnected);
                        self.sink.push(NetworkEvent::Disconnected);
                    }
                    break;
                }

                incoming = recv_from(&mut self.conn) => {
                    match incoming {
                        Some(Ok(text)) => match serde_json::from_str::<ServerMessage>(&text) {
                            Ok(msg) => self.handle_message(msg).await,
                            Err(e) => warn!("failed to deserialize server message: {e} (raw: {text})"),
                        },
                        Some(Err(e)) => {
                            error!("transport receive error: {e}");
                            self.fail(ErrorCode::TransportClosed, format!("transport receive error: {e}")).await;
                        }
                        None => {
                            debug!("transport closed by server");
                            self.fail(ErrorCode::TransportClosed, "connection closed by server".into()).await;
                        }
                    }
                }

                _ = ping.tick(), if self.conn.is_some() => {
                    let client_time_ms = self.shared.local_ms();
                    self.send_message(ClientMessage::Ping { client_time_ms }).await;
                }
            }
        }

        debug!("relay loop exited");
    }

    async fn handle_request(&mut self, request: Request) {
        match request {
            Request::Connect {
                user_id,
                user_name,
                region,
            } => {
                self.user_id = user_id;
                self.user_name = user_name;
                self.set_role(ServerRole::Connecting);
                self.push_state(NetworkState::ConnectingToNameServer);
                let address = self.name_server_address.clone();
                if let Err(e) = self.open(&address).await {
                    self.fail(ErrorCode::ConnectFailed, format!("name server: {e}"))
                        .await;
                    return;
                }
                self.push_state(NetworkState::ConnectedToNameServer);
                self.set_role(ServerRole::NameServer);
                self.authenticate(Some(region)).await;
            }
            Request::ReconnectToMaster => match self.master_address.clone() {
                Some(address) => self.connect_to_master(address).await,
                None => {
                    self.fail(ErrorCode::ConnectFailed, "no master server known".into())
                        .await;
                }
            },
            Request::Disconnect => {
                self.push_state(NetworkState::Disconnecting);
                self.close_connection().await;
                self.set_role(ServerRole::Idle);
                self.push_state(NetworkState::Disconnected);
                self.sink.push(NetworkEvent::Disconnected);
            }
            other => {
                if other.is_matchmaking() {
                    self.pending_join = Some(other.clone());
                }
                if let Request::SetUserName { name } = &other {
                    self.user_name.clone_from(name);
                }
                self.send_message(ClientMessage::Operation(other)).await;
            }
        }
    }

    async fn handle_message(&mut self, msg: ServerMessage) {
        match msg {
            ServerMessage::MasterAddress { address } => {
                if self.role != ServerRole::NameServer {
                    warn!("unexpected master address while {:?}", self.role);
                    return;
                }
                self.close_connection().await;
                self.master_address = Some(address.clone());
                self.shared.knows_master.store(true, Ordering::Release);
                self.connect_to_master(address).await;
            }
            ServerMessage::Authenticated { .. } => match self.role {
                ServerRole::Master => self.send_message(ClientMessage::JoinLobby).await,
                ServerRole::GameServer => {
                    if let Some(join) = self.pending_join.clone() {
                        self.send_message(ClientMessage::Operation(join)).await;
                    }
                }
                role => debug!(?role, "authenticated"),
            },
            ServerMessage::LobbyJoined => {
                info!("joined lobby");
                self.push_state(NetworkState::JoinedLobby);
            }
            ServerMessage::AppStats(stats) => {
                self.sink.push(NetworkEvent::AppStats(stats));
            }
            ServerMessage::RoomList { rooms } => {
                self.rooms = rooms;
                self.sink.push(NetworkEvent::RoomList(self.rooms.clone()));
            }
            ServerMessage::RoomListUpdate { updated, removed } => {
                merge_room_list(&mut self.rooms, updated, &removed);
                self.sink.push(NetworkEvent::RoomList(self.rooms.clone()));
            }
            ServerMessage::OperationResponse {
                kind,
                error_code,
                error_message,
                actor_id,
                game_server,
                room,
            } => {
                if let (ServerRole::Master, Some(address), 0) = (self.role, &game_server, error_code) {
                    self.move_to_game_server(address.clone()).await;
                    return;
                }
                let success = error_code == 0;
                let on_game_server = self.role == ServerRole::GameServer;
                let entered = success && on_game_server && kind.enters_room();
                if entered {
                    self.local_actor = actor_id.or(room.as_ref().map(|r| r.local_actor_id));
                }
                if kind.enters_room() {
                    self.pending_join = None;
                }
                self.sink.push(NetworkEvent::OperationResponse {
                    kind,
                    error_code,
                    error_message,
                    actor_id,
                    room,
                });
                if entered {
                    self.push_state(NetworkState::Joined);
                } else if on_game_server && kind.enters_room() {
                    // Rejected by the game server: back to the lobby.
                    self.return_to_master().await;
                } else if on_game_server && success && kind == ResponseKind::LeaveRoom {
                    self.local_actor = None;
                    self.return_to_master().await;
                }
            }
            ServerMessage::ActorJoined { actor } => {
                let is_local = Some(actor.id) == self.local_actor;
                self.sink.push(NetworkEvent::ActorJoined { actor, is_local });
            }
            ServerMessage::ActorLeft {
                actor_id,
                inactive,
                cleanup,
            } => {
                let event = if inactive {
                    NetworkEvent::ActorSuspended { actor_id }
                } else {
                    NetworkEvent::ActorLeft { actor_id, cleanup }
                };
                self.sink.push(event);
            }
            ServerMessage::Event {
                actor_id,
                code,
                payload,
            } => {
                self.sink.push(NetworkEvent::CustomEvent {
                    actor_id,
                    event_code: code,
                    payload,
                });
            }
            ServerMessage::RoomPropertiesChanged { changes } => {
                self.sink.push(NetworkEvent::RoomPropertiesChanged(changes));
            }
            ServerMessage::ActorPropertiesChanged { actor_id, changes } => {
                self.sink
                    .push(NetworkEvent::ActorPropertiesChanged { actor_id, changes });
            }
            ServerMessage::MasterChanged { actor_id } => {
                self.sink.push(NetworkEvent::MasterChanged(actor_id));
            }
            ServerMessage::Pong {
                client_time_ms,
                server_time_ms,
            } => self.shared.record_pong(client_time_ms, server_time_ms),
            ServerMessage::Error {
                error_code,
                message,
            } => {
                warn!(error_code, %message, "server error");
                self.sink.push(NetworkEvent::ConnectionError {
                    error_code,
                    error_message: message,
                });
            }
        }
    }

    // ── Hops ────────────────────────────────────────────────────────

    async fn connect_to_master(&mut self, address: String) {
        self.set_role(ServerRole::Connecting);
        self.push_state(NetworkState::ConnectingToMasterServer);
        if let Err(e) = self.open(&address).await {
            self.fail(ErrorCode::ConnectFailed, format!("master server: {e}"))
                .await;
            return;
        }
        self.push_state(NetworkState::ConnectedToMaster);
        self.set_role(ServerRole::Master);
        self.authenticate(None).await;
    }

    async fn move_to_game_server(&mut self, address: String) {
        self.set_role(ServerRole::Connecting);
        self.push_state(NetworkState::ConnectingToGameServer);
        self.close_connection().await;
        if let Err(e) = self.open(&address).await {
            self.fail(ErrorCode::ConnectFailed, format!("game server: {e}"))
                .await;
            return;
        }
        self.push_state(NetworkState::ConnectedToGameServer);
        self.set_role(ServerRole::GameServer);
        self.authenticate(None).await;
    }

    async fn return_to_master(&mut self) {
        self.close_connection().await;
        match self.master_address.clone() {
            Some(address) => self.connect_to_master(address).await,
            None => {
                self.fail(ErrorCode::ConnectFailed, "no master server known".into())
                    .await;
            }
        }
    }

    // ── Connection helpers ──────────────────────────────────────────

    async fn open(&mut self, address: &str) -> Result<()> {
        debug!(%address, "opening connection");
        let transport = tokio::time::timeout(self.connect_timeout, self.connector.connect(address))
            .await
            .map_err(|_| LobbyError::Timeout)??;
        self.conn = Some(transport);
        Ok(())
    }

    async fn authenticate(&mut self, region: Option<String>) {
        let msg = ClientMessage::Authenticate {
            app_id: self.app_id.clone(),
            app_version: self.app_version.clone(),
            user_id: self.user_id.clone(),
            user_name: self.user_name.clone(),
            region,
            protocol: self.protocol,
        };
        self.send_message(msg).await;
    }

    async fn send_message(&mut self, msg: ClientMessage) {
        let json = match serde_json::to_string(&msg) {
            Ok(json) => json,
            Err(e) => {
                error!("failed to serialize ClientMessage: {e}");
                return;
            }
        };
        let Some(transport) = self.conn.as_mut() else {
            warn!("no connection, dropping outgoing message");
            return;
        };
        if let Err(e) = transport.send(json).await {
            error!("transport send error: {e}");
            self.fail(ErrorCode::TransportClosed, format!("transport send error: {e}"))
                .await;
        }
    }

    async fn close_connection(&mut self) {
        if let Some(mut transport) = self.conn.take() {
            if let Err(e) = transport.close().await {
                debug!("error while closing transport: {e}");
            }
        }
    }

    /// Drop the connection and report the failure.
    async fn fail(&mut self, code: ErrorCode, message: String) {
        warn!(code = code.code(), %message, "connection failed");
        self.close_connection().await;
        self.set_role(ServerRole::Idle);
        self.pending_join = None;
        self.local_actor = None;
        self.sink.push(NetworkEvent::ConnectionError {
            error_code: code.code(),
            error_message: message,
        });
        self.push_state(NetworkState::Disconnected);
        self.sink.push(NetworkEvent::Disconnected);
    }

    fn set_role(&mut self, role: ServerRole) {
        self.role = role;
        self.shared.set_role(role);
    }

    fn push_state(&self, state: NetworkState) {
        debug!(?state, "network state");
        self.sink.push(NetworkEvent::StateChanged(state));
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

    fn summary(name: &str, players: u8) -> RoomSummary {
        RoomSummary {
            name: name.into(),
            max_players: 4,
            player_count: players,
            open: true,
            properties: Default::default(),
        }
    }

    #[test]
    fn room_list_update_merges_into_full_list() {
        let mut rooms = vec![summary("a", 1), summary("b", 2)];
        merge_room_list(
            &mut rooms,
            vec![summary("b", 3), summary("c", 1)],
            &["a".to_string()],
        );
        assert_eq!(rooms, vec![summary("b", 3), summary("c", 1)]);
    }

    #[test]
    fn room_list_update_replaces_listed_properties() {
        let mut listed = summary("a", 1);
        listed.properties.insert("map".into(), "dust".into());
        listed.properties.insert("mode".into(), "ctf".into());
        let mut rooms = vec![listed];

        let mut update = summary("a", 2);
        update.properties.insert("map".into(), "mill".into());
        merge_room_list(&mut rooms, vec![update.clone()], &[]);

        assert_eq!(rooms, vec![update]);
        assert_eq!(rooms[0].properties.get("mode"), None);
    }

    #[test]
    fn role_survives_atomic_round_trip() {
        let shared = Shared::new();
        for role in [
            ServerRole::Idle,
            ServerRole::Connecting,
            ServerRole::NameServer,
            ServerRole::Master,
            ServerRole::GameServer,
        ] {
            shared.set_role(role);
            assert_eq!(shared.role(), role);
        }
    }

    #[test]
    fn server_time_unknown_until_first_pong() {
        let shared = Shared::new();
        assert_eq!(shared.server_time_ms(), 0);
        shared.record_pong(shared.local_ms(), 1_000_000);
        assert!(shared.server_time_ms() >= 1_000_000);
    }

    #[test]
    fn config_defaults() {
        let config = RelayConfig::new("ws://ns");
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.shutdown_timeout, Duration::from_secs(1));
    }

    #[test]
    fn send_without_init_is_rejected() {
        struct Never;

        #[async_trait::async_trait]
        impl Connector for Never {
            async fn connect(&self, _address: &str) -> Result<Box<dyn Transport>> {
                Err(LobbyError::TransportClosed)
            }
        }

        let mut client = RelayNetworkClient::new(Never, RelayConfig::new("ns"));
        let err = client.send(Request::Disconnect).unwrap_err();
        assert!(matches!(err, LobbyError::Rejected(_)));
    }
}
