//! # Custom Transport Example
//!
//! Shows how to implement [`Transport`] and [`Connector`] with in-process
//! loopback channels, and drive a [`Session`] against a toy backend that plays
//! name server, master server and game server. This is useful for:
//!
//! - **Testing**: exercise game logic without a real backend
//! - **Custom backends**: adapt any I/O layer (TCP, QUIC, WebRTC data channels)
//!
//! ## Running
//!
//! ```sh
//! cargo run --example custom_transport --no-default-features --features tokio-runtime
//! ```

use std::time::Duration;

use async_trait::async_trait;
use relay_lobby_client::{
    ClientMessage, ClientState, Connector, LobbyConfig, LobbyError, Operation, OperationResult,
    RelayConfig, RelayNetworkClient, Request, ResponseKind, RoomSnapshot, ServerMessage, Session,
    SessionListener, Transport,
};
use tokio::sync::mpsc;

// ─────────────────────────────────────────────────────────────────────
// Step 1: A channel-based "loopback" transport
// ─────────────────────────────────────────────────────────────────────

/// Client half of one loopback connection.
pub struct LoopbackTransport {
    tx: mpsc::UnboundedSender<String>,
    rx: mpsc::UnboundedReceiver<String>,
}

/// Server half of one loopback connection.
pub struct LoopbackServer {
    pub rx: mpsc::UnboundedReceiver<String>,
    pub tx: mpsc::UnboundedSender<String>,
}

fn loopback_pair() -> (LoopbackTransport, LoopbackServer) {
    let (client_tx, server_rx) = mpsc::unbounded_channel();
    let (server_tx, client_rx) = mpsc::unbounded_channel();
    (
        LoopbackTransport {
            tx: client_tx,
            rx: client_rx,
        },
        LoopbackServer {
            rx: server_rx,
            tx: server_tx,
        },
    )
}

#[async_trait]
impl Transport for LoopbackTransport {
    async fn send(&mut self, message: String) -> Result<(), LobbyError> {
        self.tx
            .send(message)
            .map_err(|e| LobbyError::TransportSend(e.to_string()))
    }

    /// Cancel-safe because `mpsc::UnboundedReceiver::recv` is.
    async fn recv(&mut self) -> Option<Result<String, LobbyError>> {
        self.rx.recv().await.map(Ok)
    }

    async fn close(&mut self) -> Result<(), LobbyError> {
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────
// Step 2: A connector that hands each new connection to the backend
// ─────────────────────────────────────────────────────────────────────

struct LoopbackConnector {
    backend: mpsc::UnboundedSender<(String, LoopbackServer)>,
}

#[async_trait]
impl Connector for LoopbackConnector {
    async fn connect(&self, address: &str) -> Result<Box<dyn Transport>, LobbyError> {
        let (transport, server) = loopback_pair();
        self.backend
            .send((address.to_string(), server))
            .map_err(|_| LobbyError::TransportClosed)?;
        Ok(Box::new(transport))
    }
}

// ─────────────────────────────────────────────────────────────────────
// Step 3: A toy backend
// ─────────────────────────────────────────────────────────────────────

fn reply(address: &str, msg: ClientMessage) -> Vec<ServerMessage> {
    match (address, msg) {
        ("loopback://ns", ClientMessage::Authenticate { .. }) => vec![ServerMessage::MasterAddress {
            address: "loopback://master".into(),
        }],
        (_, ClientMessage::Authenticate { user_id, .. }) => {
            vec![ServerMessage::Authenticated { user_id }]
        }
        (_, ClientMessage::JoinLobby) => vec![ServerMessage::LobbyJoined],
        ("loopback://master", ClientMessage::Operation(Request::CreateRoom { .. })) => {
            vec![ServerMessage::OperationResponse {
                kind: ResponseKind::CreateRoom,
                error_code: 0,
                error_message: String::new(),
                actor_id: None,
                game_server: Some("loopback://game".into()),
                room: None,
            }]
        }
        ("loopback://game", ClientMessage::Operation(Request::CreateRoom { room_name, .. })) => {
            vec![ServerMessage::OperationResponse {
                kind: ResponseKind::CreateRoom,
                error_code: 0,
                error_message: String::new(),
                actor_id: Some(1),
                game_server: None,
                room: Some(Box::new(RoomSnapshot {
                    name: room_name,
                    max_players: 4,
                    open: true,
                    visible: true,
                    master_actor_id: 1,
                    local_actor_id: 1,
                    properties: Default::default(),
                    lobby_keys: Vec::new(),
                    actors: Vec::new(),
                })),
            }]
        }
        (_, ClientMessage::Operation(Request::RaiseEvent { event, payload })) => {
            // Echo the event back as if another actor sent it.
            vec![ServerMessage::Event {
                actor_id: 2,
                code: event.code,
                payload,
            }]
        }
        (_, ClientMessage::Operation(Request::LeaveRoom { .. })) => {
            vec![ServerMessage::OperationResponse {
                kind: ResponseKind::LeaveRoom,
                error_code: 0,
                error_message: String::new(),
                actor_id: None,
                game_server: None,
                room: None,
            }]
        }
        _ => Vec::new(),
    }
}

async fn run_backend(mut connections: mpsc::UnboundedReceiver<(String, LoopbackServer)>) {
    while let Some((address, mut server)) = connections.recv().await {
        tracing::info!(%address, "backend accepted connection");
        tokio::spawn(async move {
            while let Some(text) = server.rx.recv().await {
                let Ok(msg) = serde_json::from_str::<ClientMessage>(&text) else {
                    continue;
                };
                for answer in reply(&address, msg) {
                    let Ok(json) = serde_json::to_string(&answer) else {
                        continue;
                    };
                    if server.tx.send(json).is_err() {
                        return;
                    }
                }
            }
        });
    }
}

// ─────────────────────────────────────────────────────────────────────
// Step 4: A listener and a frame loop
// ─────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct Demo {
    finished: bool,
}

impl SessionListener for Demo {
    fn on_operation_result(&mut self, result: &OperationResult) {
        tracing::info!(
            "result: {:?} code={} actor={}",
            result.completion,
            result.error_code,
            result.actor_id_or_sentinel()
        );
        if result.operation() == Some(Operation::Disconnect) {
            self.finished = true;
        }
    }

    fn on_state_changed(&mut self, state: ClientState) {
        tracing::info!("state: {state}");
    }

    fn on_custom_event(&mut self, actor_id: i32, event_code: u8, payload: &[u8]) {
        tracing::info!(
            "event {event_code} from actor {actor_id}: {}",
            String::from_utf8_lossy(payload)
        );
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let (backend_tx, backend_rx) = mpsc::unbounded_channel();
    tokio::spawn(run_backend(backend_rx));

    let relay = RelayNetworkClient::new(
        LoopbackConnector {
            backend: backend_tx,
        },
        RelayConfig::new("loopback://ns"),
    );
    let mut session = Session::init(LobbyConfig::new("demo-app", "1.0"), relay);
    let mut demo = Demo::default();

    session.connect("demo-player", "local")?;

    let mut frame = tokio::time::interval(Duration::from_millis(16));
    let mut visited_room = false;
    while !demo.finished {
        frame.tick().await;
        session.service(&mut demo);

        if session.pending_operation().is_some() {
            continue;
        }
        match session.state() {
            ClientState::InLobby if !visited_room => {
                session.create_or_join_room(false, "loopback-room", None)?;
            }
            ClientState::InRoom => {
                visited_room = true;
                session.raise_event(
                    &relay_lobby_client::MultiplayerEvent::new(1),
                    b"hello from the loop",
                )?;
                session.leave_room(false)?;
            }
            ClientState::InLobby => {
                session.disconnect()?;
            }
            _ => {}
        }
    }

    session.network_mut().close().await;
    tracing::info!("Done. Custom transport works!");
    Ok(())
}
