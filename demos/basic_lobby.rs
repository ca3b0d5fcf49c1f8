//! # Basic Lobby Example
//!
//! Demonstrates a complete session lifecycle against a relay backend:
//!
//! 1. Connect through the name server to a region's lobby
//! 2. Join a random room, creating one if none is open
//! 3. React to actors joining and leaving, and to host changes
//! 4. Leave and disconnect on Ctrl+C
//!
//! ## Running
//!
//! ```sh
//! # Start a relay backend with its name server on localhost:9090, then:
//! cargo run --example basic_lobby
//!
//! # Override the name server URL and region:
//! RELAY_NAME_SERVER=wss://ns.example.com RELAY_REGION=us cargo run --example basic_lobby
//! ```

use std::time::Duration;

use relay_lobby_client::{
    generate_user_id, ActorId, ClientState, LobbyConfig, MatchmakingMode, Operation,
    OperationResult, Registry, RelayConfig, RelayNetworkClient, RoomCreateOption, Session,
    SessionListener, WebSocketConnector,
};

/// Default name server URL when `RELAY_NAME_SERVER` is not set.
const DEFAULT_URL: &str = "ws://localhost:9090/ns";

#[derive(Default)]
struct Lobby {
    disconnected: bool,
}

impl SessionListener for Lobby {
    fn on_operation_result(&mut self, result: &OperationResult) {
        if result.is_success() {
            tracing::info!("{:?} succeeded", result.completion);
        } else {
            tracing::warn!(
                "{:?} failed [{}]: {}",
                result.completion,
                result.error_code,
                result.error_message
            );
        }
        if result.operation() == Some(Operation::Disconnect) {
            self.disconnected = true;
        }
    }

    fn on_state_changed(&mut self, state: ClientState) {
        tracing::info!("State → {state}");
    }

    fn on_actor_joined(&mut self, registry: &Registry, actor_id: ActorId, is_local: bool) {
        let name = registry.actor(actor_id).map_or("?", |a| a.name.as_str());
        if is_local {
            tracing::info!("We joined as actor {actor_id}");
        } else {
            tracing::info!("Actor joined: {name} ({actor_id})");
        }
    }

    fn on_actor_left(&mut self, _registry: &Registry, actor_id: ActorId, was_suspended: bool) {
        if was_suspended {
            tracing::info!("Actor {actor_id} dropped out and may come back");
        } else {
            tracing::info!("Actor left: {actor_id}");
        }
    }

    fn on_host_changed(&mut self, new: ActorId, old: Option<ActorId>) {
        tracing::info!("Host changed: {old:?} → {new}");
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ── Logging ─────────────────────────────────────────────────────
    // Set `RUST_LOG=debug` for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // ── Configuration ───────────────────────────────────────────────
    let url = std::env::var("RELAY_NAME_SERVER").unwrap_or_else(|_| DEFAULT_URL.to_string());
    let region = std::env::var("RELAY_REGION").unwrap_or_else(|_| "eu".to_string());
    tracing::info!("Connecting to {url} ({region})");

    let relay = RelayNetworkClient::new(WebSocketConnector::new(), RelayConfig::new(url));
    let config = LobbyConfig::new("example-app", "1.0").with_verbose(true);
    let mut session = Session::init(config, relay);
    let mut lobby = Lobby::default();

    session.set_user_name("RustPlayer")?;
    session.connect(generate_user_id("RustPlayer"), region)?;

    // ── Frame loop ──────────────────────────────────────────────────
    let mut frame = tokio::time::interval(Duration::from_millis(16));
    let mut quitting = false;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    while !lobby.disconnected {
        tokio::select! {
            _ = frame.tick() => {}
            _ = &mut ctrl_c, if !quitting => {
                tracing::info!("Ctrl+C received, leaving…");
                quitting = true;
            }
        }

        session.service(&mut lobby);

        if session.pending_operation().is_some() {
            continue;
        }
        match (session.state(), quitting) {
            (ClientState::InLobby, false) => {
                let options = RoomCreateOption::new().with_max_players(4);
                session.join_random_or_create_room(
                    "",
                    Some(&options),
                    4,
                    MatchmakingMode::FillOldestRoom,
                    None,
                )?;
            }
            (ClientState::InRoom, true) => session.leave_room(false)?,
            (ClientState::InLobby, true) => session.disconnect()?,
            (ClientState::Disconnected, _) => break,
            _ => {}
        }
    }

    // ── Cleanup ─────────────────────────────────────────────────────
    session.network_mut().close().await;
    tracing::info!("Session closed. Goodbye!");
    Ok(())
}
