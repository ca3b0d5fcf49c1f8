#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing
)]
//! Wire format tests for the relay protocol.
//!
//! Server messages are parsed from JSON fixtures shaped like real backend
//! output; client messages are checked field by field.

use relay_lobby_client::error_codes::ErrorCode;
use relay_lobby_client::protocol::{ClientMessage, ServerMessage};
use relay_lobby_client::{
    ConnectionProtocol, EventCaching, EventTarget, InterestGroups, MatchmakingMode,
    MultiplayerEvent, ReceiverOption, Request, ResponseKind,
};
use serde_json::json;

fn parse(value: serde_json::Value) -> ServerMessage {
    serde_json::from_value(value).expect("deserialize")
}

// ════════════════════════════════════════════════════════════════════
// ClientMessage shapes
// ════════════════════════════════════════════════════════════════════

#[test]
fn authenticate_for_name_server_carries_region() {
    let msg = ClientMessage::Authenticate {
        app_id: "app".into(),
        app_version: "1.2".into(),
        user_id: "alice-1".into(),
        user_name: "Alice".into(),
        region: Some("eu".into()),
        protocol: ConnectionProtocol::Udp,
    };
    let json = serde_json::to_value(&msg).unwrap();
    assert_eq!(
        json,
        json!({
            "type": "Authenticate",
            "data": {
                "app_id": "app",
                "app_version": "1.2",
                "user_id": "alice-1",
                "user_name": "Alice",
                "region": "eu",
                "protocol": "udp"
            }
        })
    );
}

#[test]
fn unit_and_ping_messages() {
    assert_eq!(
        serde_json::to_value(ClientMessage::JoinLobby).unwrap(),
        json!({ "type": "JoinLobby" })
    );
    assert_eq!(
        serde_json::to_value(ClientMessage::Ping { client_time_ms: 42 }).unwrap(),
        json!({ "type": "Ping", "data": { "client_time_ms": 42 } })
    );
}

#[test]
fn join_random_room_request() {
    let msg = ClientMessage::Operation(Request::JoinRandomRoom {
        max_players: 4,
        mode: MatchmakingMode::SerialMatching,
        filter: [("map".to_string(), "dust".to_string())].into(),
    });
    let json = serde_json::to_value(&msg).unwrap();
    assert_eq!(json["type"], "Operation");
    assert_eq!(json["data"]["type"], "join_random_room");
    let data = &json["data"]["data"];
    assert_eq!(data["max_players"], 4);
    assert_eq!(data["mode"], "serial_matching");
    assert_eq!(data["filter"]["map"], "dust");
}

#[test]
fn raise_event_request() {
    let event = MultiplayerEvent::to_group(12, 3).with_caching(EventCaching::CacheUntilLeaveRoom);
    let msg = ClientMessage::Operation(Request::RaiseEvent {
        event,
        payload: vec![1, 2, 255],
    });
    let json = serde_json::to_value(&msg).unwrap();
    let data = &json["data"]["data"];
    assert_eq!(data["event"]["code"], 12);
    assert_eq!(data["event"]["target"], json!({ "type": "group", "data": 3 }));
    assert_eq!(data["event"]["caching"], "cache_until_leave_room");
    assert_eq!(data["payload"], json!([1, 2, 255]));
}

#[test]
fn interest_group_requests() {
    let join = serde_json::to_value(ClientMessage::Operation(Request::JoinGroups(
        InterestGroups::Only(vec![1, 5]),
    )))
    .unwrap();
    assert_eq!(
        join["data"],
        json!({ "type": "join_groups", "data": { "type": "only", "data": [1, 5] } })
    );

    let leave = serde_json::to_value(ClientMessage::Operation(Request::LeaveGroups(
        InterestGroups::All,
    )))
    .unwrap();
    assert_eq!(
        leave["data"],
        json!({ "type": "leave_groups", "data": { "type": "all" } })
    );
}

#[test]
fn receivers_replace_a_previous_target() {
    let event = MultiplayerEvent::to_group(1, 3).with_receivers(ReceiverOption::Host);
    assert_eq!(event.target, EventTarget::Receivers(ReceiverOption::Host));
    assert_eq!(
        serde_json::to_value(&event.target).unwrap(),
        json!({ "type": "receivers", "data": "host" })
    );
}

// ════════════════════════════════════════════════════════════════════
// Server JSON fixtures
// ════════════════════════════════════════════════════════════════════

#[test]
fn fixture_master_address() {
    let msg = parse(json!({
        "type": "MasterAddress",
        "data": { "address": "wss://master-eu.example.com:9090" }
    }));
    assert_eq!(
        msg,
        ServerMessage::MasterAddress {
            address: "wss://master-eu.example.com:9090".into()
        }
    );
}

#[test]
fn fixture_authenticated_without_user_id() {
    let msg = parse(json!({ "type": "Authenticated", "data": {} }));
    assert_eq!(
        msg,
        ServerMessage::Authenticated {
            user_id: String::new()
        }
    );
}

#[test]
fn fixture_master_join_response_points_at_game_server() {
    let msg = parse(json!({
        "type": "OperationResponse",
        "data": {
            "kind": "join_random_room",
            "error_code": 0,
            "game_server": "wss://gs-3.example.com:9091"
        }
    }));
    match msg {
        ServerMessage::OperationResponse {
            kind,
            error_code,
            error_message,
            actor_id,
            game_server,
            room,
        } => {
            assert_eq!(kind, ResponseKind::JoinRandomRoom);
            assert_eq!(error_code, 0);
            assert!(error_message.is_empty());
            assert_eq!(actor_id, None);
            assert_eq!(game_server.as_deref(), Some("wss://gs-3.example.com:9091"));
            assert!(room.is_none());
        }
        other => panic!("expected OperationResponse, got {other:?}"),
    }
}

#[test]
fn fixture_game_server_join_response_carries_room() {
    let msg = parse(json!({
        "type": "OperationResponse",
        "data": {
            "kind": "create_room",
            "error_code": 0,
            "actor_id": 1,
            "room": {
                "name": "arena",
                "max_players": 4,
                "open": true,
                "visible": false,
                "master_actor_id": 1,
                "local_actor_id": 1,
                "properties": { "map": "dust" },
                "actors": [
                    { "id": 1, "name": "Alice", "user_id": "alice-1" }
                ]
            }
        }
    }));
    let ServerMessage::OperationResponse { room, actor_id, .. } = msg else {
        panic!("expected OperationResponse");
    };
    let room = room.unwrap();
    assert_eq!(actor_id, Some(1));
    assert_eq!(room.name, "arena");
    assert!(!room.visible);
    assert_eq!(room.properties.get("map").map(String::as_str), Some("dust"));
    assert!(room.lobby_keys.is_empty());
    assert_eq!(room.actors.len(), 1);
    assert!(room.actors[0].properties.is_empty());
}

#[test]
fn fixture_failed_join_response() {
    let msg = parse(json!({
        "type": "OperationResponse",
        "data": {
            "kind": "join_room",
            "error_code": 32765,
            "error_message": "Game full"
        }
    }));
    let ServerMessage::OperationResponse {
        error_code,
        error_message,
        ..
    } = msg
    else {
        panic!("expected OperationResponse");
    };
    assert_eq!(ErrorCode::from_code(error_code), Some(ErrorCode::GameFull));
    assert_eq!(error_message, "Game full");
}

#[test]
fn fixture_actor_left_flags_default_to_false() {
    let msg = parse(json!({ "type": "ActorLeft", "data": { "actor_id": 4 } }));
    assert_eq!(
        msg,
        ServerMessage::ActorLeft {
            actor_id: 4,
            inactive: false,
            cleanup: false,
        }
    );
}

#[test]
fn fixture_room_list_update() {
    let msg = parse(json!({
        "type": "RoomListUpdate",
        "data": {
            "updated": [
                { "name": "arena", "max_players": 4, "player_count": 3, "open": true }
            ]
        }
    }));
    let ServerMessage::RoomListUpdate { updated, removed } = msg else {
        panic!("expected RoomListUpdate");
    };
    assert_eq!(updated.len(), 1);
    assert_eq!(updated[0].player_count, 3);
    assert!(removed.is_empty());
}

#[test]
fn fixture_event_payload_as_byte_array() {
    let msg = parse(json!({
        "type": "Event",
        "data": { "actor_id": 2, "code": 9, "payload": [104, 105] }
    }));
    assert_eq!(
        msg,
        ServerMessage::Event {
            actor_id: 2,
            code: 9,
            payload: b"hi".to_vec(),
        }
    );
}

#[test]
fn fixture_property_changes_keep_order() {
    let msg = parse(json!({
        "type": "RoomPropertiesChanged",
        "data": { "changes": [["z", "1"], ["a", ""]] }
    }));
    assert_eq!(
        msg,
        ServerMessage::RoomPropertiesChanged {
            changes: vec![("z".into(), "1".into()), ("a".into(), String::new())]
        }
    );
}

#[test]
fn fixture_app_stats_and_pong() {
    let stats = parse(json!({
        "type": "AppStats",
        "data": { "games_running": 2, "players_in_game": 7, "players_online": 30 }
    }));
    let ServerMessage::AppStats(stats) = stats else {
        panic!("expected AppStats");
    };
    assert_eq!(stats.players_online, 30);

    let pong = parse(json!({
        "type": "Pong",
        "data": { "client_time_ms": 10, "server_time_ms": 1700000000000_i64 }
    }));
    assert_eq!(
        pong,
        ServerMessage::Pong {
            client_time_ms: 10,
            server_time_ms: 1_700_000_000_000
        }
    );
}

#[test]
fn fixture_error() {
    let msg = parse(json!({
        "type": "Error",
        "data": { "error_code": 32757, "message": "CCU limit" }
    }));
    let ServerMessage::Error { error_code, message } = msg else {
        panic!("expected Error");
    };
    assert_eq!(ErrorCode::from_code(error_code), Some(ErrorCode::MaxCcuReached));
    assert_eq!(message, "CCU limit");
}

#[test]
fn unknown_message_type_is_rejected() {
    let result = serde_json::from_value::<ServerMessage>(json!({ "type": "Teleport" }));
    assert!(result.is_err());
}
