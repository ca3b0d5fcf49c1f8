//! Local mirror of the joined room, its actors, and lobby-scoped listings.
//!
//! The backend is authoritative. [`Registry`] is only ever mutated from the
//! session's dispatch path and from fire-and-forget host setters; it performs
//! no network calls itself.

use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};

/// Backend-assigned participant id, unique within a room.
pub type ActorId = i32;

/// Custom properties of a room or actor.
pub type PropertyMap = BTreeMap<String, String>;

// ── Wire-visible payloads ───────────────────────────────────────────

/// An actor as announced by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorInfo {
    pub id: ActorId,
    pub name: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub properties: PropertyMap,
}

/// Full room state carried by a successful join or create response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSnapshot {
    pub name: String,
    /// `0` means unlimited.
    pub max_players: u8,
    pub open: bool,
    pub visible: bool,
    pub master_actor_id: ActorId,
    pub local_actor_id: ActorId,
    #[serde(default)]
    pub properties: PropertyMap,
    /// Property keys published to the lobby listing.
    #[serde(default)]
    pub lobby_keys: Vec<String>,
    #[serde(default)]
    pub actors: Vec<ActorInfo>,
}

/// One entry of the lobby's room list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSummary {
    pub name: String,
    pub max_players: u8,
    pub player_count: u8,
    pub open: bool,
    /// The room's lobby-listed custom properties.
    #[serde(default)]
    pub properties: PropertyMap,
}

/// Application-wide counters pushed by the master server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppStats {
    pub games_running: u32,
    pub players_in_game: u32,
    pub players_online: u32,
}

// ── Mirror types ────────────────────────────────────────────────────

/// A participant in the mirrored room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: ActorId,
    pub name: String,
    pub user_id: String,
    /// Temporarily disconnected but still holding its slot.
    pub suspended: bool,
    pub properties: PropertyMap,
}

impl Actor {
    pub fn is_active(&self) -> bool {
        !self.suspended
    }
}

impl From<ActorInfo> for Actor {
    fn from(info: ActorInfo) -> Self {
        Self {
            id: info.id,
            name: info.name,
            user_id: info.user_id,
            suspended: false,
            properties: info.properties,
        }
    }
}

/// Flattened actor listing for hosts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorEntry {
    pub id: ActorId,
    pub name: String,
    pub user_id: String,
    pub is_host: bool,
    pub is_active: bool,
}

/// Mirror of the joined room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    pub name: String,
    pub max_players: u8,
    pub open: bool,
    pub visible: bool,
    pub master_actor_id: ActorId,
    pub local_actor_id: ActorId,
    pub properties: PropertyMap,
    pub lobby_keys: Vec<String>,
    actors: BTreeMap<ActorId, Actor>,
}

impl Room {
    pub fn player_count(&self) -> usize {
        self.actors.len()
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(&id)
    }

    /// Actors in ascending id order.
    pub fn actors(&self) -> impl Iterator<Item = &Actor> {
        self.actors.values()
    }

    pub fn local_actor(&self) -> Option<&Actor> {
        self.actors.get(&self.local_actor_id)
    }

    pub(crate) fn rename_actor(&mut self, id: ActorId, name: &str) {
        if let Some(actor) = self.actors.get_mut(&id) {
            actor.name = name.to_string();
        }
    }

    pub fn entries(&self) -> Vec<ActorEntry> {
        self.actors
            .values()
            .map(|a| ActorEntry {
                id: a.id,
                name: a.name.clone(),
                user_id: a.user_id.clone(),
                is_host: a.id == self.master_actor_id,
                is_active: a.is_active(),
            })
            .collect()
    }
}

impl From<RoomSnapshot> for Room {
    fn from(snapshot: RoomSnapshot) -> Self {
        let actors = snapshot
            .actors
            .into_iter()
            .map(|info| (info.id, Actor::from(info)))
            .collect();
        Self {
            name: snapshot.name,
            max_players: snapshot.max_players,
            open: snapshot.open,
            visible: snapshot.visible,
            master_actor_id: snapshot.master_actor_id,
            local_actor_id: snapshot.local_actor_id,
            properties: snapshot.properties,
            lobby_keys: snapshot.lobby_keys,
            actors,
        }
    }
}

/// Apply `(key, value)` changes; an empty value removes the key.
pub fn merge_properties(target: &mut PropertyMap, changes: &[(String, String)]) {
    for (key, value) in changes {
        if value.is_empty() {
            target.remove(key);
        } else {
            target.insert(key.clone(), value.clone());
        }
    }
}

// ── PropertyChanges ─────────────────────────────────────────────────

/// Ordered room-property changes handed to
/// [`SessionListener::on_room_properties_changed`](crate::SessionListener::on_room_properties_changed).
///
/// [`pop`](Self::pop) yields changes in the order the backend sent them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyChanges {
    changes: VecDeque<(String, String)>,
}

impl PropertyChanges {
    /// Oldest remaining change first.
    pub fn pop(&mut self) -> Option<(String, String)> {
        self.changes.pop_front()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, String)> {
        self.changes.iter()
    }
}

impl From<Vec<(String, String)>> for PropertyChanges {
    fn from(changes: Vec<(String, String)>) -> Self {
        Self {
            changes: changes.into(),
        }
    }
}

// ── Registry ────────────────────────────────────────────────────────

/// Room mirror, lobby room list and application stats.
#[derive(Debug, Default)]
pub struct Registry {
    room: Option<Room>,
    room_list: Vec<RoomSummary>,
    stats: AppStats,
}

impl Registry {
    pub fn room(&self) -> Option<&Room> {
        self.room.as_ref()
    }

    pub(crate) fn room_mut(&mut self) -> Option<&mut Room> {
        self.room.as_mut()
    }

    pub fn room_list(&self) -> &[RoomSummary] {
        &self.room_list
    }

    pub fn stats(&self) -> AppStats {
        self.stats
    }

    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.room.as_ref().and_then(|r| r.actor(id))
    }

    pub fn master_actor_id(&self) -> Option<ActorId> {
        self.room.as_ref().map(|r| r.master_actor_id)
    }

    pub(crate) fn install(&mut self, snapshot: RoomSnapshot) -> &Room {
        self.room.insert(Room::from(snapshot))
    }

    pub(crate) fn destroy_room(&mut self) -> bool {
        self.room.take().is_some()
    }

    pub(crate) fn clear(&mut self) {
        self.room = None;
        self.room_list.clear();
    }

    pub(crate) fn replace_room_list(&mut self, rooms: Vec<RoomSummary>) {
        self.room_list = rooms;
    }

    pub(crate) fn set_stats(&mut self, stats: AppStats) {
        self.stats = stats;
    }

    /// Insert or reactivate an actor.
    pub(crate) fn add_actor(&mut self, info: ActorInfo) {
        if let Some(room) = self.room.as_mut() {
            room.actors.insert(info.id, Actor::from(info));
        }
    }

    /// Remove an actor. If it was master, the lowest remaining id takes over
    /// until the backend says otherwise.
    pub(crate) fn remove_actor(&mut self, id: ActorId) -> Option<Actor> {
        let room = self.room.as_mut()?;
        let removed = room.actors.remove(&id)?;
        if room.master_actor_id == id {
            if let Some(&next) = room.actors.keys().next() {
                room.master_actor_id = next;
            }
        }
        Some(removed)
    }

    pub(crate) fn suspend_actor(&mut self, id: ActorId) -> bool {
        match self.room.as_mut().and_then(|r| r.actors.get_mut(&id)) {
            Some(actor) => {
                actor.suspended = true;
                true
            }
            None => false,
        }
    }

    pub(crate) fn set_master(&mut self, id: ActorId) {
        if let Some(room) = self.room.as_mut() {
            room.master_actor_id = id;
        }
    }

    pub(crate) fn merge_room_properties(&mut self, changes: &[(String, String)]) {
        if let Some(room) = self.room.as_mut() {
            merge_properties(&mut room.properties, changes);
        }
    }

    pub(crate) fn merge_actor_properties(&mut self, id: ActorId, changes: &[(String, String)]) {
        if let Some(actor) = self.room.as_mut().and_then(|r| r.actors.get_mut(&id)) {
            merge_properties(&mut actor.properties, changes);
        }
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

    fn actor(id: ActorId, name: &str) -> ActorInfo {
        ActorInfo {
            id,
            name: name.into(),
            user_id: format!("user-{id}"),
            properties: PropertyMap::new(),
        }
    }

    fn snapshot() -> RoomSnapshot {
        RoomSnapshot {
            name: "arena".into(),
            max_players: 4,
            open: true,
            visible: true,
            master_actor_id: 1,
            local_actor_id: 2,
            properties: PropertyMap::from([("map".to_string(), "dust".to_string())]),
            lobby_keys: vec!["map".into()],
            actors: vec![actor(1, "alice"), actor(2, "bob"), actor(5, "carol")],
        }
    }

    #[test]
    fn empty_value_removes_property() {
        let mut map = PropertyMap::from([("a".to_string(), "1".to_string())]);
        merge_properties(
            &mut map,
            &[("a".into(), String::new()), ("b".into(), "2".into())],
        );
        assert_eq!(map.get("a"), None);
        assert_eq!(map.get("b").map(String::as_str), Some("2"));
    }

    #[test]
    fn install_mirrors_snapshot() {
        let mut registry = Registry::default();
        let room = registry.install(snapshot());
        assert_eq!(room.player_count(), 3);
        assert_eq!(room.property("map"), Some("dust"));
        assert_eq!(room.local_actor().map(|a| a.name.as_str()), Some("bob"));
        assert_eq!(registry.master_actor_id(), Some(1));
    }

    #[test]
    fn master_departure_elects_lowest_remaining_actor() {
        let mut registry = Registry::default();
        registry.install(snapshot());

        registry.remove_actor(1).unwrap();
        assert_eq!(registry.master_actor_id(), Some(2));

        // Removing a non-master leaves the master alone.
        registry.remove_actor(5).unwrap();
        assert_eq!(registry.master_actor_id(), Some(2));
    }

    #[test]
    fn suspended_actor_keeps_slot_and_master() {
        let mut registry = Registry::default();
        registry.install(snapshot());

        assert!(registry.suspend_actor(1));
        let entries = registry.room().unwrap().entries();
        assert_eq!(entries.len(), 3);
        assert!(entries[0].is_host);
        assert!(!entries[0].is_active);

        // Rejoin reactivates.
        registry.add_actor(actor(1, "alice"));
        assert!(registry.actor(1).unwrap().is_active());
    }

    #[test]
    fn mutations_without_room_are_ignored() {
        let mut registry = Registry::default();
        registry.add_actor(actor(1, "alice"));
        registry.merge_room_properties(&[("k".into(), "v".into())]);
        assert!(registry.remove_actor(1).is_none());
        assert!(!registry.suspend_actor(1));
        assert!(registry.room().is_none());
    }

    #[test]
    fn property_changes_pop_oldest_first() {
        let mut changes = PropertyChanges::from(vec![
            ("first".to_string(), "1".to_string()),
            ("second".to_string(), "2".to_string()),
        ]);
        assert_eq!(changes.len(), 2);
        assert_eq!(changes.pop().unwrap().0, "first");
        assert_eq!(changes.pop().unwrap().0, "second");
        assert!(changes.pop().is_none());
        assert!(changes.is_empty());
    }

    #[test]
    fn snapshot_deserializes_with_defaults() {
        let json = r#"{"name":"r","max_players":2,"open":true,"visible":false,"master_actor_id":1,"local_actor_id":1}"#;
        let snapshot: RoomSnapshot = serde_json::from_str(json).unwrap();
        assert!(snapshot.actors.is_empty());
        assert!(snapshot.properties.is_empty());
    }
}
