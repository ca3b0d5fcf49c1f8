//! Room creation settings, matchmaking modes and custom event routing.

use std::ops::RangeInclusive;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{LobbyError, Result};
use crate::room::{ActorId, PropertyMap};

/// Event codes available to applications. The rest are reserved by the backend.
pub const EVENT_CODES: RangeInclusive<u8> = 1..=199;

/// How `join_random_room` picks among matching rooms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchmakingMode {
    /// Fill the oldest room first.
    #[default]
    FillOldestRoom,
    /// Distribute players across rooms in order.
    SerialMatching,
    RandomMatching,
}

// ── RoomCreateOption ────────────────────────────────────────────────

/// Settings for a room this client may create.
///
/// # Example
///
/// ```
/// use relay_lobby_client::RoomCreateOption;
/// use std::time::Duration;
///
/// let options = RoomCreateOption::new()
///     .with_max_players(4)
///     .with_property("map", "harbor")
///     .with_lobby_keys(["map"])
///     .with_rejoin_grace_period(Duration::from_secs(30));
/// assert!(options.visible);
/// assert_eq!(options.max_players, 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomCreateOption {
    /// Listed in the lobby.
    pub visible: bool,
    /// Accepts new joins.
    pub open: bool,
    /// Share user ids with the other actors.
    pub publish_user_id: bool,
    /// `0` means unlimited.
    pub max_players: u8,
    pub properties: PropertyMap,
    /// Property keys published to the lobby listing.
    pub lobby_keys: Vec<String>,
    /// How long a disconnected actor keeps its slot. `None` removes it at once.
    pub rejoin_grace_period: Option<Duration>,
    /// How long an empty room survives before the backend destroys it.
    pub room_destroy_grace_period: Duration,
}

impl Default for RoomCreateOption {
    fn default() -> Self {
        Self {
            visible: true,
            open: true,
            publish_user_id: false,
            max_players: 0,
            properties: PropertyMap::new(),
            lobby_keys: Vec::new(),
            rejoin_grace_period: None,
            room_destroy_grace_period: Duration::ZERO,
        }
    }
}

impl RoomCreateOption {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    #[must_use]
    pub fn with_open(mut self, open: bool) -> Self {
        self.open = open;
        self
    }

    #[must_use]
    pub fn with_publish_user_id(mut self, publish: bool) -> Self {
        self.publish_user_id = publish;
        self
    }

    #[must_use]
    pub fn with_max_players(mut self, max_players: u8) -> Self {
        self.max_players = max_players;
        self
    }

    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_properties(mut self, properties: PropertyMap) -> Self {
        self.properties = properties;
        self
    }

    #[must_use]
    pub fn with_lobby_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lobby_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_rejoin_grace_period(mut self, period: Duration) -> Self {
        self.rejoin_grace_period = Some(period);
        self
    }

    #[must_use]
    pub fn with_room_destroy_grace_period(mut self, period: Duration) -> Self {
        self.room_destroy_grace_period = period;
        self
    }
}

// ── Custom events ───────────────────────────────────────────────────

/// Broadcast audiences for a custom event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceiverOption {
    /// Everyone except the sender.
    #[default]
    Others,
    /// Everyone including the sender.
    All,
    /// Only the current master actor.
    Host,
}

/// Whether the backend keeps a copy of the event for actors joining later.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCaching {
    #[default]
    DoNotCache,
    /// Cached until the sender leaves the room.
    CacheUntilLeaveRoom,
    CacheForever,
}

/// Who receives a custom event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum EventTarget {
    Receivers(ReceiverOption),
    Actors(Vec<ActorId>),
    /// Subscribers of an interest group (`1..=255`).
    Group(u8),
}

/// Header of a custom event raised with
/// [`Session::raise_event`](crate::Session::raise_event).
///
/// ```
/// use relay_lobby_client::{EventCaching, MultiplayerEvent, ReceiverOption};
///
/// let event = MultiplayerEvent::new(12)
///     .with_receivers(ReceiverOption::All)
///     .with_caching(EventCaching::CacheForever);
/// assert!(event.validate().is_ok());
/// assert!(MultiplayerEvent::new(200).validate().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiplayerEvent {
    pub code: u8,
    pub target: EventTarget,
    pub caching: EventCaching,
}

impl MultiplayerEvent {
    /// An event sent to the other actors, not cached.
    pub fn new(code: u8) -> Self {
        Self {
            code,
            target: EventTarget::Receivers(ReceiverOption::Others),
            caching: EventCaching::DoNotCache,
        }
    }

    /// An event sent to specific actors.
    pub fn to_actors(code: u8, actors: impl Into<Vec<ActorId>>) -> Self {
        Self {
            target: EventTarget::Actors(actors.into()),
            ..Self::new(code)
        }
    }

    /// An event sent to an interest group.
    pub fn to_group(code: u8, group: u8) -> Self {
        Self {
            target: EventTarget::Group(group),
            ..Self::new(code)
        }
    }

    #[must_use]
    pub fn with_receivers(mut self, receivers: ReceiverOption) -> Self {
        self.target = EventTarget::Receivers(receivers);
        self
    }

    #[must_use]
    pub fn with_caching(mut self, caching: EventCaching) -> Self {
        self.caching = caching;
        self
    }

    /// # Errors
    ///
    /// [`LobbyError::InvalidEventCode`] or [`LobbyError::InvalidInterestGroup`].
    pub fn validate(&self) -> Result<()> {
        validate_event_code(self.code)?;
        if let EventTarget::Group(group) = self.target {
            validate_group(group)?;
        }
        Ok(())
    }
}

pub(crate) fn validate_event_code(code: u8) -> Result<()> {
    if EVENT_CODES.contains(&code) {
        Ok(())
    } else {
        Err(LobbyError::InvalidEventCode(code))
    }
}

fn validate_group(group: u8) -> Result<()> {
    if group == 0 {
        Err(LobbyError::InvalidInterestGroup(group))
    } else {
        Ok(())
    }
}

/// A set of interest groups to subscribe to or drop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum InterestGroups {
    All,
    Only(Vec<u8>),
}

impl InterestGroups {
    /// # Errors
    ///
    /// [`LobbyError::InvalidInterestGroup`] for group `0`.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::All => Ok(()),
            Self::Only(groups) => groups.iter().try_for_each(|g| validate_group(*g)),
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

    #[test]
    fn room_create_option_defaults() {
        let options = RoomCreateOption::default();
        assert!(options.visible);
        assert!(options.open);
        assert!(!options.publish_user_id);
        assert_eq!(options.max_players, 0);
        assert_eq!(options.rejoin_grace_period, None);
        assert_eq!(options.room_destroy_grace_period, Duration::ZERO);
    }

    #[test]
    fn event_code_bounds() {
        assert!(MultiplayerEvent::new(1).validate().is_ok());
        assert!(MultiplayerEvent::new(199).validate().is_ok());
        assert!(matches!(
            MultiplayerEvent::new(0).validate(),
            Err(LobbyError::InvalidEventCode(0))
        ));
        assert!(matches!(
            MultiplayerEvent::new(200).validate(),
            Err(LobbyError::InvalidEventCode(200))
        ));
    }

    #[test]
    fn group_zero_is_rejected() {
        assert!(matches!(
            MultiplayerEvent::to_group(5, 0).validate(),
            Err(LobbyError::InvalidInterestGroup(0))
        ));
        assert!(MultiplayerEvent::to_group(5, 255).validate().is_ok());
        assert!(InterestGroups::Only(vec![1, 0]).validate().is_err());
        assert!(InterestGroups::All.validate().is_ok());
    }

    #[test]
    fn event_target_wire_shape() {
        let json = serde_json::to_value(MultiplayerEvent::to_actors(3, vec![7, 9])).unwrap();
        assert_eq!(json["target"]["type"], "actors");
        assert_eq!(json["target"]["data"], serde_json::json!([7, 9]));
        assert_eq!(json["caching"], "do_not_cache");
    }
}
