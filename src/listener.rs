//! Host callback surface.

use crate::operation::OperationResult;
use crate::room::{ActorId, AppStats, PropertyChanges, Registry, RoomSummary};
use crate::state::ClientState;

/// Callbacks invoked from within [`Session::service`](crate::Session::service).
///
/// Every method has an empty default, so hosts implement only what they need.
/// Methods that receive the [`Registry`] observe it after the triggering
/// change has been applied.
#[allow(unused_variables)]
pub trait SessionListener {
    /// A correlated operation finished, the connection failed, or the
    /// connection was closed.
    fn on_operation_result(&mut self, result: &OperationResult) {}

    fn on_state_changed(&mut self, state: ClientState) {}

    fn on_stats_changed(&mut self, stats: AppStats) {}

    fn on_actor_joined(&mut self, registry: &Registry, actor_id: ActorId, is_local: bool) {}

    /// `was_suspended` is `true` when the actor keeps its slot for a rejoin.
    fn on_actor_left(&mut self, registry: &Registry, actor_id: ActorId, was_suspended: bool) {}

    fn on_custom_event(&mut self, actor_id: ActorId, event_code: u8, payload: &[u8]) {}

    fn on_room_list_changed(&mut self, rooms: &[RoomSummary]) {}

    /// `changes` pops oldest first.
    fn on_room_properties_changed(&mut self, registry: &Registry, changes: &mut PropertyChanges) {}

    fn on_player_properties_changed(&mut self, registry: &Registry, actor_id: ActorId) {}

    /// The master actor moved. `old` is `None` if none was known.
    fn on_host_changed(&mut self, new: ActorId, old: Option<ActorId>) {}
}

/// A listener that ignores everything.
impl SessionListener for () {}
