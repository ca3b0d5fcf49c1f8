//! Inbound notifications and the queue between the network client and the
//! session's service tick.
//!
//! The network client pushes [`NetworkEvent`]s through an [`EventSink`] at
//! whatever time its I/O runs. The session drains them once per
//! [`Session::service`](crate::Session::service) call.

use tokio::sync::mpsc;
use tracing::debug;

use crate::error_codes::ErrorCode;
use crate::operation::ResponseKind;
use crate::room::{ActorId, ActorInfo, AppStats, RoomSnapshot, RoomSummary};
use crate::state::{ClientState, NetworkState};

/// Everything a network client can report to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkEvent {
    /// The low-level connection state changed.
    StateChanged(NetworkState),

    /// Terminal response to a correlated request.
    OperationResponse {
        kind: ResponseKind,
        error_code: i32,
        error_message: String,
        actor_id: Option<ActorId>,
        /// Present on successful join and create responses.
        room: Option<Box<RoomSnapshot>>,
    },

    /// The connection failed, independent of any pending request.
    ConnectionError { error_code: i32, error_message: String },

    /// The connection is gone, whether requested or not.
    Disconnected,

    AppStats(AppStats),

    ActorJoined { actor: ActorInfo, is_local: bool },

    /// An actor left the room. `cleanup` departures are applied silently.
    ActorLeft { actor_id: ActorId, cleanup: bool },

    /// An actor dropped out but keeps its slot for a later rejoin.
    ActorSuspended { actor_id: ActorId },

    CustomEvent {
        actor_id: ActorId,
        event_code: u8,
        payload: Vec<u8>,
    },

    /// Full replacement of the lobby's room list.
    RoomList(Vec<RoomSummary>),

    RoomPropertiesChanged(Vec<(String, String)>),

    ActorPropertiesChanged {
        actor_id: ActorId,
        changes: Vec<(String, String)>,
    },

    /// The backend designated a new master actor.
    MasterChanged(ActorId),
}

impl NetworkEvent {
    /// Convenience constructor for a connection error with a known code.
    pub fn connection_error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::ConnectionError {
            error_code: code.code(),
            error_message: message.into(),
        }
    }
}

/// Item carried by the session queue.
#[derive(Debug)]
pub(crate) enum Queued {
    Network(NetworkEvent),
    /// A state the session entered on its own when a host call was accepted.
    Local(ClientState),
}

/// Cloneable handle the network client uses to report events.
///
/// `Send + Sync`, so it may be used from any thread or task.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<Queued>,
}

impl EventSink {
    /// Queue `event` for the next service tick.
    ///
    /// Returns `false` if the owning session has been dropped or
    /// re-initialized; the event is discarded.
    pub fn push(&self, event: NetworkEvent) -> bool {
        match self.tx.send(Queued::Network(event)) {
            Ok(()) => true,
            Err(mpsc::error::SendError(dropped)) => {
                debug!("event queue closed, dropping {dropped:?}");
                false
            }
        }
    }

    /// Returns `true` once the owning session is gone.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// The session end of the queue.
#[derive(Debug)]
pub(crate) struct EventQueue {
    tx: mpsc::UnboundedSender<Queued>,
    rx: mpsc::UnboundedReceiver<Queued>,
}

impl EventQueue {
    pub(crate) fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }

    pub(crate) fn sink(&self) -> EventSink {
        EventSink {
            tx: self.tx.clone(),
        }
    }

    pub(crate) fn push_local(&self, state: ClientState) {
        // Cannot fail: `self.rx` is alive for as long as `self`.
        let _ = self.tx.send(Queued::Local(state));
    }

    /// Take everything queued so far. Items pushed afterwards stay queued.
    pub(crate) fn snapshot(&mut self) -> Vec<Queued> {
        let mut items = Vec::new();
        while let Ok(item) = self.rx.try_recv() {
            items.push(item);
        }
        items
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
    fn snapshot_preserves_arrival_order_across_sources() {
        let mut queue = EventQueue::new();
        let sink = queue.sink();

        assert!(sink.push(NetworkEvent::MasterChanged(1)));
        queue.push_local(ClientState::LeavingRoom);
        assert!(sink.push(NetworkEvent::Disconnected));

        let items = queue.snapshot();
        assert_eq!(items.len(), 3);
        assert!(matches!(items[0], Queued::Network(NetworkEvent::MasterChanged(1))));
        assert!(matches!(items[1], Queued::Local(ClientState::LeavingRoom)));
        assert!(matches!(items[2], Queued::Network(NetworkEvent::Disconnected)));
    }

    #[test]
    fn pushes_after_snapshot_wait_for_next_one() {
        let mut queue = EventQueue::new();
        let sink = queue.sink();
        sink.push(NetworkEvent::MasterChanged(1));

        let first = queue.snapshot();
        sink.push(NetworkEvent::MasterChanged(2));
        assert_eq!(first.len(), 1);

        let second = queue.snapshot();
        assert_eq!(second.len(), 1);
        assert!(matches!(second[0], Queued::Network(NetworkEvent::MasterChanged(2))));
        assert!(queue.snapshot().is_empty());
    }

    #[test]
    fn sink_reports_dropped_queue() {
        let queue = EventQueue::new();
        let sink = queue.sink();
        drop(queue);
        assert!(sink.is_closed());
        assert!(!sink.push(NetworkEvent::Disconnected));
    }

    #[test]
    fn sink_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<EventSink>();
    }

    #[tokio::test]
    async fn sink_works_from_another_task() {
        let mut queue = EventQueue::new();
        let sink = queue.sink();
        tokio::spawn(async move {
            sink.push(NetworkEvent::AppStats(AppStats::default()));
        })
        .await
        .unwrap();
        assert_eq!(queue.snapshot().len(), 1);
    }
}
