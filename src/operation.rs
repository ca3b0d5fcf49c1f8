//! Correlated host operations and the single pending-operation slot.
//!
//! At most one host-initiated request of the [`Operation`] family is in
//! flight at a time. Responses are matched against the slot through
//! [`ResponseKind::accepts`]; anything the slot is not waiting for is stale.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{LobbyError, Result};
use crate::room::ActorId;

/// Actor id reported to hosts that expect a numeric sentinel for "no actor".
pub const NO_ACTOR: i32 = -1;

/// Host-initiated asynchronous operations that occupy the pending slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Connect,
    Reconnect,
    Disconnect,
    LeaveRoom,
    JoinRandomRoom,
    JoinRandomOrCreateRoom,
    JoinRoom,
    JoinOrCreateRoom,
    CreateRoom,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Origin of a terminal response, as far as the backend can tell.
///
/// Several operations funnel through the same backend request, so a single
/// kind may answer more than one [`Operation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseKind {
    /// The session reached the lobby.
    LobbyReached,
    /// The session went straight back into its previous room.
    RoomRejoined,
    LeaveRoom,
    JoinRandomRoom,
    JoinRoom,
    CreateRoom,
}

impl ResponseKind {
    /// Whether a response of this kind terminates `pending`.
    pub fn accepts(self, pending: Operation) -> bool {
        use Operation as Op;
        match self {
            Self::LobbyReached => matches!(pending, Op::Connect | Op::Reconnect),
            Self::RoomRejoined => pending == Op::Reconnect,
            Self::LeaveRoom => pending == Op::LeaveRoom,
            Self::JoinRandomRoom => matches!(pending, Op::JoinRandomRoom | Op::JoinRandomOrCreateRoom),
            Self::JoinRoom => matches!(pending, Op::JoinRoom | Op::JoinOrCreateRoom),
            Self::CreateRoom => pending == Op::CreateRoom,
        }
    }

    /// Whether a successful response of this kind carries a room to mirror.
    pub fn enters_room(self) -> bool {
        matches!(
            self,
            Self::RoomRejoined | Self::JoinRandomRoom | Self::JoinRoom | Self::CreateRoom
        )
    }
}

/// The single outstanding-request register.
#[derive(Debug, Default)]
pub struct PendingOperation {
    current: Option<Operation>,
}

impl PendingOperation {
    pub fn new() -> Self {
        Self::default()
    }

    /// The operation currently awaited, if any.
    pub fn current(&self) -> Option<Operation> {
        self.current
    }

    pub fn is_idle(&self) -> bool {
        self.current.is_none()
    }

    /// Issue `op` through `issue` if nothing is pending.
    ///
    /// The slot is only occupied when `issue` succeeds. When another
    /// operation is pending, `issue` is never called.
    ///
    /// # Errors
    ///
    /// Returns [`LobbyError::OperationPending`] when the slot is occupied, or
    /// whatever `issue` returned.
    pub fn try_begin(&mut self, op: Operation, issue: impl FnOnce() -> Result<()>) -> Result<()> {
        if let Some(current) = self.current {
            return Err(LobbyError::OperationPending(current));
        }
        issue()?;
        self.current = Some(op);
        Ok(())
    }

    /// Clear and return the pending operation if `kind` answers it.
    pub fn complete_if(&mut self, kind: ResponseKind) -> Option<Operation> {
        match self.current {
            Some(op) if kind.accepts(op) => self.current.take(),
            _ => None,
        }
    }

    /// Clear the slot unconditionally.
    pub fn clear(&mut self) -> Option<Operation> {
        self.current.take()
    }
}

/// What a delivered [`OperationResult`] completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// A correlated response, or an unsolicited disconnect confirmation.
    Operation(Operation),
    /// A connection-level error. Whatever was pending has been abandoned.
    ConnectionError { abandoned: Option<Operation> },
}

/// Payload of the generic operation-result callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationResult {
    pub completion: Completion,
    /// Raw backend code; `0` means success. See [`ErrorCode`](crate::ErrorCode).
    pub error_code: i32,
    pub error_message: String,
    /// `None` stands for "no actor".
    pub actor_id: Option<ActorId>,
}

impl OperationResult {
    pub fn is_success(&self) -> bool {
        self.error_code == 0
    }

    /// The operation this result answers, if it is not a connection error.
    pub fn operation(&self) -> Option<Operation> {
        match self.completion {
            Completion::Operation(op) => Some(op),
            Completion::ConnectionError { .. } => None,
        }
    }

    /// Actor id with [`NO_ACTOR`] standing in for `None`.
    pub fn actor_id_or_sentinel(&self) -> i32 {
        self.actor_id.unwrap_or(NO_ACTOR)
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

    const ALL_OPS: [Operation; 9] = [
        Operation::Connect,
        Operation::Reconnect,
        Operation::Disconnect,
        Operation::LeaveRoom,
        Operation::JoinRandomRoom,
        Operation::JoinRandomOrCreateRoom,
        Operation::JoinRoom,
        Operation::JoinOrCreateRoom,
        Operation::CreateRoom,
    ];

    #[test]
    fn join_response_answers_both_join_operations() {
        assert!(ResponseKind::JoinRoom.accepts(Operation::JoinRoom));
        assert!(ResponseKind::JoinRoom.accepts(Operation::JoinOrCreateRoom));
        assert!(!ResponseKind::JoinRoom.accepts(Operation::CreateRoom));
        assert!(ResponseKind::JoinRandomRoom.accepts(Operation::JoinRandomOrCreateRoom));
        assert!(!ResponseKind::CreateRoom.accepts(Operation::JoinRoom));
    }

    #[test]
    fn disconnect_is_never_answered_by_a_response_kind() {
        for kind in [
            ResponseKind::LobbyReached,
            ResponseKind::RoomRejoined,
            ResponseKind::LeaveRoom,
            ResponseKind::JoinRandomRoom,
            ResponseKind::JoinRoom,
            ResponseKind::CreateRoom,
        ] {
            assert!(!kind.accepts(Operation::Disconnect), "{kind:?}");
        }
    }

    #[test]
    fn second_begin_is_rejected_without_issuing() {
        let mut slot = PendingOperation::new();
        slot.try_begin(Operation::JoinRoom, || Ok(())).unwrap();

        for op in ALL_OPS {
            let mut issued = false;
            let err = slot
                .try_begin(op, || {
                    issued = true;
                    Ok(())
                })
                .unwrap_err();
            assert!(matches!(err, LobbyError::OperationPending(Operation::JoinRoom)));
            assert!(!issued);
        }
        assert_eq!(slot.current(), Some(Operation::JoinRoom));
    }

    #[test]
    fn failed_issue_leaves_slot_empty() {
        let mut slot = PendingOperation::new();
        let err = slot
            .try_begin(Operation::Connect, || Err(LobbyError::Rejected("offline".into())))
            .unwrap_err();
        assert!(matches!(err, LobbyError::Rejected(_)));
        assert!(slot.is_idle());
    }

    #[test]
    fn complete_if_only_clears_matching_kind() {
        let mut slot = PendingOperation::new();
        slot.try_begin(Operation::JoinRoom, || Ok(())).unwrap();

        assert_eq!(slot.complete_if(ResponseKind::CreateRoom), None);
        assert_eq!(slot.current(), Some(Operation::JoinRoom));

        assert_eq!(slot.complete_if(ResponseKind::JoinRoom), Some(Operation::JoinRoom));
        assert!(slot.is_idle());
        assert_eq!(slot.complete_if(ResponseKind::JoinRoom), None);
    }

    #[test]
    fn sentinel_actor_id() {
        let result = OperationResult {
            completion: Completion::ConnectionError { abandoned: None },
            error_code: -1,
            error_message: "lost".into(),
            actor_id: None,
        };
        assert_eq!(result.actor_id_or_sentinel(), NO_ACTOR);
        assert_eq!(result.operation(), None);
        assert!(!result.is_success());
    }
}
