//! Numeric error codes reported by the matchmaking backend.
//!
//! Operation results and connection errors carry these codes as raw `i32`
//! values so that codes unknown to this crate still reach the host. Use
//! [`ErrorCode::from_code`] to interpret them.

use std::fmt;

/// Error codes returned by the matchmaking backend or synthesized by the
/// relay client.
///
/// `0` always means success. Negative values in `-1..=-3` are generic
/// backend failures; values at or below `-100` never come from the backend
/// and are produced locally when a connection fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ErrorCode {
    Ok = 0,

    // Generic backend errors
    InternalServerError = -1,
    InvalidOperationCode = -2,
    OperationNotAllowedInCurrentState = -3,

    // Authentication errors
    InvalidAuthentication = 32767,
    CustomAuthenticationFailed = 32755,
    AuthenticationTicketExpired = 32753,
    InvalidRegion = 32756,
    MaxCcuReached = 32757,

    // Matchmaking errors
    GameIdAlreadyExists = 32766,
    GameFull = 32765,
    GameClosed = 32764,
    ServerFull = 32762,
    UserBlocked = 32761,
    NoRandomMatchFound = 32760,
    GameDoesNotExist = 32758,

    // Join conflicts
    JoinFailedPeerAlreadyJoined = 32750,
    JoinFailedFoundInactiveJoiner = 32749,
    JoinFailedWithRejoinerNotFound = 32748,
    JoinFailedFoundExcludedUserId = 32747,
    JoinFailedFoundActiveJoiner = 32746,

    // Rate limiting
    OperationLimitReached = 32743,

    // Client-side connection errors
    TransportClosed = -100,
    ConnectFailed = -101,
}

impl ErrorCode {
    /// Every known code, in declaration order.
    pub const ALL: [ErrorCode; 24] = [
        Self::Ok,
        Self::InternalServerError,
        Self::InvalidOperationCode,
        Self::OperationNotAllowedInCurrentState,
        Self::InvalidAuthentication,
        Self::CustomAuthenticationFailed,
        Self::AuthenticationTicketExpired,
        Self::InvalidRegion,
        Self::MaxCcuReached,
        Self::GameIdAlreadyExists,
        Self::GameFull,
        Self::GameClosed,
        Self::ServerFull,
        Self::UserBlocked,
        Self::NoRandomMatchFound,
        Self::GameDoesNotExist,
        Self::JoinFailedPeerAlreadyJoined,
        Self::JoinFailedFoundInactiveJoiner,
        Self::JoinFailedWithRejoinerNotFound,
        Self::JoinFailedFoundExcludedUserId,
        Self::JoinFailedFoundActiveJoiner,
        Self::OperationLimitReached,
        Self::TransportClosed,
        Self::ConnectFailed,
    ];

    /// The raw numeric value carried on the wire and in callbacks.
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Look up a known code. Returns `None` for codes this crate does not name.
    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.code() == code)
    }

    /// Returns `true` for [`ErrorCode::Ok`].
    pub fn is_ok(self) -> bool {
        self == Self::Ok
    }

    /// Returns a human-readable description of this error code.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Ok => "The operation completed successfully.",

            Self::InternalServerError => {
                "The server failed to process the request. Please try again later."
            }
            Self::InvalidOperationCode => {
                "The server does not know this operation. Check that client and server versions match."
            }
            Self::OperationNotAllowedInCurrentState => {
                "The operation is not allowed in the current state, e.g. joining a room before reaching the lobby."
            }

            Self::InvalidAuthentication => {
                "The application id is unknown or not valid for this server."
            }
            Self::CustomAuthenticationFailed => {
                "Custom authentication was rejected by the authentication service."
            }
            Self::AuthenticationTicketExpired => {
                "The authentication ticket has expired. Connect again to obtain a new one."
            }
            Self::InvalidRegion => "The requested region is not available for this application.",
            Self::MaxCcuReached => {
                "The concurrent user limit of this application has been reached."
            }

            Self::GameIdAlreadyExists => {
                "A room with this name already exists. Choose another name or join it instead."
            }
            Self::GameFull => "The room has reached its maximum player count.",
            Self::GameClosed => "The room is closed and does not accept new players.",
            Self::ServerFull => "The server is full. Please try again later.",
            Self::UserBlocked => "This user is blocked by the server.",
            Self::NoRandomMatchFound => {
                "No open room matched the filter. Create a room or retry later."
            }
            Self::GameDoesNotExist => {
                "The room does not exist. It may have been closed or never created."
            }

            Self::JoinFailedPeerAlreadyJoined => {
                "This connection is already joined to the room."
            }
            Self::JoinFailedFoundInactiveJoiner => {
                "This user is inactive in the room. Rejoin instead of joining."
            }
            Self::JoinFailedWithRejoinerNotFound => {
                "No inactive slot for this user was found, so the room cannot be rejoined."
            }
            Self::JoinFailedFoundExcludedUserId => {
                "This user id is excluded from the room."
            }
            Self::JoinFailedFoundActiveJoiner => {
                "Another active connection already uses this user id in the room."
            }

            Self::OperationLimitReached => {
                "Too many operations in a short time. Please slow down and try again later."
            }

            Self::TransportClosed => "The connection to the server was closed.",
            Self::ConnectFailed => "The connection to the server could not be established.",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}
