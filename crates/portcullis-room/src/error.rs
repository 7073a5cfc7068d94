//! Error types for the membership layer.
//!
//! Two very different things can go wrong with a join, and they get
//! different types:
//!
//! - [`PerformError`]: the service worked and said *no*. This is a
//!   value the caller gets to see.
//! - [`MembershipError`]: the service didn't work. This becomes an
//!   internal error.

use std::fmt;

use portcullis_protocol::RoomId;

/// Why a membership service refused a join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerformErrorCode {
    /// The user may not join (invite-only room, guest access off, banned).
    NotAllowed,
    /// The request itself was malformed.
    BadRequest,
    /// The room or alias does not exist.
    NoRoom,
    /// There is nothing to do.
    NoOperation,
    /// A remote server refused or failed. `status` is the HTTP status
    /// it answered with, `None` if it never answered.
    Remote { status: Option<u16> },
}

impl fmt::Display for PerformErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAllowed => write!(f, "not-allowed"),
            Self::BadRequest => write!(f, "bad-request"),
            Self::NoRoom => write!(f, "no-room"),
            Self::NoOperation => write!(f, "no-operation"),
            Self::Remote { status: Some(s) } => write!(f, "remote({s})"),
            Self::Remote { status: None } => write!(f, "remote"),
        }
    }
}

/// A domain-level refusal reported by the membership service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct PerformError {
    pub code: PerformErrorCode,
    pub message: String,
}

impl PerformError {
    pub fn new(code: PerformErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn not_allowed(message: impl Into<String>) -> Self {
        Self::new(PerformErrorCode::NotAllowed, message)
    }

    pub fn no_room(message: impl Into<String>) -> Self {
        Self::new(PerformErrorCode::NoRoom, message)
    }
}

/// The membership service could not be reached or failed internally.
#[derive(Debug, thiserror::Error)]
pub enum MembershipError {
    /// The service is gone (shut down, channel closed).
    #[error("membership service unavailable")]
    Unavailable,

    /// The service failed while handling the request.
    #[error("membership request failed: {0}")]
    Internal(String),

    /// The background join task ended without reporting an outcome.
    #[error("join worker stopped before reporting an outcome")]
    WorkerLost,
}

/// Errors from administrative operations on [`LocalMembership`](crate::LocalMembership).
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room does not exist.
    #[error("room {0} not found")]
    NotFound(RoomId),

    /// The alias already points at a room.
    #[error("alias {0} is already in use")]
    AliasInUse(String),

    /// The backend's command channel is closed.
    #[error("membership backend is unavailable")]
    Unavailable,
}
