//! Client-facing responses.
//!
//! A [`JoinResponse`] is the single answer a caller gets for a join.
//! It carries a coarse [`ResponseStatus`] for the code that consumes it,
//! the HTTP status it maps to, and a JSON payload in Matrix's shapes:
//! `{"room_id": ...}` on success, `{"errcode": ..., "error": ...}`
//! otherwise.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::RoomId;

/// Matrix standard error codes used by the join endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    #[serde(rename = "M_UNKNOWN")]
    Unknown,
    #[serde(rename = "M_FORBIDDEN")]
    Forbidden,
    #[serde(rename = "M_NOT_FOUND")]
    NotFound,
    #[serde(rename = "M_GUEST_ACCESS_FORBIDDEN")]
    GuestAccessForbidden,
    #[serde(rename = "M_MISSING_TOKEN")]
    MissingToken,
    #[serde(rename = "M_UNKNOWN_TOKEN")]
    UnknownToken,
}

impl ErrorCode {
    /// The wire form, e.g. `"M_FORBIDDEN"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "M_UNKNOWN",
            Self::Forbidden => "M_FORBIDDEN",
            Self::NotFound => "M_NOT_FOUND",
            Self::GuestAccessForbidden => "M_GUEST_ACCESS_FORBIDDEN",
            Self::MissingToken => "M_MISSING_TOKEN",
            Self::UnknownToken => "M_UNKNOWN_TOKEN",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The standard Matrix error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub errcode: ErrorCode,
    pub error: String,
}

impl ErrorBody {
    pub fn new(errcode: ErrorCode, error: impl Into<String>) -> Self {
        Self {
            errcode,
            error: error.into(),
        }
    }
}

/// The JSON payload of a [`JoinResponse`].
///
/// `untagged` so each variant serializes as its bare fields, which is
/// what Matrix clients expect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponsePayload {
    /// The join completed.
    Joined { room_id: RoomId },
    /// Anything else, including the "still working" answer.
    Error(ErrorBody),
}

/// Coarse classification of a join response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseStatus {
    /// The user is in the room.
    Ok,
    /// The join is still running in the background. Not an error.
    Accepted,
    /// A guest was refused with the guest-specific error.
    Forbidden,
    /// The membership service refused the join for a stated reason.
    DomainError,
    /// Something broke on our side.
    InternalError,
}

impl fmt::Display for ResponseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "ok"),
            Self::Accepted => write!(f, "accepted"),
            Self::Forbidden => write!(f, "forbidden"),
            Self::DomainError => write!(f, "domain-error"),
            Self::InternalError => write!(f, "internal-error"),
        }
    }
}

/// The final answer to a join request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinResponse {
    pub status: ResponseStatus,
    /// HTTP status code this response is served with.
    pub http_status: u16,
    pub payload: ResponsePayload,
    /// Diagnostic detail for internal errors. Logged, never sent to the
    /// client.
    pub cause: Option<String>,
}

impl JoinResponse {
    /// 200 with the joined room's ID.
    pub fn joined(room_id: RoomId) -> Self {
        Self {
            status: ResponseStatus::Ok,
            http_status: 200,
            payload: ResponsePayload::Joined { room_id },
            cause: None,
        }
    }

    /// 202: the join continues in the background.
    pub fn accepted(message: impl Into<String>) -> Self {
        Self::error(
            ResponseStatus::Accepted,
            202,
            ErrorCode::Unknown,
            message,
        )
    }

    /// 403 with the guest-specific error code.
    pub fn guest_forbidden(message: impl Into<String>) -> Self {
        Self::error(
            ResponseStatus::Forbidden,
            403,
            ErrorCode::GuestAccessForbidden,
            message,
        )
    }

    /// A refusal reported by the membership service.
    pub fn domain_error(
        http_status: u16,
        errcode: ErrorCode,
        message: impl Into<String>,
    ) -> Self {
        Self::error(ResponseStatus::DomainError, http_status, errcode, message)
    }

    /// 500 with `M_UNKNOWN`.
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::error(
            ResponseStatus::InternalError,
            500,
            ErrorCode::Unknown,
            message,
        )
    }

    /// Attaches diagnostic detail to the response.
    pub fn with_cause(mut self, cause: impl fmt::Display) -> Self {
        self.cause = Some(cause.to_string());
        self
    }

    /// The joined room, if the join completed.
    pub fn room_id(&self) -> Option<&RoomId> {
        match &self.payload {
            ResponsePayload::Joined { room_id } => Some(room_id),
            ResponsePayload::Error(_) => None,
        }
    }

    /// The error body, for every response that isn't a completed join.
    pub fn error_body(&self) -> Option<&ErrorBody> {
        match &self.payload {
            ResponsePayload::Joined { .. } => None,
            ResponsePayload::Error(body) => Some(body),
        }
    }

    fn error(
        status: ResponseStatus,
        http_status: u16,
        errcode: ErrorCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            status,
            http_status,
            payload: ResponsePayload::Error(ErrorBody::new(errcode, message)),
            cause: None,
        }
    }
}
