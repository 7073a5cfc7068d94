//! Error types for the session layer.

use portcullis_protocol::UserId;

/// Errors that can occur while identifying the caller.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The request carried no access token at all.
    #[error("missing access token")]
    MissingToken,

    /// The access token is not one we issued, or it was revoked.
    #[error("unrecognised access token")]
    UnknownToken,
}

/// Errors returned by a [`ProfileService`](crate::ProfileService).
///
/// `NotFound` is singled out because the join flow treats it very
/// differently from every other failure: an authenticated user with no
/// profile record means the user database is inconsistent.
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    /// No profile exists for this user.
    #[error("no profile found for {0}")]
    NotFound(UserId),

    /// The profile backend could not answer (timeout, connection lost,
    /// remote server down, ...).
    #[error("profile lookup failed: {0}")]
    Unavailable(String),
}
