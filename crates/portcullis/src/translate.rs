//! Maps supervised join results onto client responses.

use portcullis_protocol::{ErrorCode, JoinResponse};
use portcullis_room::{JoinOutcome, PerformError, PerformErrorCode};

use crate::SupervisedResult;

/// Advisory sent when the deadline passes before the join finishes.
pub const BACKGROUND_JOIN_MESSAGE: &str =
    "The room join will continue in the background.";

/// Sent when the joining user has no profile record.
pub const PROFILE_MISSING_MESSAGE: &str =
    "Unable to query user profile, no profile found.";

/// Client-facing text for failures on our side. The real cause stays in
/// the logs.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Builds the response for a supervised join.
///
/// `is_guest` only matters for "not allowed" refusals, which guests get
/// with their own error code.
pub fn translate(result: SupervisedResult, is_guest: bool) -> JoinResponse {
    match result {
        SupervisedResult::DeadlineExceeded => {
            JoinResponse::accepted(BACKGROUND_JOIN_MESSAGE)
        }
        SupervisedResult::Completed(JoinOutcome::Success { room_id }) => {
            JoinResponse::joined(room_id)
        }
        SupervisedResult::Completed(JoinOutcome::DomainError(err)) => {
            translate_refusal(err, is_guest)
        }
        // Already logged by the dispatcher. The cause rides along for
        // callers that want it.
        SupervisedResult::Completed(JoinOutcome::TransportError(e)) => {
            JoinResponse::internal_error(INTERNAL_ERROR_MESSAGE).with_cause(e)
        }
    }
}

/// The response for a join aborted because the user has no profile.
pub fn profile_missing() -> JoinResponse {
    JoinResponse::internal_error(PROFILE_MISSING_MESSAGE)
}

fn translate_refusal(err: PerformError, is_guest: bool) -> JoinResponse {
    let PerformError { code, message } = err;
    let (http_status, errcode) = match code {
        PerformErrorCode::NotAllowed if is_guest => {
            return JoinResponse::guest_forbidden(message);
        }
        PerformErrorCode::NotAllowed | PerformErrorCode::NoOperation => {
            (403, ErrorCode::Forbidden)
        }
        PerformErrorCode::BadRequest => (400, ErrorCode::Unknown),
        PerformErrorCode::NoRoom => (404, ErrorCode::NotFound),
        PerformErrorCode::Remote { status } => {
            (remote_status(status), ErrorCode::Unknown)
        }
    };
    JoinResponse::domain_error(http_status, errcode, message)
}

/// A remote server's status is passed through when it is a usable HTTP
/// error status. Anything else becomes 500.
fn remote_status(status: Option<u16>) -> u16 {
    match status {
        Some(s) if (400..=599).contains(&s) => s,
        _ => 500,
    }
}
