//! Join dispatch: one attempt, one classified outcome.

use portcullis_protocol::{JoinRequest, RoomId};

use crate::{MembershipError, MembershipService, PerformError, PerformJoinResponse};

/// The result of a single join attempt.
///
/// Exactly one of these is produced per dispatched request.
#[derive(Debug)]
pub enum JoinOutcome {
    /// The user joined `room_id`.
    Success { room_id: RoomId },
    /// The membership service refused the join.
    DomainError(PerformError),
    /// The membership service failed.
    TransportError(MembershipError),
}

/// Hands `request` to the membership service and classifies the answer.
///
/// No retries: a failed attempt is reported as-is. The request is taken
/// by value so that once a join is dispatched, nothing else can read or
/// change it.
pub async fn dispatch<M>(membership: &M, request: JoinRequest) -> JoinOutcome
where
    M: MembershipService,
{
    tracing::debug!(
        user_id = %request.user_id,
        room = %request.room_id_or_alias,
        server_names = request.server_names.len(),
        "dispatching join"
    );

    match membership.perform_join(&request).await {
        Ok(PerformJoinResponse::Joined {
            room_id,
            joined_via,
        }) => {
            tracing::info!(
                user_id = %request.user_id,
                %room_id,
                joined_via = ?joined_via.as_ref().map(|s| s.as_str()),
                "join succeeded"
            );
            JoinOutcome::Success { room_id }
        }
        Ok(PerformJoinResponse::Rejected(err)) => {
            tracing::info!(
                user_id = %request.user_id,
                room = %request.room_id_or_alias,
                error = %err,
                "join rejected"
            );
            JoinOutcome::DomainError(err)
        }
        Err(e) => {
            tracing::error!(
                user_id = %request.user_id,
                room = %request.room_id_or_alias,
                error = %e,
                "membership service failed"
            );
            JoinOutcome::TransportError(e)
        }
    }
}
