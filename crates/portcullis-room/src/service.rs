//! The `MembershipService` trait, the contract every membership backend
//! implements.

use portcullis_protocol::{JoinRequest, RoomId, ServerName};

use crate::{MembershipError, PerformError};

/// What a membership service answers when it handled a join request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PerformJoinResponse {
    /// The user is now in the room.
    Joined {
        room_id: RoomId,
        /// The remote server the join went through, if any.
        joined_via: Option<ServerName>,
    },
    /// The service declined the join.
    Rejected(PerformError),
}

/// Performs room joins.
///
/// The outer `Result` separates "the service answered" from "the service
/// broke": a refusal is `Ok(PerformJoinResponse::Rejected(..))`, while
/// `Err(MembershipError)` means no answer could be produced.
///
/// Implementations must not rely on the caller waiting for them: the
/// caller may have stopped listening long before the join finishes.
/// Federation retries, if any, happen inside the service.
///
/// ## Trait bounds explained
///
/// - `Send + Sync` → one service is shared by every join worker through
///   an `Arc`, and workers run on whichever Tokio thread picks them up.
/// - `'static` → a worker is spawned with `tokio::spawn` and may outlive
///   the request that started it, so the service it holds can't borrow
///   anything tied to that request.
/// - The returned future is `Send` → it is awaited inside that spawned
///   task, and `tokio::spawn` only accepts `Send` futures.
///
/// ## Borrowing the request
///
/// `perform_join` takes `&JoinRequest`, not `JoinRequest`. The worker
/// owns the request for the whole attempt and lends it to the service,
/// so the service can't hold on to it or hand it elsewhere, and the
/// worker can still log from it once the call returns.
///
/// # Example
///
/// ```rust
/// use portcullis_protocol::{JoinRequest, RoomId};
/// use portcullis_room::{MembershipError, MembershipService, PerformJoinResponse};
///
/// /// Treats every identifier as a room id and joins immediately.
/// struct AlwaysJoins;
///
/// impl MembershipService for AlwaysJoins {
///     async fn perform_join(
///         &self,
///         request: &JoinRequest,
///     ) -> Result<PerformJoinResponse, MembershipError> {
///         Ok(PerformJoinResponse::Joined {
///             room_id: RoomId::new(request.room_id_or_alias.as_str()),
///             joined_via: None,
///         })
///     }
/// }
/// ```
pub trait MembershipService: Send + Sync + 'static {
    /// Attempts to join `request.user_id` to `request.room_id_or_alias`.
    fn perform_join(
        &self,
        request: &JoinRequest,
    ) -> impl std::future::Future<
        Output = Result<PerformJoinResponse, MembershipError>,
    > + Send;
}
