//! The normalized join request and its builder.
//!
//! A [`JoinRequest`] is assembled from raw client input by
//! [`JoinRequestBuilder`], optionally enriched with profile data, and
//! then *moved* into the background join task. Nothing touches it after
//! that handoff, which is what keeps the worker free of shared state.

use crate::{Codec, Content, JsonCodec, RoomIdOrAlias, ServerName, UserId};

/// A request to join a room, ready to be handed to the membership service.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinRequest {
    /// Room ID or alias exactly as the client sent it.
    pub room_id_or_alias: RoomIdOrAlias,

    /// The user who wants to join.
    pub user_id: UserId,

    /// Whether the user is a guest account.
    pub is_guest: bool,

    /// Servers to try when joining over federation, in priority order.
    pub server_names: Vec<ServerName>,

    /// Membership event content: the client's body plus enrichment.
    pub content: Content,
}

/// Builds a [`JoinRequest`] from raw client input.
///
/// The builder never fails. Anything it can't make sense of (a body that
/// isn't a JSON object, say) is dropped and the request carries on
/// without it.
///
/// ```rust
/// use portcullis_protocol::{JoinRequestBuilder, UserId};
///
/// let request = JoinRequestBuilder::new("#foo:example.org", UserId::new("@alice:example.org"))
///     .server_names(["example.org", "matrix.org"])
///     .body(br#"{"reason":"hello"}"#)
///     .build();
///
/// assert_eq!(request.server_names.len(), 2);
/// assert_eq!(request.content["reason"], "hello");
/// ```
#[derive(Debug)]
pub struct JoinRequestBuilder {
    request: JoinRequest,
}

impl JoinRequestBuilder {
    /// Starts a request with empty content, no server hints, non-guest.
    pub fn new(
        room_id_or_alias: impl Into<RoomIdOrAlias>,
        user_id: UserId,
    ) -> Self {
        Self {
            request: JoinRequest {
                room_id_or_alias: room_id_or_alias.into(),
                user_id,
                is_guest: false,
                server_names: Vec::new(),
                content: Content::new(),
            },
        }
    }

    /// Marks the requesting user as a guest (or not).
    pub fn guest(mut self, is_guest: bool) -> Self {
        self.request.is_guest = is_guest;
        self
    }

    /// Appends server-name hints, keeping the order they were given in.
    ///
    /// Can be called more than once; later hints go after earlier ones.
    pub fn server_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ServerName>,
    {
        self.request
            .server_names
            .extend(names.into_iter().map(Into::into));
        self
    }

    /// Merges the top-level keys of a JSON object body into the content.
    ///
    /// An empty body is a no-op. A body that isn't a JSON object is
    /// ignored.
    pub fn body(mut self, body: &[u8]) -> Self {
        if body.is_empty() {
            return self;
        }

        match JsonCodec.decode::<Content>(body) {
            Ok(fields) => self.request.content.extend(fields),
            Err(e) => {
                tracing::debug!(
                    error = %e,
                    "join body is not a JSON object, ignoring"
                );
            }
        }
        self
    }

    /// Finishes the request.
    pub fn build(self) -> JoinRequest {
        self.request
    }
}
