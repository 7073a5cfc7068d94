//! Wire-level types for Portcullis.
//!
//! This crate defines what a room join looks like on its way in and on
//! its way out:
//!
//! - **Identifiers** ([`UserId`], [`RoomId`], [`RoomIdOrAlias`],
//!   [`ServerName`]): opaque Matrix identifiers, passed through as-is.
//! - **Requests** ([`JoinRequest`], [`JoinRequestBuilder`]): the
//!   normalized join request assembled from raw client input.
//! - **Responses** ([`JoinResponse`], [`ResponseStatus`], [`ErrorBody`]):
//!   what the caller finally sees, independent of how it is served.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): bytes in, bytes out.
//!
//! # Architecture
//!
//! The protocol layer knows nothing about sessions, membership, or
//! deadlines. The layers above it build on these types.
//!
//! ```text
//! HTTP (bytes) → Protocol (JoinRequest / JoinResponse) → Orchestration
//! ```

mod codec;
mod error;
mod ids;
mod request;
mod response;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use ids::{
    Content, Profile, RoomId, RoomIdOrAlias, RoomIdOrAliasKind, ServerName,
    UserId,
};
pub use request::{JoinRequest, JoinRequestBuilder};
pub use response::{
    ErrorBody, ErrorCode, JoinResponse, ResponsePayload, ResponseStatus,
};
