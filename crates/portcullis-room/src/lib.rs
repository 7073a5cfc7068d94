//! Room membership for Portcullis.
//!
//! Joining a room is owned by a membership service: creating the join
//! event, talking to remote servers, resolving state. Portcullis only
//! talks to it through the [`MembershipService`] trait.
//!
//! # Key types
//!
//! - [`MembershipService`]: the contract a membership backend implements
//! - [`dispatch`]: runs one join attempt and classifies the result as a
//!   [`JoinOutcome`]
//! - [`PerformError`]: a refusal with a reason (not allowed, no such room, ...)
//! - [`MembershipError`]: the service itself failed
//! - [`LocalMembership`]: an in-memory backend, one actor task owning
//!   every room

mod config;
mod dispatch;
mod error;
mod local;
mod service;

pub use config::{JoinRule, LocalMembershipConfig, RoomSettings};
pub use dispatch::{JoinOutcome, dispatch};
pub use error::{MembershipError, PerformError, PerformErrorCode, RoomError};
pub use local::{LocalMembership, Member};
pub use service::{MembershipService, PerformJoinResponse};
