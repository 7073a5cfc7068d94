//! Caller identity for Portcullis.
//!
//! This crate answers two questions about whoever is asking to join a
//! room:
//!
//! 1. **Who are you?** An access token resolves to a [`Device`] through
//!    the [`Authenticator`] trait. [`TokenRegistry`] is the in-memory
//!    implementation.
//! 2. **What do you look like?** A user's [`Profile`] comes from the
//!    [`ProfileService`] trait. [`ProfileStore`] is the in-memory
//!    implementation.
//!
//! # How it fits in the stack
//!
//! ```text
//! Orchestration (above)  ← needs the caller's identity and profile
//!     ↕
//! Session Layer (this crate)
//!     ↕
//! Protocol Layer (below)  ← provides UserId, Profile
//! ```
//!
//! [`Profile`]: portcullis_protocol::Profile

mod auth;
mod device;
mod error;
mod profile;

pub use auth::{Authenticator, TokenRegistry};
pub use device::{AccountType, Device};
pub use error::{ProfileError, SessionError};
pub use profile::{ProfileService, ProfileStore};
