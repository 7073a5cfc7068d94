//! # Portcullis
//!
//! Bounded-wait room joins for Matrix homeservers.
//!
//! Joining a room can take a long time: the room may live on another
//! server, and the join may need several federation round-trips.
//! Portcullis starts the join on a detached task, waits up to a deadline
//! (20 seconds by default), and then answers the client with either the
//! real result or "the join will continue in the background". The join
//! itself is never cancelled.
//!
//! The pipeline for one request:
//!
//! ```text
//! JoinRequestBuilder → enrich_with_profile → JoinSupervisor → translate
//!        (build)            (profile)        (dispatch + wait)  (respond)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use portcullis::prelude::*;
//!
//! # async fn run() -> Result<(), PortcullisError> {
//! let membership = Arc::new(LocalMembership::spawn(LocalMembershipConfig::default()));
//! let profiles = Arc::new(ProfileStore::new());
//! let tokens = TokenRegistry::new();
//!
//! let server = PortcullisServer::builder()
//!     .bind("0.0.0.0:8008")
//!     .build(tokens, membership, profiles)
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod enrich;
mod error;
mod handler;
mod orchestrator;
mod server;
mod supervisor;
mod translate;

pub use config::{DEFAULT_JOIN_DEADLINE, JoinConfig};
pub use enrich::{Enrichment, ProfileMissing, enrich_with_profile};
pub use error::PortcullisError;
pub use orchestrator::JoinOrchestrator;
pub use server::{PortcullisServer, PortcullisServerBuilder, router};
pub use supervisor::{JoinSupervisor, SupervisedResult};
pub use translate::{
    BACKGROUND_JOIN_MESSAGE, INTERNAL_ERROR_MESSAGE, PROFILE_MISSING_MESSAGE,
    profile_missing, translate,
};

/// Convenient re-exports for typical usage.
///
/// ```rust
/// use portcullis::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        JoinConfig, JoinOrchestrator, PortcullisError, PortcullisServer,
    };
    pub use portcullis_protocol::{
        JoinResponse, ResponseStatus, RoomId, RoomIdOrAlias, ServerName,
        UserId,
    };
    pub use portcullis_room::{
        LocalMembership, LocalMembershipConfig, MembershipService,
        RoomSettings,
    };
    pub use portcullis_session::{
        AccountType, Authenticator, Device, ProfileService, ProfileStore,
        TokenRegistry,
    };
}
