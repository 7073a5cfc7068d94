//! Unified error type for Portcullis.

use std::io;

use portcullis_room::RoomError;

/// Errors from setting up and running a server.
///
/// Join requests never fail with this type. Authentication, profile and
/// membership failures all end up as a response to the client, so only
/// setup and serving errors reach here.
#[derive(Debug, thiserror::Error)]
pub enum PortcullisError {
    /// Seeding or administering the in-memory membership backend failed.
    #[error(transparent)]
    Room(#[from] RoomError),

    /// The listener could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// The HTTP server stopped with an error.
    #[error("server error: {0}")]
    Serve(#[source] io::Error),
}
