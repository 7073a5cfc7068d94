//! Configuration for the in-memory membership backend.

use std::time::Duration;

use portcullis_protocol::ServerName;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// LocalMembershipConfig
// ---------------------------------------------------------------------------

/// Configuration for [`LocalMembership`](crate::LocalMembership).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalMembershipConfig {
    /// Our own server name. Room IDs are minted under it, and it is the
    /// only server the backend can join through.
    pub server_name: ServerName,

    /// Artificial delay before every join is processed. Stands in for a
    /// federation round-trip; zero in tests unless a test wants a slow
    /// join.
    pub join_latency: Duration,

    /// Capacity of the actor's command channel.
    pub channel_size: usize,
}

impl Default for LocalMembershipConfig {
    fn default() -> Self {
        Self {
            server_name: ServerName::new("localhost"),
            join_latency: Duration::ZERO,
            channel_size: 64,
        }
    }
}

// ---------------------------------------------------------------------------
// Room settings
// ---------------------------------------------------------------------------

/// Who may join a room without an invite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum JoinRule {
    /// Anyone may join.
    #[default]
    Public,
    /// Only invited users may join.
    Invite,
}

/// Per-room settings, fixed at creation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoomSettings {
    pub join_rule: JoinRule,

    /// Whether guest accounts may join.
    pub guest_access: bool,

    /// Aliases to register for the room, e.g. `#foo:example.org`.
    pub aliases: Vec<String>,
}

impl RoomSettings {
    /// A public room reachable through `alias`.
    pub fn public(alias: impl Into<String>) -> Self {
        Self {
            aliases: vec![alias.into()],
            ..Self::default()
        }
    }

    /// An invite-only room reachable through `alias`.
    pub fn invite_only(alias: impl Into<String>) -> Self {
        Self {
            join_rule: JoinRule::Invite,
            ..Self::public(alias)
        }
    }

    /// Allows guests in.
    pub fn with_guest_access(mut self) -> Self {
        self.guest_access = true;
        self
    }
}
