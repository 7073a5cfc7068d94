//! Matrix identifiers and the small value types that travel with a join.
//!
//! Identifiers are opaque here. Portcullis passes them through to the
//! membership service untouched; checking that `!abc:example.org` is a
//! well-formed room ID is the membership service's job, not ours.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Membership event content: a JSON object with arbitrary keys.
///
/// This is what ends up in the `content` of the user's `m.room.member`
/// event, so it keeps whatever the client sent plus the profile fields
/// added during enrichment.
pub type Content = serde_json::Map<String, serde_json::Value>;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A fully-qualified Matrix user ID, e.g. `@alice:example.org`.
///
/// Newtype wrapper so a user ID can never be passed where a room ID is
/// expected. `#[serde(transparent)]` keeps the JSON form a plain string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Wraps a raw user ID string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the raw string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A concrete room ID, e.g. `!abc123:example.org`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    /// Wraps a raw room ID string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the raw string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The name of a homeserver, e.g. `example.org` or `matrix.org:8448`.
///
/// Used for the `server_name` hints a client can attach to a join.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServerName(String);

impl ServerName {
    /// Wraps a raw server name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the raw string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ServerName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ServerName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

// ---------------------------------------------------------------------------
// RoomIdOrAlias
// ---------------------------------------------------------------------------

/// What a client puts in the join path: either a room ID or an alias.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomIdOrAlias(String);

/// The kind of identifier a [`RoomIdOrAlias`] holds, judged by its sigil.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomIdOrAliasKind {
    /// Starts with `!`.
    RoomId,
    /// Starts with `#`.
    Alias,
    /// Anything else. The membership service decides what to do with it.
    Unknown,
}

impl RoomIdOrAlias {
    /// Wraps the raw path segment.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the raw string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Classifies the identifier by its leading sigil.
    pub fn kind(&self) -> RoomIdOrAliasKind {
        match self.0.chars().next() {
            Some('!') => RoomIdOrAliasKind::RoomId,
            Some('#') => RoomIdOrAliasKind::Alias,
            _ => RoomIdOrAliasKind::Unknown,
        }
    }
}

impl fmt::Display for RoomIdOrAlias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomIdOrAlias {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for RoomIdOrAlias {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl From<RoomId> for RoomIdOrAlias {
    fn from(room_id: RoomId) -> Self {
        Self(room_id.0)
    }
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

/// A read-only snapshot of a user's public profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Human-readable display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub displayname: Option<String>,
    /// `mxc://` URI of the avatar.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}
