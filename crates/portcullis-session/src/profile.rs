//! User profiles.

use std::collections::HashMap;

use portcullis_protocol::{Profile, UserId};
use tokio::sync::RwLock;

use crate::ProfileError;

/// Looks up a user's public profile.
///
/// Implementations must report a missing profile as
/// [`ProfileError::NotFound`] and reserve
/// [`ProfileError::Unavailable`] for lookups that could not be answered.
/// The join path treats both the same way (the join is aborted before
/// anything is dispatched), but only `Unavailable` is worth paging
/// someone about.
///
/// ## Trait bounds explained
///
/// - `Send + Sync` → the service sits behind an `Arc` in the
///   orchestrator and is queried from every request task at once.
/// - `'static` → the orchestrator is stored in server state that lives
///   as long as the server, so the service can't borrow anything
///   shorter-lived.
///
/// ## Why `impl Future` instead of `async fn`
///
/// The method is declared as returning `impl Future<...> + Send` so the
/// `Send` bound is part of the contract. A plain `async fn` in a trait
/// makes no promise about its future, and the handler needs to hold it
/// across an `.await` inside a Tokio task. Implementors still write
/// `async fn` in their `impl` blocks; the compiler checks the bound.
pub trait ProfileService: Send + Sync + 'static {
    /// Fetches the profile of `user_id`.
    fn query_profile(
        &self,
        user_id: &UserId,
    ) -> impl std::future::Future<Output = Result<Profile, ProfileError>> + Send;
}

/// In-memory profile table.
#[derive(Debug, Default)]
pub struct ProfileStore {
    profiles: RwLock<HashMap<UserId, Profile>>,
}

impl ProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates or replaces a user's profile.
    pub async fn set(&self, user_id: UserId, profile: Profile) {
        self.profiles.write().await.insert(user_id, profile);
    }
}

impl ProfileService for ProfileStore {
    async fn query_profile(
        &self,
        user_id: &UserId,
    ) -> Result<Profile, ProfileError> {
        self.profiles
            .read()
            .await
            .get(user_id)
            .cloned()
            .ok_or_else(|| ProfileError::NotFound(user_id.clone()))
    }
}
