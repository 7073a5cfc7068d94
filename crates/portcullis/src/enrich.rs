//! Profile enrichment: copy the joining user's display name and avatar
//! into the membership content.

use portcullis_protocol::{JoinRequest, UserId};
use portcullis_session::{ProfileError, ProfileService};
use serde_json::Value;

/// The joining user has no profile record at all.
///
/// The caller is authenticated, so their profile should exist. When it
/// doesn't, the user database is inconsistent and the join is aborted.
#[derive(Debug, thiserror::Error)]
#[error("no profile found for {0}")]
pub struct ProfileMissing(pub UserId);

/// What enrichment did to the request.
#[derive(Debug)]
pub enum Enrichment {
    /// Profile fields were copied into the content.
    Applied,
    /// The lookup failed for a reason other than a missing profile. The
    /// request goes ahead without profile fields.
    Skipped(ProfileError),
}

/// Looks up the requesting user's profile and adds `displayname` and
/// `avatar_url` to the request content.
///
/// Profile fields overwrite any the client sent. A field the profile
/// doesn't have is left as it was.
///
/// # Errors
/// [`ProfileMissing`] if the profile service reports no profile for the
/// user. Every other lookup failure is [`Enrichment::Skipped`].
pub async fn enrich_with_profile<P>(
    profiles: &P,
    request: &mut JoinRequest,
) -> Result<Enrichment, ProfileMissing>
where
    P: ProfileService,
{
    match profiles.query_profile(&request.user_id).await {
        Ok(profile) => {
            if let Some(name) = profile.displayname {
                request
                    .content
                    .insert("displayname".to_string(), Value::String(name));
            }
            if let Some(url) = profile.avatar_url {
                request
                    .content
                    .insert("avatar_url".to_string(), Value::String(url));
            }
            Ok(Enrichment::Applied)
        }
        Err(ProfileError::NotFound(user_id)) => Err(ProfileMissing(user_id)),
        Err(e) => {
            tracing::warn!(
                user_id = %request.user_id,
                error = %e,
                "profile lookup failed, joining without profile"
            );
            Ok(Enrichment::Skipped(e))
        }
    }
}
