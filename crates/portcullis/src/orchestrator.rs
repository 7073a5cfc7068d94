//! The join pipeline: build, enrich, supervise, translate.

use std::sync::Arc;

use portcullis_protocol::{
    JoinRequestBuilder, JoinResponse, RoomIdOrAlias, ServerName,
};
use portcullis_room::MembershipService;
use portcullis_session::{Device, ProfileService};

use crate::enrich::enrich_with_profile;
use crate::translate::{profile_missing, translate};
use crate::{JoinConfig, JoinSupervisor};

/// Handles room joins for authenticated callers.
///
/// Both collaborators are injected. Cloning is cheap and all clones
/// share the same supervisor.
pub struct JoinOrchestrator<M, P> {
    supervisor: JoinSupervisor<M>,
    profiles: Arc<P>,
}

impl<M, P> Clone for JoinOrchestrator<M, P> {
    fn clone(&self) -> Self {
        Self {
            supervisor: self.supervisor.clone(),
            profiles: Arc::clone(&self.profiles),
        }
    }
}

impl<M, P> JoinOrchestrator<M, P>
where
    M: MembershipService,
    P: ProfileService,
{
    pub fn new(membership: Arc<M>, profiles: Arc<P>, config: JoinConfig) -> Self {
        let config = config.validated();
        Self {
            supervisor: JoinSupervisor::new(membership, config.deadline),
            profiles,
        }
    }

    /// The supervisor running this orchestrator's joins.
    pub fn supervisor(&self) -> &JoinSupervisor<M> {
        &self.supervisor
    }

    /// Joins `device`'s user to a room and answers within the deadline.
    ///
    /// `body` is the raw request body, `server_names` the federation
    /// hints in the order the client gave them. Never fails: every
    /// outcome, including internal errors, is a [`JoinResponse`].
    pub async fn join(
        &self,
        device: &Device,
        room_id_or_alias: impl Into<RoomIdOrAlias>,
        server_names: Vec<ServerName>,
        body: &[u8],
    ) -> JoinResponse {
        let mut request =
            JoinRequestBuilder::new(room_id_or_alias, device.user_id.clone())
                .guest(device.is_guest())
                .server_names(server_names)
                .body(body)
                .build();

        if let Err(e) =
            enrich_with_profile(self.profiles.as_ref(), &mut request).await
        {
            tracing::error!(
                user_id = %device.user_id,
                error = %e,
                "authenticated user has no profile, refusing join"
            );
            return profile_missing();
        }

        let is_guest = request.is_guest;
        let result = self.supervisor.supervise(request).await;
        translate(result, is_guest)
    }
}
