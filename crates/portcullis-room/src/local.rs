//! In-memory membership backend: a single Tokio task that owns every room.
//!
//! All room state lives inside the actor and is only touched through
//! commands on an mpsc channel. Commands that need an answer carry a
//! `oneshot::Sender` to reply on. [`LocalMembership`] is the cheap,
//! cloneable handle that sends those commands.

use std::collections::{HashMap, HashSet};

use portcullis_protocol::{
    Content, JoinRequest, RoomId, RoomIdOrAliasKind, ServerName, UserId,
};
use rand::Rng;
use rand::distr::Alphanumeric;
use tokio::sync::{mpsc, oneshot};

use crate::{
    JoinRule, LocalMembershipConfig, MembershipError, MembershipService,
    PerformError, PerformErrorCode, PerformJoinResponse, RoomError,
    RoomSettings,
};

/// Length of the random part of a minted room ID.
const ROOM_ID_LOCALPART_LEN: usize = 18;

/// A joined member and the content of their membership event.
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    pub user_id: UserId,
    pub content: Content,
}

/// Commands sent to the membership actor.
enum MembershipCommand {
    CreateRoom {
        settings: RoomSettings,
        reply: oneshot::Sender<Result<RoomId, RoomError>>,
    },
    Invite {
        room_id: RoomId,
        user_id: UserId,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    Join {
        request: JoinRequest,
        reply: oneshot::Sender<PerformJoinResponse>,
    },
    Members {
        room_id: RoomId,
        reply: oneshot::Sender<Result<Vec<Member>, RoomError>>,
    },
    Shutdown,
}

/// Handle to the in-memory membership actor.
///
/// Cloning is cheap; all clones talk to the same actor.
#[derive(Clone)]
pub struct LocalMembership {
    config: LocalMembershipConfig,
    sender: mpsc::Sender<MembershipCommand>,
}

impl LocalMembership {
    /// Spawns the actor task and returns a handle to it.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(config: LocalMembershipConfig) -> Self {
        let (tx, rx) = mpsc::channel(config.channel_size.max(1));

        let actor = MembershipActor {
            server_name: config.server_name.clone(),
            rooms: HashMap::new(),
            aliases: HashMap::new(),
            receiver: rx,
        };
        tokio::spawn(actor.run());

        Self { config, sender: tx }
    }

    /// Creates a room and registers its aliases.
    ///
    /// # Errors
    /// [`RoomError::AliasInUse`] if any alias already points at a room;
    /// the room is not created in that case.
    pub async fn create_room(
        &self,
        settings: RoomSettings,
    ) -> Result<RoomId, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(MembershipCommand::CreateRoom {
            settings,
            reply: reply_tx,
        })
        .await?;
        reply_rx.await.map_err(|_| RoomError::Unavailable)?
    }

    /// Invites a user to a room.
    pub async fn invite(
        &self,
        room_id: &RoomId,
        user_id: &UserId,
    ) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(MembershipCommand::Invite {
            room_id: room_id.clone(),
            user_id: user_id.clone(),
            reply: reply_tx,
        })
        .await?;
        reply_rx.await.map_err(|_| RoomError::Unavailable)?
    }

    /// Lists a room's joined members, sorted by user ID.
    pub async fn members(
        &self,
        room_id: &RoomId,
    ) -> Result<Vec<Member>, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(MembershipCommand::Members {
            room_id: room_id.clone(),
            reply: reply_tx,
        })
        .await?;
        reply_rx.await.map_err(|_| RoomError::Unavailable)?
    }

    /// Tells the actor to stop. Later calls fail with `Unavailable`.
    pub async fn shutdown(&self) {
        let _ = self.sender.send(MembershipCommand::Shutdown).await;
    }

    /// Our server name.
    pub fn server_name(&self) -> &ServerName {
        &self.config.server_name
    }

    async fn send(&self, cmd: MembershipCommand) -> Result<(), RoomError> {
        self.sender
            .send(cmd)
            .await
            .map_err(|_| RoomError::Unavailable)
    }
}

impl MembershipService for LocalMembership {
    async fn perform_join(
        &self,
        request: &JoinRequest,
    ) -> Result<PerformJoinResponse, MembershipError> {
        if !self.config.join_latency.is_zero() {
            tokio::time::sleep(self.config.join_latency).await;
        }

        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(MembershipCommand::Join {
                request: request.clone(),
                reply: reply_tx,
            })
            .await
            .map_err(|_| MembershipError::Unavailable)?;
        reply_rx.await.map_err(|_| MembershipError::Unavailable)
    }
}

// ---------------------------------------------------------------------------
// Actor
// ---------------------------------------------------------------------------

struct LocalRoom {
    settings: RoomSettings,
    invited: HashSet<UserId>,
    members: HashMap<UserId, Content>,
}

struct MembershipActor {
    server_name: ServerName,
    rooms: HashMap<RoomId, LocalRoom>,
    aliases: HashMap<String, RoomId>,
    receiver: mpsc::Receiver<MembershipCommand>,
}

impl MembershipActor {
    async fn run(mut self) {
        tracing::info!(server_name = %self.server_name, "membership actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                MembershipCommand::CreateRoom { settings, reply } => {
                    let _ = reply.send(self.handle_create(settings));
                }
                MembershipCommand::Invite {
                    room_id,
                    user_id,
                    reply,
                } => {
                    let _ = reply.send(self.handle_invite(room_id, user_id));
                }
                MembershipCommand::Join { request, reply } => {
                    // The requester may have given up waiting; that's fine.
                    let _ = reply.send(self.handle_join(request));
                }
                MembershipCommand::Members { room_id, reply } => {
                    let _ = reply.send(self.members(&room_id));
                }
                MembershipCommand::Shutdown => {
                    tracing::info!("membership actor shutting down");
                    break;
                }
            }
        }

        tracing::info!("membership actor stopped");
    }

    fn handle_create(
        &mut self,
        settings: RoomSettings,
    ) -> Result<RoomId, RoomError> {
        if let Some(taken) =
            settings.aliases.iter().find(|a| self.aliases.contains_key(*a))
        {
            return Err(RoomError::AliasInUse(taken.clone()));
        }

        let room_id = self.mint_room_id();
        for alias in &settings.aliases {
            self.aliases.insert(alias.clone(), room_id.clone());
        }
        tracing::info!(
            %room_id,
            join_rule = ?settings.join_rule,
            guest_access = settings.guest_access,
            "room created"
        );
        self.rooms.insert(
            room_id.clone(),
            LocalRoom {
                settings,
                invited: HashSet::new(),
                members: HashMap::new(),
            },
        );
        Ok(room_id)
    }

    fn handle_invite(
        &mut self,
        room_id: RoomId,
        user_id: UserId,
    ) -> Result<(), RoomError> {
        let room = self
            .rooms
            .get_mut(&room_id)
            .ok_or_else(|| RoomError::NotFound(room_id.clone()))?;
        tracing::info!(%room_id, %user_id, "user invited");
        room.invited.insert(user_id);
        Ok(())
    }

    fn handle_join(&mut self, request: JoinRequest) -> PerformJoinResponse {
        let room_id = match self.resolve(&request) {
            Ok(room_id) => room_id,
            Err(err) => return PerformJoinResponse::Rejected(err),
        };

        let Some(room) = self.rooms.get_mut(&room_id) else {
            return PerformJoinResponse::Rejected(self.unknown_room(&request));
        };

        if !room.members.contains_key(&request.user_id) {
            if request.is_guest && !room.settings.guest_access {
                return PerformJoinResponse::Rejected(
                    PerformError::not_allowed(
                        "Guest access is not allowed in this room",
                    ),
                );
            }
            if room.settings.join_rule == JoinRule::Invite
                && !room.invited.contains(&request.user_id)
            {
                return PerformJoinResponse::Rejected(
                    PerformError::not_allowed("You are not invited to this room"),
                );
            }
        }

        // Joining again just refreshes the membership content.
        room.invited.remove(&request.user_id);
        room.members.insert(request.user_id, request.content);

        PerformJoinResponse::Joined {
            room_id,
            joined_via: None,
        }
    }

    fn resolve(&self, request: &JoinRequest) -> Result<RoomId, PerformError> {
        let raw = request.room_id_or_alias.as_str();
        match request.room_id_or_alias.kind() {
            RoomIdOrAliasKind::RoomId => Ok(RoomId::new(raw)),
            RoomIdOrAliasKind::Alias => self
                .aliases
                .get(raw)
                .cloned()
                .ok_or_else(|| self.unknown_room(request)),
            RoomIdOrAliasKind::Unknown => Err(PerformError::new(
                PerformErrorCode::BadRequest,
                format!("Invalid room ID or alias: {raw}"),
            )),
        }
    }

    /// The refusal for a room we don't know.
    ///
    /// If the client pointed us at other servers, the room presumably
    /// lives there, and we have no way to reach them.
    fn unknown_room(&self, request: &JoinRequest) -> PerformError {
        let remote: Vec<&str> = request
            .server_names
            .iter()
            .filter(|s| **s != self.server_name)
            .map(ServerName::as_str)
            .collect();

        if remote.is_empty() {
            PerformError::no_room(format!(
                "Room {} not found",
                request.room_id_or_alias
            ))
        } else {
            PerformError::new(
                PerformErrorCode::Remote { status: None },
                format!(
                    "Unable to join {} via {}: federation is not available",
                    request.room_id_or_alias,
                    remote.join(", ")
                ),
            )
        }
    }

    fn members(&self, room_id: &RoomId) -> Result<Vec<Member>, RoomError> {
        let room = self
            .rooms
            .get(room_id)
            .ok_or_else(|| RoomError::NotFound(room_id.clone()))?;
        let mut members: Vec<Member> = room
            .members
            .iter()
            .map(|(user_id, content)| Member {
                user_id: user_id.clone(),
                content: content.clone(),
            })
            .collect();
        members.sort_by(|a, b| a.user_id.as_str().cmp(b.user_id.as_str()));
        Ok(members)
    }

    fn mint_room_id(&self) -> RoomId {
        loop {
            let localpart: String = rand::rng()
                .sample_iter(&Alphanumeric)
                .take(ROOM_ID_LOCALPART_LEN)
                .map(char::from)
                .collect();
            let room_id =
                RoomId::new(format!("!{localpart}:{}", self.server_name));
            if !self.rooms.contains_key(&room_id) {
                return room_id;
            }
        }
    }
}
