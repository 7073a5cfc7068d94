//! End-to-end tests for the join pipeline: build, enrich, supervise,
//! translate.
//!
//! Time is paused so deadlines and slow joins run instantly.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use portcullis::prelude::*;
use portcullis::{
    BACKGROUND_JOIN_MESSAGE, DEFAULT_JOIN_DEADLINE, INTERNAL_ERROR_MESSAGE,
    PROFILE_MISSING_MESSAGE,
};
use portcullis_protocol::{ErrorCode, JoinRequest, Profile};
use portcullis_room::{MembershipError, PerformError, PerformJoinResponse};
use portcullis_session::ProfileError;
use serde_json::json;

// =========================================================================
// Mock collaborators
// =========================================================================

/// Answers every join after `delay` and records what it was asked.
struct ScriptedMembership {
    delay: Duration,
    answer: fn() -> Result<PerformJoinResponse, MembershipError>,
    calls: AtomicUsize,
    seen: Mutex<Vec<JoinRequest>>,
}

impl ScriptedMembership {
    fn new(
        delay: Duration,
        answer: fn() -> Result<PerformJoinResponse, MembershipError>,
    ) -> Arc<Self> {
        Arc::new(Self {
            delay,
            answer,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        })
    }

    fn joins(delay: Duration) -> Arc<Self> {
        Self::new(delay, || {
            Ok(PerformJoinResponse::Joined {
                room_id: RoomId::new("!abc123:example.org"),
                joined_via: None,
            })
        })
    }

    fn last_request(&self) -> JoinRequest {
        self.seen.lock().unwrap().last().cloned().unwrap()
    }
}

impl MembershipService for ScriptedMembership {
    async fn perform_join(
        &self,
        request: &JoinRequest,
    ) -> Result<PerformJoinResponse, MembershipError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(request.clone());
        tokio::time::sleep(self.delay).await;
        (self.answer)()
    }
}

/// A profile backend that is always down.
struct DownProfiles;

impl ProfileService for DownProfiles {
    async fn query_profile(&self, _user_id: &UserId) -> Result<Profile, ProfileError> {
        Err(ProfileError::Unavailable("connection refused".into()))
    }
}

// =========================================================================
// Helpers
// =========================================================================

const DEADLINE: Duration = Duration::from_secs(20);

fn alice() -> Device {
    Device::user(UserId::new("@alice:example.org"), "ALICEDEVICE")
}

fn guest() -> Device {
    Device::guest(UserId::new("@guest7:example.org"), "GUESTDEVICE")
}

async fn profiles() -> Arc<ProfileStore> {
    let store = ProfileStore::new();
    store
        .set(
            alice().user_id,
            Profile {
                displayname: Some("Alice".into()),
                avatar_url: Some("mxc://example.org/alice".into()),
            },
        )
        .await;
    store.set(guest().user_id, Profile::default()).await;
    Arc::new(store)
}

async fn orchestrator<M: MembershipService>(
    membership: Arc<M>,
) -> JoinOrchestrator<M, ProfileStore> {
    JoinOrchestrator::new(membership, profiles().await, JoinConfig::default())
}

// =========================================================================
// Deadline behaviour
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_fast_join_returns_room_id() {
    let membership = ScriptedMembership::joins(Duration::from_secs(2));
    let joins = orchestrator(Arc::clone(&membership)).await;

    let start = tokio::time::Instant::now();
    let response = joins.join(&alice(), "#foo:example.org", vec![], b"").await;

    assert_eq!(response.status, ResponseStatus::Ok);
    assert_eq!(response.http_status, 200);
    assert_eq!(response.room_id().unwrap().as_str(), "!abc123:example.org");
    assert_eq!(start.elapsed(), Duration::from_secs(2));

    let sent = membership.last_request();
    assert_eq!(sent.content["displayname"], json!("Alice"));
    assert_eq!(sent.content["avatar_url"], json!("mxc://example.org/alice"));
    assert!(!sent.is_guest);
}

#[tokio::test(start_paused = true)]
async fn test_slow_join_is_accepted_and_finishes_later() {
    let rooms = LocalMembership::spawn(LocalMembershipConfig {
        server_name: "example.org".into(),
        join_latency: Duration::from_secs(25),
        ..LocalMembershipConfig::default()
    });
    let room_id = rooms
        .create_room(RoomSettings::public("#foo:example.org"))
        .await
        .unwrap();
    let joins = orchestrator(Arc::new(rooms.clone())).await;

    let start = tokio::time::Instant::now();
    let response = joins.join(&alice(), "#foo:example.org", vec![], b"").await;

    assert_eq!(response.status, ResponseStatus::Accepted);
    assert_eq!(response.http_status, 202);
    let body = response.error_body().unwrap();
    assert_eq!(body.errcode, ErrorCode::Unknown);
    assert_eq!(body.error, BACKGROUND_JOIN_MESSAGE);
    assert_eq!(start.elapsed(), DEADLINE);
    assert!(rooms.members(&room_id).await.unwrap().is_empty());
    assert_eq!(joins.supervisor().in_flight(), 1);

    // Nobody is waiting any more, but the join still lands.
    tokio::time::sleep(Duration::from_secs(10)).await;
    let members = rooms.members(&room_id).await.unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].user_id, alice().user_id);
    assert_eq!(members[0].content["displayname"], json!("Alice"));
    assert_eq!(joins.supervisor().in_flight(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_configured_deadline_is_used() {
    let membership = ScriptedMembership::joins(Duration::from_secs(3));
    let joins = JoinOrchestrator::new(
        membership,
        profiles().await,
        JoinConfig::with_deadline(Duration::from_secs(1)),
    );

    let response = joins.join(&alice(), "#foo:example.org", vec![], b"").await;
    assert_eq!(response.status, ResponseStatus::Accepted);
}

#[tokio::test(start_paused = true)]
async fn test_zero_deadline_falls_back_to_default() {
    let membership = ScriptedMembership::joins(Duration::from_secs(2));
    let joins = JoinOrchestrator::new(
        membership,
        profiles().await,
        JoinConfig::with_deadline(Duration::ZERO),
    );
    assert_eq!(joins.supervisor().deadline(), DEFAULT_JOIN_DEADLINE);

    let response = joins.join(&alice(), "#foo:example.org", vec![], b"").await;
    assert_eq!(response.status, ResponseStatus::Ok);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_joins_are_independent() {
    let slow = ScriptedMembership::joins(Duration::from_secs(25));
    let fast = ScriptedMembership::joins(Duration::from_secs(1));
    let slow_joins = orchestrator(Arc::clone(&slow)).await;
    let fast_joins = orchestrator(Arc::clone(&fast)).await;

    let alice = alice();
    let (a, b, c) = tokio::join!(
        slow_joins.join(&alice, "#foo:example.org", vec![], b""),
        slow_joins.join(&alice, "#bar:example.org", vec![], b""),
        fast_joins.join(&alice, "#baz:example.org", vec![], b""),
    );
    assert_eq!(a.status, ResponseStatus::Accepted);
    assert_eq!(b.status, ResponseStatus::Accepted);
    assert_eq!(c.status, ResponseStatus::Ok);
    assert_eq!(slow.calls.load(Ordering::SeqCst), 2);
    assert_eq!(fast.calls.load(Ordering::SeqCst), 1);
}

// =========================================================================
// Refusals and failures
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_guest_refusal_is_guest_access_forbidden() {
    let membership = ScriptedMembership::new(Duration::from_secs(1), || {
        Ok(PerformJoinResponse::Rejected(PerformError::not_allowed(
            "room is invite-only",
        )))
    });
    let joins = orchestrator(Arc::clone(&membership)).await;

    let response = joins.join(&guest(), "#foo:example.org", vec![], b"").await;
    assert_eq!(response.status, ResponseStatus::Forbidden);
    assert_eq!(response.http_status, 403);
    let body = response.error_body().unwrap();
    assert_eq!(body.errcode, ErrorCode::GuestAccessForbidden);
    assert_eq!(body.error, "room is invite-only");
    assert!(membership.last_request().is_guest);
}

#[tokio::test(start_paused = true)]
async fn test_user_refusal_is_passed_through() {
    let rooms = LocalMembership::spawn(LocalMembershipConfig {
        server_name: "example.org".into(),
        ..LocalMembershipConfig::default()
    });
    rooms
        .create_room(RoomSettings::invite_only("#secret:example.org"))
        .await
        .unwrap();
    let joins = orchestrator(Arc::new(rooms)).await;

    let response = joins.join(&alice(), "#secret:example.org", vec![], b"").await;
    assert_eq!(response.status, ResponseStatus::DomainError);
    assert_eq!(response.http_status, 403);
    assert_eq!(response.error_body().unwrap().errcode, ErrorCode::Forbidden);
}

#[tokio::test(start_paused = true)]
async fn test_unknown_room_is_not_found() {
    let rooms = LocalMembership::spawn(LocalMembershipConfig::default());
    let joins = orchestrator(Arc::new(rooms)).await;

    let response = joins.join(&alice(), "#nowhere:localhost", vec![], b"").await;
    assert_eq!(response.http_status, 404);
    assert_eq!(response.error_body().unwrap().errcode, ErrorCode::NotFound);
}

#[tokio::test(start_paused = true)]
async fn test_membership_failure_is_internal_error() {
    let rooms = LocalMembership::spawn(LocalMembershipConfig::default());
    rooms.shutdown().await;
    let joins = orchestrator(Arc::new(rooms)).await;

    let response = joins.join(&alice(), "#foo:localhost", vec![], b"").await;
    assert_eq!(response.status, ResponseStatus::InternalError);
    assert_eq!(response.http_status, 500);
    assert_eq!(response.error_body().unwrap().error, INTERNAL_ERROR_MESSAGE);
    assert!(response.cause.is_some());
}

// =========================================================================
// Profile enrichment
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_missing_profile_aborts_before_dispatch() {
    let membership = ScriptedMembership::joins(Duration::from_secs(1));
    let joins = orchestrator(Arc::clone(&membership)).await;
    let stranger = Device::user(UserId::new("@nobody:example.org"), "X");

    let response = joins.join(&stranger, "#foo:example.org", vec![], b"").await;
    assert_eq!(response.status, ResponseStatus::InternalError);
    assert_eq!(response.http_status, 500);
    assert_eq!(response.error_body().unwrap().error, PROFILE_MISSING_MESSAGE);
    assert_eq!(membership.calls.load(Ordering::SeqCst), 0);
    assert_eq!(joins.supervisor().in_flight(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_profile_outage_joins_without_profile() {
    let membership = ScriptedMembership::joins(Duration::from_secs(1));
    let joins = JoinOrchestrator::new(
        Arc::clone(&membership),
        Arc::new(DownProfiles),
        JoinConfig::default(),
    );

    let response = joins
        .join(&alice(), "#foo:example.org", vec![], br#"{"reason":"hi"}"#)
        .await;
    assert_eq!(response.status, ResponseStatus::Ok);

    let sent = membership.last_request();
    assert!(!sent.content.contains_key("displayname"));
    assert!(!sent.content.contains_key("avatar_url"));
    assert_eq!(sent.content["reason"], json!("hi"));
}

#[tokio::test(start_paused = true)]
async fn test_request_carries_body_and_hints() {
    let membership = ScriptedMembership::joins(Duration::from_secs(1));
    let joins = orchestrator(Arc::clone(&membership)).await;

    joins
        .join(
            &alice(),
            "!abc123:example.org",
            vec![ServerName::new("b.org"), ServerName::new("a.org")],
            br#"{"displayname":"Not Alice","reason":"hello"}"#,
        )
        .await;

    let sent = membership.last_request();
    assert_eq!(sent.room_id_or_alias.as_str(), "!abc123:example.org");
    assert_eq!(
        sent.server_names,
        [ServerName::new("b.org"), ServerName::new("a.org")]
    );
    // Profile wins over what the client sent.
    assert_eq!(sent.content["displayname"], json!("Alice"));
    assert_eq!(sent.content["reason"], json!("hello"));
}
