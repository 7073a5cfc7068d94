//! Integration tests for the HTTP join endpoint.
//!
//! The router is driven in-process with `tower::ServiceExt::oneshot`, so
//! no sockets are involved.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use portcullis::prelude::*;
use portcullis::{BACKGROUND_JOIN_MESSAGE, router};
use portcullis_protocol::Profile;
use serde_json::{Value, json};
use tower::ServiceExt;

// =========================================================================
// Helpers
// =========================================================================

const ALICE_TOKEN: &str = "syt_alice_token";
const GUEST_TOKEN: &str = "syt_guest_token";
const BRIDGE_TOKEN: &str = "syt_bridge_token";

struct Fixture {
    app: Router,
    rooms: LocalMembership,
    room_id: RoomId,
}

async fn fixture(join_latency: Duration) -> Fixture {
    let rooms = LocalMembership::spawn(LocalMembershipConfig {
        server_name: "example.org".into(),
        join_latency,
        ..LocalMembershipConfig::default()
    });
    let room_id = rooms
        .create_room(RoomSettings::public("#foo:example.org"))
        .await
        .unwrap();
    rooms
        .create_room(RoomSettings::invite_only("#secret:example.org"))
        .await
        .unwrap();

    let alice = Device::user(UserId::new("@alice:example.org"), "ALICEDEVICE");
    let guest = Device::guest(UserId::new("@guest7:example.org"), "GUESTDEVICE");
    let bridge = Device {
        account_type: AccountType::AppService,
        ..Device::user(UserId::new("@_irc_bridge:example.org"), "BRIDGE")
    };

    let profiles = ProfileStore::new();
    profiles
        .set(
            alice.user_id.clone(),
            Profile {
                displayname: Some("Alice".into()),
                avatar_url: None,
            },
        )
        .await;
    profiles.set(guest.user_id.clone(), Profile::default()).await;
    profiles.set(bridge.user_id.clone(), Profile::default()).await;

    let tokens = TokenRegistry::new();
    tokens.insert(ALICE_TOKEN, alice).await;
    tokens.insert(GUEST_TOKEN, guest).await;
    tokens.insert(BRIDGE_TOKEN, bridge).await;

    let orchestrator = JoinOrchestrator::new(
        Arc::new(rooms.clone()),
        Arc::new(profiles),
        JoinConfig::default(),
    );

    Fixture {
        app: router(tokens, orchestrator),
        rooms,
        room_id,
    }
}

fn join_request(uri: &str, token: Option<&str>, body: &'static str) -> Request<Body> {
    let mut builder = Request::builder().method("POST").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body)).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

// =========================================================================
// Authentication
// =========================================================================

#[tokio::test]
async fn test_missing_token_is_rejected() {
    let f = fixture(Duration::ZERO).await;

    let (status, body) = send(
        &f.app,
        join_request("/_matrix/client/v3/join/%23foo:example.org", None, ""),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["errcode"], "M_MISSING_TOKEN");
}

#[tokio::test]
async fn test_unknown_token_is_rejected() {
    let f = fixture(Duration::ZERO).await;

    let (status, body) = send(
        &f.app,
        join_request(
            "/_matrix/client/v3/join/%23foo:example.org",
            Some("not-a-token"),
            "",
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["errcode"], "M_UNKNOWN_TOKEN");
    assert!(f.rooms.members(&f.room_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_token_in_query_string() {
    let f = fixture(Duration::ZERO).await;

    let uri = format!("/_matrix/client/v3/join/%23foo:example.org?access_token={ALICE_TOKEN}");
    let (status, body) = send(&f.app, join_request(&uri, None, "")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["room_id"], f.room_id.as_str());
}

// =========================================================================
// Joining
// =========================================================================

#[tokio::test]
async fn test_join_by_alias_returns_room_id() {
    let f = fixture(Duration::ZERO).await;

    let (status, body) = send(
        &f.app,
        join_request(
            "/_matrix/client/v3/join/%23foo:example.org",
            Some(ALICE_TOKEN),
            r#"{"reason":"hello"}"#,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "room_id": f.room_id.as_str() }));

    let members = f.rooms.members(&f.room_id).await.unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].content["displayname"], "Alice");
    assert_eq!(members[0].content["reason"], "hello");
}

#[tokio::test]
async fn test_legacy_r0_path_is_served() {
    let f = fixture(Duration::ZERO).await;

    let uri = format!("/_matrix/client/r0/join/{}", f.room_id);
    let (status, body) = send(&f.app, join_request(&uri, Some(ALICE_TOKEN), "")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["room_id"], f.room_id.as_str());
}

#[tokio::test]
async fn test_guest_refused_from_invite_only_room() {
    let f = fixture(Duration::ZERO).await;

    let (status, body) = send(
        &f.app,
        join_request(
            "/_matrix/client/v3/join/%23secret:example.org",
            Some(GUEST_TOKEN),
            "",
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["errcode"], "M_GUEST_ACCESS_FORBIDDEN");
}

#[tokio::test]
async fn test_appservice_user_is_not_treated_as_guest() {
    let f = fixture(Duration::ZERO).await;

    let (status, body) = send(
        &f.app,
        join_request(
            "/_matrix/client/v3/join/%23secret:example.org",
            Some(BRIDGE_TOKEN),
            "",
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["errcode"], "M_FORBIDDEN");
}

#[tokio::test]
async fn test_unknown_room_with_remote_hints() {
    let f = fixture(Duration::ZERO).await;

    let (status, body) = send(
        &f.app,
        join_request(
            "/_matrix/client/v3/join/!elsewhere:remote.org?server_name=remote.org&server_name=other.org",
            Some(ALICE_TOKEN),
            "",
        ),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["errcode"], "M_UNKNOWN");
    // Hints reach the membership service in the order given.
    let error = body["error"].as_str().unwrap();
    assert!(error.contains("remote.org, other.org"), "{error}");
}

#[tokio::test]
async fn test_malformed_identifier_is_bad_request() {
    let f = fixture(Duration::ZERO).await;

    let (status, body) = send(
        &f.app,
        join_request("/_matrix/client/v3/join/foo", Some(ALICE_TOKEN), ""),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errcode"], "M_UNKNOWN");
}

#[tokio::test(start_paused = true)]
async fn test_slow_join_answers_accepted() {
    let f = fixture(Duration::from_secs(25)).await;

    let (status, body) = send(
        &f.app,
        join_request(
            "/_matrix/client/v3/join/%23foo:example.org",
            Some(ALICE_TOKEN),
            "",
        ),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["errcode"], "M_UNKNOWN");
    assert_eq!(body["error"], BACKGROUND_JOIN_MESSAGE);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(f.rooms.members(&f.room_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_response_is_json() {
    let f = fixture(Duration::ZERO).await;

    let response = f
        .app
        .clone()
        .oneshot(join_request(
            "/_matrix/client/v3/join/%23foo:example.org",
            Some(ALICE_TOKEN),
            "",
        ))
        .await
        .unwrap();
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/json"
    );
}
