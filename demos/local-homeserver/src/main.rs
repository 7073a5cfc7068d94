//! A single-process homeserver that serves only the join endpoint.
//!
//! Rooms, users and tokens live in memory and are seeded at startup.
//! Set `PORTCULLIS_JOIN_LATENCY_MS` above the deadline to watch joins
//! come back as "continues in the background" and land afterwards.
//!
//! ```text
//! curl -X POST -H "Authorization: Bearer <token>" \
//!     http://127.0.0.1:8008/_matrix/client/v3/join/%23lobby:localhost
//! ```

use std::env;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use portcullis::prelude::*;
use portcullis_protocol::Profile;
use tracing_subscriber::EnvFilter;

const DEFAULT_BIND: &str = "127.0.0.1:8008";
const DEFAULT_FILTER: &str = "info";

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

struct Settings {
    bind: String,
    join: JoinConfig,
    join_latency: Duration,
}

impl Settings {
    fn from_env() -> Self {
        let join = env_number::<u64>("PORTCULLIS_JOIN_DEADLINE_SECS")
            .map(|secs| JoinConfig::with_deadline(Duration::from_secs(secs)))
            .unwrap_or_default();
        let join_latency = env_number::<u64>("PORTCULLIS_JOIN_LATENCY_MS")
            .map(Duration::from_millis)
            .unwrap_or(Duration::ZERO);

        Self {
            bind: env::var("PORTCULLIS_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string()),
            join,
            join_latency,
        }
    }
}

/// Reads a numeric variable. Unparseable values are logged and ignored.
fn env_number<T: FromStr>(name: &str) -> Option<T> {
    let raw = env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(variable = name, value = %raw, "ignoring unparseable setting");
            None
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_target(true)
        .with_env_filter(filter)
        .try_init();
}

// ---------------------------------------------------------------------------
// Seed data
// ---------------------------------------------------------------------------

async fn seed(
    rooms: &LocalMembership,
    profiles: &ProfileStore,
    tokens: &TokenRegistry,
) -> Result<(), PortcullisError> {
    let server = rooms.server_name().clone();

    let lobby = rooms
        .create_room(RoomSettings::public(format!("#lobby:{server}")).with_guest_access())
        .await?;
    let staff = rooms
        .create_room(RoomSettings::invite_only(format!("#staff:{server}")))
        .await?;

    let alice = Device::user(UserId::new(format!("@alice:{server}")), "ALICEDEVICE");
    let bob = Device::user(UserId::new(format!("@bob:{server}")), "BOBDEVICE");
    let guest = Device::guest(UserId::new(format!("@guest1:{server}")), "GUESTDEVICE");
    // A bridge puppet: joins like a regular user, never gets the guest code.
    let bridge = Device {
        account_type: AccountType::AppService,
        ..Device::user(UserId::new(format!("@_irc_bridge:{server}")), "BRIDGE")
    };

    profiles
        .set(
            alice.user_id.clone(),
            Profile {
                displayname: Some("Alice".into()),
                avatar_url: Some(format!("mxc://{server}/alice")),
            },
        )
        .await;
    profiles
        .set(
            bob.user_id.clone(),
            Profile {
                displayname: Some("Bob".into()),
                avatar_url: None,
            },
        )
        .await;
    profiles.set(guest.user_id.clone(), Profile::default()).await;
    profiles
        .set(
            bridge.user_id.clone(),
            Profile {
                displayname: Some("IRC Bridge".into()),
                avatar_url: None,
            },
        )
        .await;

    rooms.invite(&staff, &alice.user_id).await?;

    for device in [alice, bob, guest, bridge] {
        let user_id = device.user_id.clone();
        let account_type = device.account_type;
        let token = tokens.issue(device).await;
        tracing::info!(%user_id, ?account_type, %token, "demo account ready");
    }
    tracing::info!(%lobby, %staff, "demo rooms ready");
    Ok(())
}

// ---------------------------------------------------------------------------
// Server bootstrap
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), PortcullisError> {
    init_tracing();
    let settings = Settings::from_env();

    let rooms = LocalMembership::spawn(LocalMembershipConfig {
        server_name: "localhost".into(),
        join_latency: settings.join_latency,
        ..LocalMembershipConfig::default()
    });
    let profiles = ProfileStore::new();
    let tokens = TokenRegistry::new();
    seed(&rooms, &profiles, &tokens).await?;

    let server = PortcullisServer::builder()
        .bind(&settings.bind)
        .join_config(settings.join)
        .build(tokens, Arc::new(rooms), Arc::new(profiles))
        .await?;

    server.run().await
}
