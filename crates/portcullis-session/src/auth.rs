//! Access-token authentication.
//!
//! Portcullis doesn't own a user database. It defines the
//! [`Authenticator`] trait, a single async method from token to
//! [`Device`], and the server calls it before any join is attempted.
//! [`TokenRegistry`] is an in-memory implementation for development and
//! tests.

use std::collections::HashMap;

use rand::Rng;
use tokio::sync::RwLock;

use crate::{Device, SessionError};

/// Resolves an access token to the device it was issued to.
///
/// `Send + Sync + 'static` because the authenticator lives in shared
/// server state for as long as the server runs, and is called from many
/// request tasks at once.
///
/// # Example
///
/// ```rust
/// use portcullis_protocol::UserId;
/// use portcullis_session::{Authenticator, Device, SessionError};
///
/// /// Treats the token as the user's localpart. Development only.
/// struct DevAuthenticator;
///
/// impl Authenticator for DevAuthenticator {
///     async fn authenticate(&self, token: &str) -> Result<Device, SessionError> {
///         if token.is_empty() {
///             return Err(SessionError::UnknownToken);
///         }
///         let user_id = UserId::new(format!("@{token}:localhost"));
///         Ok(Device::user(user_id, "DEV"))
///     }
/// }
/// ```
pub trait Authenticator: Send + Sync + 'static {
    /// Validates the token and returns the caller's device.
    ///
    /// # Errors
    /// [`SessionError::UnknownToken`] if the token is not recognised.
    fn authenticate(
        &self,
        token: &str,
    ) -> impl std::future::Future<Output = Result<Device, SessionError>> + Send;
}

/// In-memory token → device map.
///
/// Tokens are random 32-character hex strings.
#[derive(Debug, Default)]
pub struct TokenRegistry {
    tokens: RwLock<HashMap<String, Device>>,
}

impl TokenRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a fresh access token for `device` and returns it.
    pub async fn issue(&self, device: Device) -> String {
        let token = generate_token();
        tracing::info!(
            user_id = %device.user_id,
            device_id = %device.device_id,
            "access token issued"
        );
        self.tokens.write().await.insert(token.clone(), device);
        token
    }

    /// Registers a caller-chosen token. Replaces any device previously
    /// bound to the same token.
    pub async fn insert(&self, token: impl Into<String>, device: Device) {
        self.tokens.write().await.insert(token.into(), device);
    }
}

impl Authenticator for TokenRegistry {
    async fn authenticate(&self, token: &str) -> Result<Device, SessionError> {
        self.tokens
            .read()
            .await
            .get(token)
            .cloned()
            .ok_or(SessionError::UnknownToken)
    }
}

/// Generates a random 32-character hex string (128 bits of entropy).
fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 16] = rng.random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
