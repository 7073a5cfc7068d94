//! The authenticated caller.

use portcullis_protocol::UserId;

/// What kind of account a device belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccountType {
    /// A regular registered user.
    #[default]
    User,
    /// A guest account with restricted access.
    Guest,
    /// A user managed by an application service.
    AppService,
}

/// A logged-in device: the identity a request acts as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub user_id: UserId,
    pub device_id: String,
    pub account_type: AccountType,
}

impl Device {
    /// A regular user's device.
    pub fn user(user_id: UserId, device_id: impl Into<String>) -> Self {
        Self {
            user_id,
            device_id: device_id.into(),
            account_type: AccountType::User,
        }
    }

    /// A guest's device.
    pub fn guest(user_id: UserId, device_id: impl Into<String>) -> Self {
        Self {
            account_type: AccountType::Guest,
            ..Self::user(user_id, device_id)
        }
    }

    /// Returns `true` for guest accounts.
    pub fn is_guest(&self) -> bool {
        self.account_type == AccountType::Guest
    }
}
