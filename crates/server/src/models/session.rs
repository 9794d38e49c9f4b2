//! Session-stored identity types.

use serde::{Deserialize, Serialize};

use clementine_core::UserId;

/// Role claim carried in the caller's session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Regular shopper.
    Customer,
    /// Seller with an associated store.
    Seller,
    /// Platform administrator.
    Admin,
}

impl Role {
    /// Whether this role may read or write the welcome-offer settings.
    #[must_use]
    pub const fn can_manage_welcome(self) -> bool {
        matches!(self, Self::Seller | Self::Admin)
    }
}

/// The authenticated caller, as stored in the session by the sign-in flow.
///
/// The sign-in flow itself is owned by the identity-provider integration;
/// this service only reads what it stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub email: String,
    /// First name, when the provider knows one (used for the modal greeting).
    pub name: Option<String>,
    pub role: Role,
}

/// Session storage keys.
pub mod session_keys {
    /// Key for the current authenticated user.
    pub const CURRENT_USER: &str = "current_user";
    /// Key for the welcome modal's last-shown timestamp (ms since epoch).
    pub const WELCOME_LAST_SHOWN: &str = "welcome.last_shown";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_welcome_permission() {
        assert!(Role::Seller.can_manage_welcome());
        assert!(Role::Admin.can_manage_welcome());
        assert!(!Role::Customer.can_manage_welcome());
    }
}
