//! User domain types.

use serde::Serialize;
use sqlx::FromRow;

use clementine_core::{Email, UserId};

/// A user row as stored locally and returned to the seller dashboard.
///
/// The identity provider is the source of truth for `name`, `email`, and
/// `image`; this is the reconciled local copy.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserRecord {
    /// Provider-assigned ID, or a `manual_*` ID for store-created reviewers.
    pub id: UserId,
    /// Display name, `"User"` when the provider has no name parts.
    pub name: String,
    /// Primary email address. A record is never created without one.
    pub email: String,
    /// Avatar URL, empty string when the provider has none.
    pub image: String,
}

/// The canonical profile written by reconciliation and the webhook receiver.
///
/// Both entry points normalize provider payloads into this shape before any
/// database write; a user without a resolvable primary email never becomes a
/// `UserProfile`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub image: String,
}
