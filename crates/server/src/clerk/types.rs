//! Identity provider payload shapes.
//!
//! The provider exposes users in two different shapes: Backend API responses
//! declare a `primary_email_address_id` to match against the address list,
//! while webhook event payloads flag the primary address directly with a
//! `primary` boolean. Both resolutions are supported here; neither shape is
//! allowed to produce a profile without a primary email.

use serde::Deserialize;

use clementine_core::{Email, UserId};

use crate::models::user::UserProfile;

/// Name used when the provider has no name parts for a user.
pub const FALLBACK_NAME: &str = "User";

/// A user as returned by the provider's Backend API.
#[derive(Debug, Clone, Deserialize)]
pub struct ClerkUser {
    pub id: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub primary_email_address_id: Option<String>,
    #[serde(default)]
    pub email_addresses: Vec<ClerkEmailAddress>,
}

/// An email address entry in a Backend API user.
#[derive(Debug, Clone, Deserialize)]
pub struct ClerkEmailAddress {
    pub id: String,
    pub email_address: String,
}

impl ClerkUser {
    /// Resolve the primary email by matching the declared primary address id.
    #[must_use]
    pub fn primary_email(&self) -> Option<&str> {
        let primary_id = self.primary_email_address_id.as_deref()?;
        self.email_addresses
            .iter()
            .find(|e| e.id == primary_id)
            .map(|e| e.email_address.as_str())
    }

    /// Joined first+last name, `None` when both parts are empty.
    #[must_use]
    pub fn joined_name(&self) -> Option<String> {
        joined_name(self.first_name.as_deref(), self.last_name.as_deref())
    }

    /// Display name with the `"User"` fallback.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.joined_name().unwrap_or_else(|| FALLBACK_NAME.to_owned())
    }

    /// Normalize into the canonical upsert profile.
    ///
    /// Returns `None` when no primary email resolves - such users are
    /// skipped, never written.
    #[must_use]
    pub fn to_profile(&self) -> Option<UserProfile> {
        let email = Email::parse(self.primary_email()?).ok()?;
        Some(UserProfile {
            id: UserId::new(&self.id),
            name: self.display_name(),
            email,
            image: self.image_url.clone().unwrap_or_default(),
        })
    }
}

/// A signed webhook event envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    /// Event kind, e.g. `user.created`, `user.updated`, `user.deleted`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Kind-specific payload.
    pub data: serde_json::Value,
}

/// A user as delivered in `user.created` / `user.updated` event payloads.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookUser {
    pub id: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub email_addresses: Vec<WebhookEmailAddress>,
}

/// An email address entry in a webhook user payload.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEmailAddress {
    pub email_address: String,
    #[serde(default)]
    pub primary: bool,
}

impl WebhookUser {
    /// Resolve the primary email by the `primary` flag.
    #[must_use]
    pub fn primary_email(&self) -> Option<&str> {
        self.email_addresses
            .iter()
            .find(|e| e.primary)
            .map(|e| e.email_address.as_str())
    }

    /// Normalize into the canonical upsert profile.
    ///
    /// Returns `None` when no address carries the `primary` flag.
    #[must_use]
    pub fn to_profile(&self) -> Option<UserProfile> {
        let email = Email::parse(self.primary_email()?).ok()?;
        Some(UserProfile {
            id: UserId::new(&self.id),
            name: joined_name(self.first_name.as_deref(), self.last_name.as_deref())
                .unwrap_or_else(|| FALLBACK_NAME.to_owned()),
            email,
            image: self.image_url.clone().unwrap_or_default(),
        })
    }
}

/// Trimmed `first last` concatenation, `None` when nothing remains.
fn joined_name(first: Option<&str>, last: Option<&str>) -> Option<String> {
    let joined = format!("{} {}", first.unwrap_or(""), last.unwrap_or(""));
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_user(primary_id: Option<&str>) -> ClerkUser {
        ClerkUser {
            id: "user_1".to_owned(),
            first_name: Some("Ada".to_owned()),
            last_name: Some("Lovelace".to_owned()),
            image_url: Some("https://img.example/ada.png".to_owned()),
            primary_email_address_id: primary_id.map(str::to_owned),
            email_addresses: vec![
                ClerkEmailAddress {
                    id: "idn_old".to_owned(),
                    email_address: "old@example.com".to_owned(),
                },
                ClerkEmailAddress {
                    id: "idn_primary".to_owned(),
                    email_address: "ada@example.com".to_owned(),
                },
            ],
        }
    }

    #[test]
    fn test_primary_email_matches_by_id() {
        assert_eq!(
            api_user(Some("idn_primary")).primary_email(),
            Some("ada@example.com")
        );
        // Declared id that matches no address resolves nothing
        assert_eq!(api_user(Some("idn_missing")).primary_email(), None);
        assert_eq!(api_user(None).primary_email(), None);
    }

    #[test]
    fn test_webhook_primary_email_matches_by_flag() {
        let user = WebhookUser {
            id: "user_2".to_owned(),
            first_name: None,
            last_name: None,
            image_url: None,
            email_addresses: vec![
                WebhookEmailAddress {
                    email_address: "secondary@example.com".to_owned(),
                    primary: false,
                },
                WebhookEmailAddress {
                    email_address: "primary@example.com".to_owned(),
                    primary: true,
                },
            ],
        };

        assert_eq!(user.primary_email(), Some("primary@example.com"));
    }

    #[test]
    fn test_display_name_fallback() {
        let mut user = api_user(Some("idn_primary"));
        assert_eq!(user.display_name(), "Ada Lovelace");

        user.last_name = None;
        assert_eq!(user.display_name(), "Ada");

        user.first_name = Some("  ".to_owned());
        assert_eq!(user.display_name(), FALLBACK_NAME);

        user.first_name = None;
        assert_eq!(user.display_name(), FALLBACK_NAME);
    }

    #[test]
    fn test_to_profile_requires_primary_email() {
        assert!(api_user(Some("idn_primary")).to_profile().is_some());
        assert!(api_user(None).to_profile().is_none());
    }

    #[test]
    fn test_to_profile_normalizes() {
        let profile = api_user(Some("idn_primary")).to_profile().expect("profile");
        assert_eq!(profile.id.as_str(), "user_1");
        assert_eq!(profile.name, "Ada Lovelace");
        assert_eq!(profile.email.as_str(), "ada@example.com");
        assert_eq!(profile.image, "https://img.example/ada.png");
    }

    #[test]
    fn test_webhook_event_parses() {
        let raw = r#"{
            "type": "user.created",
            "data": {
                "id": "user_3",
                "first_name": "Grace",
                "last_name": null,
                "image_url": "",
                "email_addresses": [
                    {"email_address": "grace@example.com", "primary": true}
                ]
            }
        }"#;

        let event: WebhookEvent = serde_json::from_str(raw).expect("parse event");
        assert_eq!(event.kind, "user.created");

        let user: WebhookUser = serde_json::from_value(event.data).expect("parse user");
        let profile = user.to_profile().expect("profile");
        assert_eq!(profile.name, "Grace");
        assert_eq!(profile.email.as_str(), "grace@example.com");
    }
}
