//! Identity provider (Clerk) integration.
//!
//! The provider is the source of truth for user profile fields. This module
//! holds the REST client (behind the [`IdentityProvider`] capability trait),
//! the two payload shapes the provider uses (API responses vs webhook
//! events), and webhook signature verification.

pub mod client;
pub mod types;
pub mod webhook;

pub use client::{ClerkClient, ClerkError, IdentityProvider, LIST_USERS_PAGE_LIMIT};
pub use types::{ClerkUser, WebhookEvent, WebhookUser};
pub use webhook::{WebhookError, WebhookVerifier};
