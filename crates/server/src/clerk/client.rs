//! Identity provider REST client.
//!
//! Thin client over the provider's Backend API. The service only needs two
//! calls: the single-page user listing that feeds reconciliation, and the
//! per-user lookup used by opportunistic repair.

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::ClerkConfig;

use super::types::ClerkUser;

/// Largest page the provider serves in one request.
///
/// Reconciliation fetches exactly one page; installations with more users
/// than this are not fully synced by a single run. Known limitation, kept
/// deliberately.
pub const LIST_USERS_PAGE_LIMIT: u32 = 500;

/// Errors that can occur when talking to the identity provider.
#[derive(Debug, Error)]
pub enum ClerkError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse a response body.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Capability interface over the identity provider.
///
/// The reconciliation service and the order-repair path depend on this trait
/// rather than the concrete client, so tests can substitute canned providers.
pub trait IdentityProvider: Send + Sync {
    /// List up to `limit` users, newest first.
    fn list_users(
        &self,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<ClerkUser>, ClerkError>> + Send;

    /// Fetch a single user by provider ID.
    fn get_user(&self, id: &str) -> impl Future<Output = Result<ClerkUser, ClerkError>> + Send;
}

/// HTTP client for the provider's Backend API.
#[derive(Clone)]
pub struct ClerkClient {
    client: reqwest::Client,
    base_url: String,
}

impl ClerkClient {
    /// Create a new identity provider client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build or the API key is
    /// not a valid header value.
    pub fn new(config: &ClerkConfig) -> Result<Self, ClerkError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Bearer {}", config.secret_key.expose_secret());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth_value)
                .map_err(|e| ClerkError::Parse(format!("Invalid API key format: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_owned(),
        })
    }

    async fn check<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ClerkError> {
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ClerkError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| ClerkError::Parse(e.to_string()))
    }
}

impl IdentityProvider for ClerkClient {
    async fn list_users(&self, limit: u32) -> Result<Vec<ClerkUser>, ClerkError> {
        let url = format!("{}/users?limit={limit}&order_by=-created_at", self.base_url);
        let response = self.client.get(&url).send().await?;
        Self::check(response).await
    }

    async fn get_user(&self, id: &str) -> Result<ClerkUser, ClerkError> {
        let url = format!("{}/users/{id}", self.base_url);
        let response = self.client.get(&url).send().await?;
        Self::check(response).await
    }
}
