//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;

use crate::clerk::{ClerkClient, ClerkError};
use crate::config::ServerConfig;
use crate::db::{RepositoryError, WelcomeRepository};
use crate::models::welcome::WelcomeSettings;
use crate::services::imagekit::{ImageKitClient, ImageKitError};

/// How long a cached welcome-settings read stays fresh.
const WELCOME_CACHE_TTL: Duration = Duration::from_secs(60);

/// Error building the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("identity provider client: {0}")]
    Clerk(#[from] ClerkError),
    #[error("image storage client: {0}")]
    Images(#[from] ImageKitError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to shared
/// resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    pool: PgPool,
    clerk: ClerkClient,
    images: ImageKitClient,
    // The welcome settings singleton is read by every storefront visitor
    // evaluating the modal; cache it briefly and invalidate on write.
    welcome_cache: Cache<(), WelcomeSettings>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if an API client cannot be constructed from the
    /// configuration.
    pub fn new(config: ServerConfig, pool: PgPool) -> Result<Self, StateError> {
        let clerk = ClerkClient::new(&config.clerk)?;
        let images = ImageKitClient::new(&config.imagekit)?;
        let welcome_cache = Cache::builder()
            .max_capacity(1)
            .time_to_live(WELCOME_CACHE_TTL)
            .build();

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                clerk,
                images,
                welcome_cache,
            }),
        })
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the identity provider client.
    #[must_use]
    pub fn clerk(&self) -> &ClerkClient {
        &self.inner.clerk
    }

    /// Get a reference to the image storage client.
    #[must_use]
    pub fn images(&self) -> &ImageKitClient {
        &self.inner.images
    }

    /// Current welcome settings, creating the defaults on first read.
    ///
    /// Served through a short-lived cache; [`Self::invalidate_welcome_settings`]
    /// drops the cached value after a write.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the read-through query fails.
    pub async fn welcome_settings(&self) -> Result<WelcomeSettings, RepositoryError> {
        if let Some(settings) = self.inner.welcome_cache.get(&()).await {
            return Ok(settings);
        }

        let settings = WelcomeRepository::new(self.pool()).get_or_create().await?;
        self.inner.welcome_cache.insert((), settings.clone()).await;
        Ok(settings)
    }

    /// Drop the cached welcome settings after a write.
    pub async fn invalidate_welcome_settings(&self) {
        self.inner.welcome_cache.invalidate(&()).await;
    }
}
