//! Database operations for the Clementine `PostgreSQL` database.
//!
//! The schema is owned by the main shop application (an external
//! collaborator); this service reads and writes the subset of tables below
//! with runtime-bound queries and never runs migrations of its own.
//!
//! ## Tables
//!
//! - `users` - Reconciled identity records (`id`, `name`, `email`, `image`, `cart`)
//! - `stores` - Seller-owned stores; `user_id` + `status = 'approved'` grants seller scope
//! - `orders`, `order_items`, `addresses` - Read for the dashboard; only `orders.status` is written
//! - `products` - Read for review listings and ownership checks
//! - `ratings` - Product reviews
//! - `welcome_settings` - Singleton welcome-offer configuration (`id = 'default'`)
//! - `sessions` - Tower-sessions storage

pub mod orders;
pub mod reviews;
pub mod stores;
pub mod users;
pub mod welcome;

pub use orders::OrderRepository;
pub use reviews::ReviewRepository;
pub use stores::StoreRepository;
pub use users::{PgUserStore, UserRepository};
pub use welcome::WelcomeRepository;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Error type for repository operations.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Underlying database failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A row exists but its contents are not usable.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// The targeted row does not exist (or is out of the caller's scope).
    #[error("row not found")]
    NotFound,
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
