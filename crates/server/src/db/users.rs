//! User repository for database operations.
//!
//! Users are keyed by the identity provider's string ID (or a synthesized
//! `manual_*` ID for store-created reviewers). Reconciliation and the webhook
//! receiver only ever touch `name`, `email`, and `image`; the `cart` column
//! is seeded empty on create and belongs to the shop application afterwards.

use sqlx::PgPool;

use clementine_core::{Email, UserId};

use super::RepositoryError;
use crate::models::user::{UserProfile, UserRecord};
use crate::services::sync::UserStore;

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create or update a user from a reconciled provider profile.
    ///
    /// Inserts seed an empty cart; updates leave the cart untouched. Safe to
    /// repeat for the same profile (idempotent upsert).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert_profile(&self, profile: &UserProfile) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, image, cart)
            VALUES ($1, $2, $3, $4, '{}'::jsonb)
            ON CONFLICT (id) DO UPDATE
            SET name = EXCLUDED.name,
                email = EXCLUDED.email,
                image = EXCLUDED.image,
                updated_at = NOW()
            "#,
        )
        .bind(profile.id.as_str())
        .bind(&profile.name)
        .bind(profile.email.as_str())
        .bind(&profile.image)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Find a user by email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_email(&self, email: &Email) -> Result<Option<UserRecord>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, name, email, image
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Create a placeholder user for a store-submitted review.
    ///
    /// This is a second, independent user-creation path with its own
    /// `manual_*` ID scheme, distinct from provider-assigned IDs.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create_manual(&self, record: &UserRecord) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, image, cart)
            VALUES ($1, $2, $3, $4, '{}'::jsonb)
            "#,
        )
        .bind(record.id.as_str())
        .bind(&record.name)
        .bind(&record.email)
        .bind(&record.image)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Patch a user's contact fields after an opportunistic repair.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update_contact(
        &self,
        id: &UserId,
        name: &str,
        email: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET name = $2, email = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id.as_str())
        .bind(name)
        .bind(email)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}

/// Owned [`UserStore`] implementation over a connection pool.
///
/// Lets the shared reconciliation service be constructed from application
/// state (routes) or a bare pool (CLI) without borrowing.
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    /// Create a store backed by the given pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl UserStore for PgUserStore {
    async fn upsert_profile(&self, profile: &UserProfile) -> Result<(), RepositoryError> {
        UserRepository::new(&self.pool).upsert_profile(profile).await
    }
}
