//! Welcome-settings repository.
//!
//! The settings live in a single row with the fixed id `"default"`. The row
//! is created lazily with hardcoded defaults on first read; writes always
//! replace all four fields together.

use sqlx::PgPool;

use super::RepositoryError;
use crate::models::welcome::WelcomeSettings;

/// Fixed primary key of the singleton row.
const SINGLETON_ID: &str = "default";

/// Repository for the welcome-settings singleton.
pub struct WelcomeRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> WelcomeRepository<'a> {
    /// Create a new welcome-settings repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Read the singleton row, if it exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self) -> Result<Option<WelcomeSettings>, RepositoryError> {
        let settings = sqlx::query_as::<_, WelcomeSettings>(
            r#"
            SELECT coupon_code, discount_percentage, enabled, cooldown_hours
            FROM welcome_settings
            WHERE id = $1
            "#,
        )
        .bind(SINGLETON_ID)
        .fetch_optional(self.pool)
        .await?;

        Ok(settings)
    }

    /// Read the singleton, creating it with defaults if absent.
    ///
    /// Get-or-create, not a separate provisioning step: the first reader
    /// persists the defaults.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_or_create(&self) -> Result<WelcomeSettings, RepositoryError> {
        if let Some(settings) = self.get().await? {
            return Ok(settings);
        }

        let defaults = WelcomeSettings::default();
        sqlx::query(
            r#"
            INSERT INTO welcome_settings (id, coupon_code, discount_percentage, enabled, cooldown_hours)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(SINGLETON_ID)
        .bind(&defaults.coupon_code)
        .bind(defaults.discount_percentage)
        .bind(defaults.enabled)
        .bind(defaults.cooldown_hours)
        .execute(self.pool)
        .await?;

        Ok(defaults)
    }

    /// Replace the singleton with validated settings (full replacement of all
    /// four fields, no partial update).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert(&self, settings: &WelcomeSettings) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO welcome_settings (id, coupon_code, discount_percentage, enabled, cooldown_hours)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE
            SET coupon_code = EXCLUDED.coupon_code,
                discount_percentage = EXCLUDED.discount_percentage,
                enabled = EXCLUDED.enabled,
                cooldown_hours = EXCLUDED.cooldown_hours,
                updated_at = NOW()
            "#,
        )
        .bind(SINGLETON_ID)
        .bind(&settings.coupon_code)
        .bind(settings.discount_percentage)
        .bind(settings.enabled)
        .bind(settings.cooldown_hours)
        .execute(self.pool)
        .await?;

        Ok(())
    }
}
