//! Store repository - seller scope resolution.

use sqlx::PgPool;

use clementine_core::{StoreId, UserId};

use super::RepositoryError;

/// Repository resolving sellers to the store they own.
pub struct StoreRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StoreRepository<'a> {
    /// Create a new store repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Resolve the approved store owned by a user.
    ///
    /// Returns `None` when the user owns no approved store - callers must
    /// treat that as an authorization failure, not an empty result.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn store_for_seller(
        &self,
        user_id: &UserId,
    ) -> Result<Option<StoreId>, RepositoryError> {
        let store_id: Option<String> = sqlx::query_scalar(
            r#"
            SELECT id
            FROM stores
            WHERE user_id = $1 AND status = 'approved'
            "#,
        )
        .bind(user_id.as_str())
        .fetch_optional(self.pool)
        .await?;

        Ok(store_id.map(StoreId::new))
    }
}
