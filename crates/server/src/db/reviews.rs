//! Review repository for database operations.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use clementine_core::{ProductId, ReviewId, StoreId, UserId};

use super::RepositoryError;
use crate::models::review::{NewReview, ProductReviews, Review, ReviewAuthor};

/// Repository for review database operations.
pub struct ReviewRepository<'a> {
    pool: &'a PgPool,
}

#[derive(FromRow)]
struct ProductRow {
    id: String,
    name: String,
}

#[derive(FromRow)]
struct ReviewRow {
    id: String,
    product_id: String,
    rating: i32,
    review: String,
    images: Vec<String>,
    approved: bool,
    created_at: DateTime<Utc>,
    user_id: String,
    user_name: String,
    user_email: String,
    user_image: String,
}

impl<'a> ReviewRepository<'a> {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All products for a store with their reviews (approved and not),
    /// newest review first, reviewer identity included.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_for_store(
        &self,
        store_id: &StoreId,
    ) -> Result<Vec<ProductReviews>, RepositoryError> {
        let products = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT id, name
            FROM products
            WHERE store_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(store_id.as_str())
        .fetch_all(self.pool)
        .await?;

        let product_ids: Vec<String> = products.iter().map(|p| p.id.clone()).collect();
        let mut reviews_by_product = self.reviews_for_products(&product_ids).await?;

        Ok(products
            .into_iter()
            .map(|p| ProductReviews {
                reviews: reviews_by_product.remove(&p.id).unwrap_or_default(),
                id: ProductId::new(p.id),
                name: p.name,
            })
            .collect())
    }

    async fn reviews_for_products(
        &self,
        product_ids: &[String],
    ) -> Result<HashMap<String, Vec<Review>>, RepositoryError> {
        if product_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, ReviewRow>(
            r#"
            SELECT r.id, r.product_id, r.rating, r.review, r.images, r.approved, r.created_at,
                   u.id AS user_id, u.name AS user_name, u.email AS user_email, u.image AS user_image
            FROM ratings r
            JOIN users u ON u.id = r.user_id
            WHERE r.product_id = ANY($1)
            ORDER BY r.created_at DESC
            "#,
        )
        .bind(product_ids)
        .fetch_all(self.pool)
        .await?;

        let mut grouped: HashMap<String, Vec<Review>> = HashMap::new();
        for row in rows {
            grouped.entry(row.product_id.clone()).or_default().push(Review {
                id: ReviewId::new(row.id),
                rating: row.rating,
                review: row.review,
                images: row.images,
                approved: row.approved,
                created_at: row.created_at,
                user: ReviewAuthor {
                    id: UserId::new(row.user_id),
                    name: row.user_name,
                    email: row.user_email,
                    image: row.user_image,
                },
            });
        }

        Ok(grouped)
    }

    /// Whether a product exists and belongs to the given store.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn product_belongs_to_store(
        &self,
        product_id: &ProductId,
        store_id: &StoreId,
    ) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM products WHERE id = $1 AND store_id = $2)",
        )
        .bind(product_id.as_str())
        .bind(store_id.as_str())
        .fetch_one(self.pool)
        .await?;

        Ok(exists)
    }

    /// Insert a review.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(&self, review: &NewReview) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO ratings (id, user_id, product_id, rating, review, images, approved)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(review.id.as_str())
        .bind(review.user_id.as_str())
        .bind(review.product_id.as_str())
        .bind(review.rating)
        .bind(&review.review)
        .bind(&review.images)
        .bind(review.approved)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Which store owns the product a review was left on.
    ///
    /// Returns `None` when the review does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn store_of_review(
        &self,
        review_id: &ReviewId,
    ) -> Result<Option<StoreId>, RepositoryError> {
        let store_id: Option<String> = sqlx::query_scalar(
            r#"
            SELECT p.store_id
            FROM ratings r
            JOIN products p ON p.id = r.product_id
            WHERE r.id = $1
            "#,
        )
        .bind(review_id.as_str())
        .fetch_optional(self.pool)
        .await?;

        Ok(store_id.map(StoreId::new))
    }

    /// Delete a review.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the review doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn delete(&self, review_id: &ReviewId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM ratings WHERE id = $1")
            .bind(review_id.as_str())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
