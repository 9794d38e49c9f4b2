//! Review (rating) domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use clementine_core::{ProductId, ReviewId, UserId};

/// A product review with its author, as returned to the seller dashboard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: ReviewId,
    pub rating: i32,
    pub review: String,
    pub images: Vec<String>,
    pub approved: bool,
    pub created_at: DateTime<Utc>,
    pub user: ReviewAuthor,
}

/// Reviewer identity embedded in a review.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewAuthor {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub image: String,
}

/// A store's product with its reviews, approved and not, newest first.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductReviews {
    pub id: ProductId,
    pub name: String,
    pub reviews: Vec<Review>,
}

/// Payload for creating a review.
///
/// Store-submitted reviews are the only creation path here and are always
/// pre-approved.
#[derive(Debug, Clone)]
pub struct NewReview {
    pub id: ReviewId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub rating: i32,
    pub review: String,
    pub images: Vec<String>,
    pub approved: bool,
}
