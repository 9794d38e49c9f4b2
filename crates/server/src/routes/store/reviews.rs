//! Seller review endpoints.
//!
//! Sellers can list the reviews on their products, add a review on a
//! customer's behalf (pre-approved, with optional photos), and delete
//! reviews. The customer-facing submission flow lives in the shop
//! application, not here.

use axum::{
    Json,
    extract::{Multipart, Query, State},
};
use chrono::Utc;
use rand::{Rng, distr::Alphanumeric};
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tracing::{info, instrument};
use uuid::Uuid;

use clementine_core::{Email, ProductId, ReviewId, UserId};

use crate::db::{ReviewRepository, UserRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireSeller;
use crate::models::review::{NewReview, ProductReviews, Review, ReviewAuthor};
use crate::models::user::UserRecord;
use crate::services::imagekit::ImageKitError;
use crate::state::AppState;

/// Avatar assigned to store-created reviewer accounts.
const PLACEHOLDER_AVATAR: &str = "/static/placeholder-avatar.png";

/// Storage folder for review photos.
const REVIEW_IMAGE_FOLDER: &str = "reviews";

/// Response for the review listing.
#[derive(Debug, Serialize)]
pub struct ReviewsResponse {
    pub products: Vec<ProductReviews>,
}

/// Response for review creation.
#[derive(Debug, Serialize)]
pub struct CreateReviewResponse {
    pub success: bool,
    pub message: String,
    pub review: Review,
}

/// Query parameters for review deletion.
#[derive(Debug, Deserialize)]
pub struct DeleteReviewParams {
    #[serde(rename = "reviewId")]
    pub review_id: Option<String>,
}

/// Response for review deletion.
#[derive(Debug, Serialize)]
pub struct DeleteReviewResponse {
    pub success: bool,
    pub message: String,
}

/// List the caller's products with their reviews, newest review first.
///
/// # Errors
///
/// Returns 401 without seller scope, or 500 on database failure.
#[instrument(skip_all, fields(store_id = %seller.store_id))]
pub async fn list_reviews(
    State(state): State<AppState>,
    seller: RequireSeller,
) -> Result<Json<ReviewsResponse>> {
    let products = ReviewRepository::new(state.pool())
        .list_for_store(&seller.store_id)
        .await?;

    Ok(Json(ReviewsResponse { products }))
}

/// Collected multipart form fields for a review submission.
#[derive(Default)]
struct ReviewForm {
    product_id: Option<String>,
    rating: Option<i32>,
    review: Option<String>,
    customer_name: Option<String>,
    customer_email: Option<String>,
    images: Vec<(String, Vec<u8>)>,
}

/// Add a review to one of the caller's products.
///
/// Multipart form fields: `productId`, `rating`, `review`, `customerName`,
/// `customerEmail`, and zero or more `images`. The reviewer is resolved by
/// email or created as a placeholder user, and the review is created
/// pre-approved.
///
/// # Errors
///
/// Returns 400 when a required field is missing, 403 when the product
/// belongs to another store, or 500 when an upload or database write fails.
#[instrument(skip_all, fields(store_id = %seller.store_id))]
pub async fn create_review(
    State(state): State<AppState>,
    seller: RequireSeller,
    multipart: Multipart,
) -> Result<Json<CreateReviewResponse>> {
    let form = read_form(multipart).await?;

    let (Some(product_id), Some(rating), Some(review_text), Some(customer_name), Some(customer_email)) = (
        form.product_id,
        form.rating,
        form.review,
        form.customer_name,
        form.customer_email,
    ) else {
        return Err(AppError::BadRequest("Missing required fields".to_owned()));
    };

    let email = Email::parse(&customer_email)
        .map_err(|e| AppError::BadRequest(format!("Invalid customer email: {e}")))?;
    let product_id = ProductId::new(product_id);

    // Verify the product belongs to this store before any side effects
    let reviews = ReviewRepository::new(state.pool());
    if !reviews
        .product_belongs_to_store(&product_id, &seller.store_id)
        .await?
    {
        return Err(AppError::Forbidden(
            "Product not found or not authorized".to_owned(),
        ));
    }

    let image_urls = upload_review_images(&state, form.images).await?;

    let users = UserRepository::new(state.pool());
    let reviewer = match users.find_by_email(&email).await? {
        Some(existing) => existing,
        None => {
            let record = UserRecord {
                id: UserId::new(manual_user_id()),
                name: customer_name,
                email: email.into_inner(),
                image: PLACEHOLDER_AVATAR.to_owned(),
            };
            users.create_manual(&record).await?;
            record
        }
    };

    let new_review = NewReview {
        id: ReviewId::new(Uuid::new_v4().to_string()),
        user_id: reviewer.id.clone(),
        product_id,
        rating,
        review: review_text,
        images: image_urls,
        // Store-added reviews are auto-approved
        approved: true,
    };
    reviews.create(&new_review).await?;

    info!(review_id = %new_review.id, "store review created");

    Ok(Json(CreateReviewResponse {
        success: true,
        message: "Review added successfully".to_owned(),
        review: Review {
            id: new_review.id,
            rating: new_review.rating,
            review: new_review.review,
            images: new_review.images,
            approved: new_review.approved,
            created_at: Utc::now(),
            user: ReviewAuthor {
                id: reviewer.id,
                name: reviewer.name,
                email: reviewer.email,
                image: reviewer.image,
            },
        },
    }))
}

/// Delete a review from one of the caller's products.
///
/// # Errors
///
/// Returns 400 without a `reviewId`, 404 for an unknown review, or 403 when
/// the review's product belongs to another store (the review stays put).
#[instrument(skip_all, fields(store_id = %seller.store_id))]
pub async fn delete_review(
    State(state): State<AppState>,
    seller: RequireSeller,
    Query(params): Query<DeleteReviewParams>,
) -> Result<Json<DeleteReviewResponse>> {
    let Some(review_id) = params.review_id else {
        return Err(AppError::BadRequest("Review ID required".to_owned()));
    };
    let review_id = ReviewId::new(review_id);

    let reviews = ReviewRepository::new(state.pool());

    let owner = reviews
        .store_of_review(&review_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Review not found".to_owned()))?;

    if owner != seller.store_id {
        return Err(AppError::Forbidden(
            "Unauthorized to delete this review".to_owned(),
        ));
    }

    reviews.delete(&review_id).await?;

    Ok(Json(DeleteReviewResponse {
        success: true,
        message: "Review deleted successfully".to_owned(),
    }))
}

/// Drain the multipart stream into plain fields.
async fn read_form(mut multipart: Multipart) -> Result<ReviewForm> {
    let mut form = ReviewForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {e}")))?
    {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };

        match name.as_str() {
            "productId" => form.product_id = Some(read_text(field).await?),
            "rating" => form.rating = read_text(field).await?.trim().parse().ok(),
            "review" => form.review = Some(read_text(field).await?),
            "customerName" => form.customer_name = Some(read_text(field).await?),
            "customerEmail" => form.customer_email = Some(read_text(field).await?),
            "images" => {
                let file_name = field.file_name().unwrap_or("image").to_owned();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Invalid image upload: {e}")))?;
                form.images.push((file_name, data.to_vec()));
            }
            _ => {}
        }
    }

    // Empty strings are as missing as absent fields
    form.product_id = form.product_id.filter(|v| !v.trim().is_empty());
    form.review = form.review.filter(|v| !v.trim().is_empty());
    form.customer_name = form.customer_name.filter(|v| !v.trim().is_empty());
    form.customer_email = form.customer_email.filter(|v| !v.trim().is_empty());

    Ok(form)
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String> {
    field
        .text()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart field: {e}")))
}

/// Upload attached photos concurrently and return delivery URLs in the
/// original attachment order.
async fn upload_review_images(
    state: &AppState,
    images: Vec<(String, Vec<u8>)>,
) -> Result<Vec<String>> {
    if images.is_empty() {
        return Ok(Vec::new());
    }

    let stamp = Utc::now().timestamp_millis();
    let mut uploads = JoinSet::new();
    for (index, (file_name, data)) in images.into_iter().enumerate() {
        let client = state.images().clone();
        let stored_name = format!("review_{stamp}_{file_name}");
        uploads.spawn(async move {
            let uploaded = client.upload(&stored_name, data, REVIEW_IMAGE_FOLDER).await;
            (index, uploaded)
        });
    }

    let mut urls: Vec<(usize, String)> = Vec::new();
    let mut failure: Option<ImageKitError> = None;
    while let Some(joined) = uploads.join_next().await {
        let Ok((index, uploaded)) = joined else {
            continue;
        };
        match uploaded {
            Ok(image) => urls.push((index, state.images().delivery_url(&image.file_path))),
            Err(e) => failure = Some(e),
        }
    }

    // One failed upload fails the submission; partial image sets are worse
    // than an explicit error the seller can retry.
    if let Some(e) = failure {
        return Err(e.into());
    }

    urls.sort_unstable_by_key(|(index, _)| *index);
    Ok(urls.into_iter().map(|(_, url)| url).collect())
}

/// Synthesize an ID for a store-created reviewer account.
///
/// These live in their own `manual_*` namespace, distinct from
/// provider-assigned IDs.
fn manual_user_id() -> String {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(9)
        .map(char::from)
        .collect();
    format!("manual_{}_{}", Utc::now().timestamp_millis(), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_user_id_shape() {
        let id = manual_user_id();
        assert!(id.starts_with("manual_"));

        let parts: Vec<&str> = id.splitn(3, '_').collect();
        assert_eq!(parts.len(), 3);
        assert!(parts.get(1).is_some_and(|ts| ts.parse::<i64>().is_ok()));
        assert_eq!(parts.get(2).map(|s| s.len()), Some(9));
    }

    #[test]
    fn test_manual_user_ids_are_unique() {
        let a = manual_user_id();
        let b = manual_user_id();
        assert_ne!(a, b);
    }
}
