//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                        - Liveness check
//! GET  /health/ready                  - Readiness check (database ping)
//!
//! # Admin
//! POST /api/admin/sync-clerk-users    - Bulk identity sync (bearer token or admin email)
//! GET  /api/admin/quick-sync-users    - Bulk identity sync (?secret= or admin email)
//! GET  /api/admin/welcome-settings    - Read welcome-offer settings (seller/admin)
//! POST /api/admin/welcome-settings    - Replace welcome-offer settings (seller/admin)
//!
//! # Store (seller-scoped)
//! GET    /api/store/orders            - Orders with nested user/address/items
//! POST   /api/store/orders            - Update one order's status
//! GET    /api/store/reviews           - Products with their reviews
//! POST   /api/store/reviews           - Add a pre-approved review (multipart)
//! DELETE /api/store/reviews?reviewId= - Delete a review
//!
//! # Webhooks
//! POST /api/webhooks/clerk            - Signed identity-provider events
//!
//! # Welcome modal (HTMX fragments)
//! GET  /welcome/modal                 - Render the modal when eligible
//! POST /welcome/dismiss               - Close the modal
//! ```

pub mod admin;
pub mod store;
pub mod webhooks;
pub mod welcome;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the admin API router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/sync-clerk-users", post(admin::sync::sync_users))
        .route("/quick-sync-users", get(admin::sync::quick_sync_users))
        .route(
            "/welcome-settings",
            get(admin::welcome::get_settings).post(admin::welcome::update_settings),
        )
}

/// Create the seller-scoped store API router.
pub fn store_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/orders",
            get(store::orders::list_orders).post(store::orders::update_order_status),
        )
        .route(
            "/reviews",
            get(store::reviews::list_reviews)
                .post(store::reviews::create_review)
                .delete(store::reviews::delete_review),
        )
}

/// Create the webhook router.
pub fn webhook_routes() -> Router<AppState> {
    Router::new().route("/clerk", post(webhooks::clerk_webhook))
}

/// Create the welcome modal fragment router.
pub fn welcome_routes() -> Router<AppState> {
    Router::new()
        .route("/modal", get(welcome::modal))
        .route("/dismiss", post(welcome::dismiss))
}

/// Create all routes for the service.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api/admin", admin_routes())
        .nest("/api/store", store_routes())
        .nest("/api/webhooks", webhook_routes())
        .nest("/welcome", welcome_routes())
}

/// Build the application router with the session layer applied.
///
/// The binary adds static file serving and the Sentry tower layers on top.
#[must_use]
pub fn app(state: AppState) -> Router {
    let session_layer = crate::middleware::create_session_layer(state.pool(), state.config());

    routes().layer(session_layer).with_state(state)
}
