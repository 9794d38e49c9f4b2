//! Bulk identity sync endpoints.
//!
//! Two of the three entry points into the shared reconciliation service (the
//! third is the CLI command). Both are thin authorization adapters: they
//! differ only in how the caller proves themselves and in response shape,
//! never in sync behavior.

use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, header::AUTHORIZATION},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::db::PgUserStore;
use crate::error::{AppError, Result};
use crate::middleware::OptionalAuth;
use crate::models::session::CurrentUser;
use crate::services::sync::{SyncFailure, SyncReport, UserSyncService};
use crate::state::AppState;

/// Response for `POST /api/admin/sync-clerk-users`.
#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub message: String,
    pub synced: u32,
    pub skipped: u32,
    pub errors: Vec<SyncFailure>,
}

/// Response for `GET /api/admin/quick-sync-users`.
#[derive(Debug, Serialize)]
pub struct QuickSyncResponse {
    pub success: bool,
    pub message: String,
    pub result: QuickSyncResult,
}

/// Nested result payload in the quick-sync response.
#[derive(Debug, Serialize)]
pub struct QuickSyncResult {
    pub updated: u32,
    pub skipped: u32,
    pub total: u32,
}

/// Query parameters for the quick-sync endpoint.
#[derive(Debug, Deserialize)]
pub struct QuickSyncParams {
    pub secret: Option<String>,
}

/// Bulk sync all identity-provider users into the database.
///
/// Authorization: a static bearer token, or a signed-in caller whose email is
/// on the admin allow-list.
///
/// # Errors
///
/// Returns 401 if neither authorization path succeeds, or 500 if the
/// provider listing fails.
#[instrument(skip_all)]
pub async fn sync_users(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    headers: HeaderMap,
) -> Result<Json<SyncResponse>> {
    let admin = &state.config().admin;

    let token_ok = bearer_token(&headers)
        .is_some_and(|token| secret_matches(admin.sync_token.as_ref(), token));

    if !token_ok && !is_admin_caller(user.as_ref(), &state) {
        return Err(AppError::Unauthorized("Unauthorized".to_owned()));
    }

    let report = run_sync(&state).await?;

    Ok(Json(SyncResponse {
        message: "Sync completed".to_owned(),
        synced: report.synced,
        skipped: report.skipped,
        errors: report.errors,
    }))
}

/// Quick sync endpoint, callable from a browser with `?secret=`.
///
/// Authorization: the configured quick-sync secret as a query parameter,
/// with the admin-email session check as a fallback.
///
/// # Errors
///
/// Returns 401 if neither authorization path succeeds, or 500 if the
/// provider listing fails.
#[instrument(skip_all)]
pub async fn quick_sync_users(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Query(params): Query<QuickSyncParams>,
) -> Result<Json<QuickSyncResponse>> {
    let admin = &state.config().admin;

    let secret_ok = params
        .secret
        .as_deref()
        .is_some_and(|secret| secret_matches(admin.quick_sync_secret.as_ref(), secret));

    if !secret_ok && !is_admin_caller(user.as_ref(), &state) {
        return Err(AppError::Unauthorized(
            "Unauthorized. Provide ?secret= parameter or sign in as admin".to_owned(),
        ));
    }

    let report = run_sync(&state).await?;

    Ok(Json(QuickSyncResponse {
        success: true,
        message: format!("Synced {} users from the identity provider", report.synced),
        result: QuickSyncResult {
            updated: report.synced,
            skipped: report.skipped,
            total: report.total(),
        },
    }))
}

/// Run the shared reconciliation service against application state.
async fn run_sync(state: &AppState) -> Result<SyncReport> {
    let service = UserSyncService::new(
        state.clerk().clone(),
        PgUserStore::new(state.pool().clone()),
    );
    Ok(service.reconcile().await?)
}

/// Extract a bearer token from the Authorization header.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

/// Compare a presented credential against an optional configured secret.
///
/// An unconfigured secret disables that path entirely (never matches).
fn secret_matches(configured: Option<&SecretString>, presented: &str) -> bool {
    configured.is_some_and(|secret| secret.expose_secret() == presented)
}

/// Whether the signed-in caller's email is on the admin allow-list.
fn is_admin_caller(user: Option<&CurrentUser>, state: &AppState) -> bool {
    user.is_some_and(|u| state.config().admin.is_admin_email(&u.email))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_matches() {
        let secret = SecretString::from("s3cret");
        assert!(secret_matches(Some(&secret), "s3cret"));
        assert!(!secret_matches(Some(&secret), "wrong"));
        // Unconfigured secret disables the path
        assert!(!secret_matches(None, "s3cret"));
    }

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "Bearer abc123".parse().expect("header"));
        assert_eq!(bearer_token(&headers), Some("abc123"));

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "Basic abc123".parse().expect("header"));
        assert_eq!(bearer_token(&headers), None);

        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }
}
