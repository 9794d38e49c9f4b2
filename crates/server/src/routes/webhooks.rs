//! Identity provider webhook receiver.
//!
//! Applies a single-user create/update/ignore-delete policy: profile events
//! upsert the canonical record (idempotent under redelivery), deletions are
//! acknowledged without touching the database so order references never
//! orphan, and unknown event kinds are acknowledged as forward-compatible
//! no-ops.

use axum::{
    Json,
    extract::State,
    http::HeaderMap,
};
use secrecy::ExposeSecret;
use serde_json::{Value, json};
use tracing::{info, instrument, warn};

use crate::clerk::types::{WebhookEvent, WebhookUser};
use crate::clerk::webhook::WebhookVerifier;
use crate::db::UserRepository;
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Receive a signed identity-provider event.
///
/// # Errors
///
/// Returns 500 when no signing secret is configured (fail closed), 401 when
/// the delivery fails verification, or 400 when a profile event carries no
/// primary email.
#[instrument(skip_all)]
pub async fn clerk_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<Value>> {
    // Fail closed: without a configured secret no delivery can be trusted
    let Some(secret) = state.config().clerk.webhook_secret.as_ref() else {
        return Err(AppError::Internal("Webhook secret not configured".to_owned()));
    };

    let verifier = WebhookVerifier::new(secret.expose_secret())
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let msg_id = svix_header(&headers, "svix-id")?;
    let timestamp = svix_header(&headers, "svix-timestamp")?;
    let signature = svix_header(&headers, "svix-signature")?;

    verifier
        .verify(msg_id, timestamp, signature, &body)
        .map_err(|e| {
            warn!(error = %e, "webhook verification failed");
            AppError::Unauthorized("Webhook verification failed".to_owned())
        })?;

    let event: WebhookEvent = serde_json::from_str(&body)
        .map_err(|e| AppError::BadRequest(format!("Invalid event payload: {e}")))?;

    match event.kind.as_str() {
        "user.created" | "user.updated" => {
            let user: WebhookUser = serde_json::from_value(event.data)
                .map_err(|e| AppError::BadRequest(format!("Invalid user payload: {e}")))?;

            // No primary email, no write
            let Some(profile) = user.to_profile() else {
                return Err(AppError::BadRequest("No email found".to_owned()));
            };

            UserRepository::new(state.pool())
                .upsert_profile(&profile)
                .await?;

            info!(user_id = %profile.id, kind = %event.kind, "user synced from webhook");
            Ok(Json(json!({ "success": true, "userId": profile.id })))
        }
        "user.deleted" => {
            // The record stays: deleting it would orphan order references
            let user_id = event.data.get("id").and_then(Value::as_str).unwrap_or("");
            info!(user_id = %user_id, "user deleted upstream, record retained");
            Ok(Json(json!({ "success": true, "message": "User deletion noted" })))
        }
        other => {
            // Acknowledge everything else so the provider stops redelivering
            info!(kind = %other, "ignoring unhandled webhook event");
            Ok(Json(json!({ "success": true })))
        }
    }
}

/// Missing svix headers make the delivery unverifiable, which is a
/// verification failure, not a malformed request.
fn svix_header<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Webhook verification failed".to_owned()))
}
