//! Welcome-settings endpoints.

use axum::{Json, extract::State};
use serde::Serialize;
use tracing::{info, instrument};

use crate::db::WelcomeRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::session::CurrentUser;
use crate::models::welcome::{WelcomeSettings, WelcomeSettingsUpdate};
use crate::state::AppState;

/// Response wrapper for settings reads.
#[derive(Debug, Serialize)]
pub struct SettingsResponse {
    pub settings: WelcomeSettings,
}

/// Response for settings writes.
#[derive(Debug, Serialize)]
pub struct UpdateSettingsResponse {
    pub message: String,
    pub settings: WelcomeSettings,
}

/// Read the welcome-offer settings, creating defaults on first read.
///
/// # Errors
///
/// Returns 403 if the caller holds neither the seller nor the admin role,
/// or 500 on database failure.
#[instrument(skip_all)]
pub async fn get_settings(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<SettingsResponse>> {
    require_welcome_role(&user)?;

    let settings = state.welcome_settings().await?;

    Ok(Json(SettingsResponse { settings }))
}

/// Replace the welcome-offer settings.
///
/// The candidate is validated and normalized as a whole; any single-field
/// violation rejects the write and leaves the stored settings untouched.
///
/// # Errors
///
/// Returns 400 on validation failure, 403 on a missing role claim, or 500 on
/// database failure.
#[instrument(skip_all)]
pub async fn update_settings(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(candidate): Json<WelcomeSettingsUpdate>,
) -> Result<Json<UpdateSettingsResponse>> {
    require_welcome_role(&user)?;

    let settings = candidate
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    WelcomeRepository::new(state.pool()).upsert(&settings).await?;
    state.invalidate_welcome_settings().await;

    info!(
        coupon = %settings.coupon_code,
        discount = settings.discount_percentage,
        enabled = settings.enabled,
        cooldown_hours = settings.cooldown_hours,
        "welcome settings updated"
    );

    Ok(Json(UpdateSettingsResponse {
        message: "Settings updated successfully".to_owned(),
        settings,
    }))
}

/// Settings are readable and writable by sellers and admins only.
fn require_welcome_role(user: &CurrentUser) -> Result<()> {
    if user.role.can_manage_welcome() {
        Ok(())
    } else {
        Err(AppError::Forbidden("Unauthorized".to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use clementine_core::UserId;

    use crate::models::session::Role;

    fn user_with(role: Role) -> CurrentUser {
        CurrentUser {
            id: UserId::new("user_1"),
            email: "u@example.com".to_owned(),
            name: None,
            role,
        }
    }

    #[test]
    fn test_require_welcome_role() {
        assert!(require_welcome_role(&user_with(Role::Seller)).is_ok());
        assert!(require_welcome_role(&user_with(Role::Admin)).is_ok());
        assert!(matches!(
            require_welcome_role(&user_with(Role::Customer)),
            Err(AppError::Forbidden(_))
        ));
    }
}
