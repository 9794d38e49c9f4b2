//! Authentication middleware and extractors.
//!
//! Provides extractors for requiring authentication in route handlers. Every
//! surface here is JSON or an HTMX fragment, so rejections are JSON error
//! bodies, never redirects.

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
};
use tower_sessions::Session;

use clementine_core::StoreId;

use crate::db::StoreRepository;
use crate::error::AppError;
use crate::models::session::{CurrentUser, session_keys};
use crate::state::AppState;

/// Extractor that requires an authenticated caller.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.email)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = current_user(parts)
            .await
            .ok_or_else(|| AppError::Unauthorized("not signed in".to_owned()))?;

        Ok(Self(user))
    }
}

/// Extractor that optionally gets the current caller.
///
/// Unlike `RequireAuth`, this does not reject the request if nobody is
/// signed in - the welcome modal and the token-gated sync endpoints both
/// serve guests.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(current_user(parts).await))
    }
}

/// Extractor that requires a seller with an approved store.
///
/// Resolves the caller's store through the seller-authorization lookup. A
/// signed-in caller without an approved store is an authorization failure,
/// not an empty result.
pub struct RequireSeller {
    pub user: CurrentUser,
    pub store_id: StoreId,
}

impl FromRequestParts<AppState> for RequireSeller {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = current_user(parts)
            .await
            .ok_or_else(|| AppError::Unauthorized("not authorized".to_owned()))?;

        let store_id = StoreRepository::new(state.pool())
            .store_for_seller(&user.id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("not authorized".to_owned()))?;

        Ok(Self { user, store_id })
    }
}

/// Read the current user out of the request's session, if any.
async fn current_user(parts: &mut Parts) -> Option<CurrentUser> {
    let session = parts.extensions.get::<Session>()?;
    session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
}

/// Helper to set the current user in the session (called by the sign-in flow).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Helper to clear the current user from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentUser>(session_keys::CURRENT_USER)
        .await?;
    Ok(())
}
