//! Welcome modal fragment routes.
//!
//! The storefront loads `GET /welcome/modal` on page load (HTMX); an empty
//! body means "no modal". Settings come straight from the database with the
//! built-in defaults as a fallback when that read fails - an unreachable
//! settings row must never break a storefront page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    response::{Html, IntoResponse, Response},
};
use tower_sessions::Session;
use tracing::{instrument, warn};

use crate::db::OrderRepository;
use crate::error::Result;
use crate::middleware::OptionalAuth;
use crate::state::AppState;
use crate::welcome::{
    Audience, Outcome, Precheck, SessionLastShown, SystemClock, Visitor, WelcomeFlow,
};

/// The welcome modal fragment.
#[derive(Template, WebTemplate)]
#[template(path = "welcome/modal.html")]
pub struct WelcomeModalTemplate {
    pub coupon_code: String,
    pub discount_percentage: i32,
    pub first_order: bool,
    pub display_name: Option<String>,
}

/// Render the welcome modal when the caller is eligible, or nothing.
///
/// # Errors
///
/// Returns 500 only when the signed-in caller's order count cannot be read;
/// settings failures fall back to the defaults instead.
#[instrument(skip_all)]
pub async fn modal(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    session: Session,
) -> Result<Response> {
    let settings = match state.welcome_settings().await {
        Ok(settings) => settings,
        Err(e) => {
            warn!(error = %e, "welcome settings unavailable, using defaults");
            crate::models::welcome::WelcomeSettings::default()
        }
    };

    let mut flow = WelcomeFlow::new(SystemClock, SessionLastShown::new(session));

    if flow.precheck(&settings).await == Precheck::Suppressed {
        return Ok(empty_fragment());
    }

    let visitor = match &user {
        Some(current) => {
            let order_count = OrderRepository::new(state.pool())
                .count_for_user(&current.id)
                .await?;
            Visitor::SignedIn { order_count }
        }
        None => Visitor::Guest,
    };

    match flow.resolve(visitor).await {
        Outcome::Suppressed => Ok(empty_fragment()),
        Outcome::Shown(audience) => Ok(WelcomeModalTemplate {
            coupon_code: settings.coupon_code,
            discount_percentage: settings.discount_percentage,
            first_order: audience == Audience::FirstOrder,
            display_name: user.and_then(|u| u.name),
        }
        .into_response()),
    }
}

/// Close the modal.
///
/// Dismissal is terminal for this page view and performs no timestamp
/// mutation - the cooldown keeps running from when the modal was shown.
#[instrument(skip_all)]
pub async fn dismiss() -> Response {
    empty_fragment()
}

fn empty_fragment() -> Response {
    Html(String::new()).into_response()
}
