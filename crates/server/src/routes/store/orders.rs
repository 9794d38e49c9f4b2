//! Seller order endpoints.
//!
//! Listing carries an opportunistic repair: orders whose embedded user lost
//! their name or email (e.g. created before reconciliation ran) are patched
//! from a fresh identity-provider read. The corrected data goes back to the
//! caller either way; persisting it is a fire-and-forget side task whose
//! failure is observable only in logs.

use std::collections::HashMap;

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tracing::{debug, instrument, warn};

use clementine_core::{OrderId, OrderStatus, UserId};

use crate::clerk::client::IdentityProvider;
use crate::db::{OrderRepository, RepositoryError, UserRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireSeller;
use crate::models::order::Order;
use crate::state::AppState;

/// Response for the order listing.
#[derive(Debug, Serialize)]
pub struct OrdersResponse {
    pub orders: Vec<Order>,
}

/// Request body for a status update.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderRequest {
    pub order_id: OrderId,
    pub status: OrderStatus,
}

/// Response for a status update.
#[derive(Debug, Serialize)]
pub struct UpdateOrderResponse {
    pub message: String,
}

/// List all orders for the caller's store, newest first.
///
/// # Errors
///
/// Returns 401 without seller scope, or 500 on database failure. Repair
/// failures never fail the request.
#[instrument(skip_all, fields(store_id = %seller.store_id))]
pub async fn list_orders(
    State(state): State<AppState>,
    seller: RequireSeller,
) -> Result<Json<OrdersResponse>> {
    let mut orders = OrderRepository::new(state.pool())
        .list_for_store(&seller.store_id)
        .await?;

    repair_missing_users(&state, &mut orders).await;

    Ok(Json(OrdersResponse { orders }))
}

/// Update a single order's status, scoped by the caller's store.
///
/// # Errors
///
/// Returns 404 when the order does not exist in the caller's store - a
/// cross-store update must fail, never silently no-op.
#[instrument(skip_all, fields(store_id = %seller.store_id, order_id = %request.order_id))]
pub async fn update_order_status(
    State(state): State<AppState>,
    seller: RequireSeller,
    Json(request): Json<UpdateOrderRequest>,
) -> Result<Json<UpdateOrderResponse>> {
    OrderRepository::new(state.pool())
        .update_status(&request.order_id, &seller.store_id, request.status)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => {
                AppError::NotFound("order not found for this store".to_owned())
            }
            other => other.into(),
        })?;

    Ok(Json(UpdateOrderResponse {
        message: "Order status updated".to_owned(),
    }))
}

/// Patched contact fields for one user.
struct ContactFix {
    name: Option<String>,
    email: Option<String>,
}

/// Fetch fresh provider data for users with missing name/email, patch the
/// response objects in place, and persist the fixes without blocking or
/// failing the request.
async fn repair_missing_users(state: &AppState, orders: &mut [Order]) {
    let mut needs_repair: Vec<UserId> = orders
        .iter()
        .filter_map(|order| order.user.as_ref())
        .filter(|user| user.name.is_empty() || user.email.is_empty())
        .map(|user| user.id.clone())
        .collect();
    needs_repair.sort_unstable_by(|a, b| a.as_str().cmp(b.as_str()));
    needs_repair.dedup();

    if needs_repair.is_empty() {
        return;
    }

    // Per-user lookups run concurrently and are joined before patching.
    let mut lookups = JoinSet::new();
    for user_id in needs_repair {
        let clerk = state.clerk().clone();
        lookups.spawn(async move {
            let fetched = clerk.get_user(user_id.as_str()).await;
            (user_id, fetched)
        });
    }

    let mut fixes: HashMap<UserId, ContactFix> = HashMap::new();
    while let Some(joined) = lookups.join_next().await {
        let Ok((user_id, fetched)) = joined else {
            continue;
        };
        match fetched {
            Ok(provider_user) => {
                let fix = ContactFix {
                    name: provider_user.joined_name(),
                    email: provider_user.primary_email().map(str::to_owned),
                };
                // Only a lookup that produced something usable becomes a patch
                if fix.name.is_some() || fix.email.is_some() {
                    fixes.insert(user_id, fix);
                }
            }
            Err(e) => {
                debug!(user_id = %user_id, error = %e, "identity lookup failed during repair");
            }
        }
    }

    for order in orders.iter_mut() {
        let Some(user) = order.user.as_mut() else {
            continue;
        };
        let Some(fix) = fixes.get(&user.id) else {
            continue;
        };
        if let Some(name) = &fix.name {
            user.name.clone_from(name);
        }
        if let Some(email) = &fix.email {
            user.email.clone_from(email);
        }

        // Persist the patch for future requests; failure is log-only and
        // never reaches the caller.
        let pool = state.pool().clone();
        let user_id = user.id.clone();
        let name = user.name.clone();
        let email = user.email.clone();
        tokio::spawn(async move {
            if let Err(e) = UserRepository::new(&pool)
                .update_contact(&user_id, &name, &email)
                .await
            {
                warn!(user_id = %user_id, error = %e, "failed to persist repaired user");
            }
        });
    }
}
