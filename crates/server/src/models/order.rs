//! Order domain types.
//!
//! Orders are owned by the checkout subsystem; this service reads them for
//! the seller dashboard (with nested user/address/items) and writes only the
//! `status` field, scoped by store ownership.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use clementine_core::{AddressId, OrderId, ProductId, StoreId, UserId};

use super::user::UserRecord;

/// An order with its nested relations, newest-first in listings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub store_id: StoreId,
    pub user_id: Option<UserId>,
    /// Current status as stored; unknown historical values pass through.
    pub status: String,
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
    pub user: Option<UserRecord>,
    pub address: Option<OrderAddress>,
    pub order_items: Vec<OrderItem>,
}

/// Shipping address attached to an order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderAddress {
    pub id: AddressId,
    pub name: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country: String,
    pub phone: String,
}

/// A single line item with its product.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub quantity: i32,
    pub price: Decimal,
    pub product: OrderProduct,
}

/// Product summary embedded in a line item.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderProduct {
    pub id: ProductId,
    pub name: String,
}
