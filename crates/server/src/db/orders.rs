//! Order repository for database operations.
//!
//! Orders belong to the checkout subsystem; this repository reads them for
//! the seller dashboard and writes only the status column, always scoped by
//! `(id, store_id)` so one store can never touch another store's orders.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};

use clementine_core::{OrderId, OrderStatus, StoreId, UserId};

use super::RepositoryError;
use crate::models::order::{Order, OrderAddress, OrderItem, OrderProduct};
use crate::models::user::UserRecord;

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

/// Flattened order row with left-joined user and address columns.
#[derive(FromRow)]
struct OrderRow {
    id: String,
    store_id: String,
    user_id: Option<String>,
    status: String,
    total: Decimal,
    created_at: DateTime<Utc>,
    user_name: Option<String>,
    user_email: Option<String>,
    user_image: Option<String>,
    address_id: Option<String>,
    address_name: Option<String>,
    street: Option<String>,
    city: Option<String>,
    state: Option<String>,
    zip: Option<String>,
    country: Option<String>,
    phone: Option<String>,
}

#[derive(FromRow)]
struct ItemRow {
    order_id: String,
    quantity: i32,
    price: Decimal,
    product_id: String,
    product_name: String,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all orders for a store, newest first, with nested
    /// user/address/line-items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_for_store(&self, store_id: &StoreId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT o.id, o.store_id, o.user_id, o.status, o.total, o.created_at,
                   u.name AS user_name, u.email AS user_email, u.image AS user_image,
                   a.id AS address_id, a.name AS address_name,
                   a.street, a.city, a.state, a.zip, a.country, a.phone
            FROM orders o
            LEFT JOIN users u ON u.id = o.user_id
            LEFT JOIN addresses a ON a.id = o.address_id
            WHERE o.store_id = $1
            ORDER BY o.created_at DESC
            "#,
        )
        .bind(store_id.as_str())
        .fetch_all(self.pool)
        .await?;

        let order_ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
        let mut items_by_order = self.items_for_orders(&order_ids).await?;

        let orders = rows
            .into_iter()
            .map(|row| {
                let order_items = items_by_order.remove(&row.id).unwrap_or_default();
                build_order(row, order_items)
            })
            .collect();

        Ok(orders)
    }

    /// Line items (with product summaries) for a set of orders, grouped by
    /// order ID.
    async fn items_for_orders(
        &self,
        order_ids: &[String],
    ) -> Result<HashMap<String, Vec<OrderItem>>, RepositoryError> {
        if order_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, ItemRow>(
            r#"
            SELECT oi.order_id, oi.quantity, oi.price,
                   p.id AS product_id, p.name AS product_name
            FROM order_items oi
            JOIN products p ON p.id = oi.product_id
            WHERE oi.order_id = ANY($1)
            "#,
        )
        .bind(order_ids)
        .fetch_all(self.pool)
        .await?;

        let mut grouped: HashMap<String, Vec<OrderItem>> = HashMap::new();
        for row in rows {
            grouped.entry(row.order_id).or_default().push(OrderItem {
                quantity: row.quantity,
                price: row.price,
                product: OrderProduct {
                    id: row.product_id.into(),
                    name: row.product_name,
                },
            });
        }

        Ok(grouped)
    }

    /// Update an order's status, scoped by store ownership.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no order matches both the ID
    /// and the store - updating another store's order must fail, not silently
    /// no-op.
    pub async fn update_status(
        &self,
        order_id: &OrderId,
        store_id: &StoreId,
        status: OrderStatus,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = $3, updated_at = NOW()
            WHERE id = $1 AND store_id = $2
            "#,
        )
        .bind(order_id.as_str())
        .bind(store_id.as_str())
        .bind(status.as_str())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// How many orders a user has placed (for first-order eligibility).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_for_user(&self, user_id: &UserId) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE user_id = $1")
            .bind(user_id.as_str())
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }
}

fn build_order(row: OrderRow, order_items: Vec<OrderItem>) -> Order {
    // A user row with all contact columns NULL still renders; the orders
    // route repairs missing name/email from the identity provider.
    let user = row.user_id.as_ref().map(|user_id| UserRecord {
        id: UserId::new(user_id.clone()),
        name: row.user_name.clone().unwrap_or_default(),
        email: row.user_email.clone().unwrap_or_default(),
        image: row.user_image.clone().unwrap_or_default(),
    });

    let address = row.address_id.as_ref().map(|address_id| OrderAddress {
        id: address_id.clone().into(),
        name: row.address_name.clone().unwrap_or_default(),
        street: row.street.clone().unwrap_or_default(),
        city: row.city.clone().unwrap_or_default(),
        state: row.state.clone().unwrap_or_default(),
        zip: row.zip.clone().unwrap_or_default(),
        country: row.country.clone().unwrap_or_default(),
        phone: row.phone.clone().unwrap_or_default(),
    });

    Order {
        id: OrderId::new(row.id),
        store_id: StoreId::new(row.store_id),
        user_id: row.user_id.map(UserId::new),
        status: row.status,
        total: row.total,
        created_at: row.created_at,
        user,
        address,
        order_items,
    }
}
