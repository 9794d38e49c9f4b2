//! Order status enum.

use serde::{Deserialize, Serialize};

/// Fulfillment status of an order, as updated by the seller dashboard.
///
/// The wire form is `SNAKE_CASE`-free lower snake (`order_placed`,
/// `processing`, ...), matching the values stored in the `orders.status`
/// column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Order received, not yet picked.
    OrderPlaced,
    /// Being prepared for shipment.
    Processing,
    /// Handed to the carrier.
    Shipped,
    /// Delivered to the customer.
    Delivered,
}

impl OrderStatus {
    /// The status stored as a database string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OrderPlaced => "order_placed",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
        }
    }

    /// Parse a database string back into a status.
    #[must_use]
    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "order_placed" => Some(Self::OrderPlaced),
            "processing" => Some(Self::Processing),
            "shipped" => Some(Self::Shipped),
            "delivered" => Some(Self::Delivered),
            _ => None,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip() {
        for status in [
            OrderStatus::OrderPlaced,
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
        ] {
            assert_eq!(OrderStatus::from_str_opt(status.as_str()), Some(status));
        }
        assert_eq!(OrderStatus::from_str_opt("cancelled"), None);
    }

    #[test]
    fn test_status_serde_wire_form() {
        let json = serde_json::to_string(&OrderStatus::Shipped).expect("serialize");
        assert_eq!(json, "\"shipped\"");
        let back: OrderStatus = serde_json::from_str("\"order_placed\"").expect("deserialize");
        assert_eq!(back, OrderStatus::OrderPlaced);
    }
}
