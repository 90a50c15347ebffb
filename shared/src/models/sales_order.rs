//! Sales Order Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::null_as_default;

/// Where the sale happened
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SalesChannel {
    Web,
    /// Craft fairs and street markets
    Market,
    Instagram,
    Wholesale,
    #[default]
    Other,
}

impl SalesChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SalesChannel::Web => "web",
            SalesChannel::Market => "market",
            SalesChannel::Instagram => "instagram",
            SalesChannel::Wholesale => "wholesale",
            SalesChannel::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "web" => Some(SalesChannel::Web),
            "market" => Some(SalesChannel::Market),
            "instagram" => Some(SalesChannel::Instagram),
            "wholesale" => Some(SalesChannel::Wholesale),
            "other" => Some(SalesChannel::Other),
            _ => None,
        }
    }
}

/// Order lifecycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Paid,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(OrderStatus::Pending),
            "paid" => Some(OrderStatus::Paid),
            "shipped" => Some(OrderStatus::Shipped),
            "delivered" => Some(OrderStatus::Delivered),
            "cancelled" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }
}

/// Order line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesOrderItem {
    /// Catalog product, when the line maps to one
    pub product_id: Option<String>,
    pub description: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

impl SalesOrderItem {
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Sales order entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesOrder {
    pub id: String,
    pub order_number: String,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub channel: SalesChannel,
    pub status: OrderStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub items: Vec<SalesOrderItem>,
    pub total: Decimal,
    /// When the sale happened (millis)
    pub placed_at: i64,
    pub notes: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create order payload
///
/// `total` defaults to the sum of the line totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesOrderCreate {
    pub order_number: Option<String>,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub channel: Option<SalesChannel>,
    pub status: Option<OrderStatus>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub items: Vec<SalesOrderItem>,
    pub total: Option<Decimal>,
    pub placed_at: Option<i64>,
    pub notes: Option<String>,
}

impl SalesOrderCreate {
    pub fn effective_total(&self) -> Decimal {
        self.total
            .unwrap_or_else(|| self.items.iter().map(SalesOrderItem::line_total).sum())
    }
}

/// Update order payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SalesOrderUpdate {
    pub customer_name: Option<String>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub customer_email: Option<Option<String>>,
    pub channel: Option<SalesChannel>,
    pub status: Option<OrderStatus>,
    pub items: Option<Vec<SalesOrderItem>>,
    pub total: Option<Decimal>,
    pub placed_at: Option<i64>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub notes: Option<Option<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_effective_total_sums_lines() {
        let create = SalesOrderCreate {
            order_number: None,
            customer_name: "Lucía".into(),
            customer_email: None,
            channel: None,
            status: None,
            items: vec![
                SalesOrderItem {
                    product_id: None,
                    description: "Cojín".into(),
                    quantity: 2,
                    unit_price: Decimal::from_str("12.50").unwrap(),
                },
                SalesOrderItem {
                    product_id: None,
                    description: "Bolso".into(),
                    quantity: 1,
                    unit_price: Decimal::from_str("30").unwrap(),
                },
            ],
            total: None,
            placed_at: None,
            notes: None,
        };
        assert_eq!(create.effective_total(), Decimal::from_str("55.00").unwrap());
    }

    #[test]
    fn test_status_and_channel_parse() {
        assert_eq!(OrderStatus::parse("shipped"), Some(OrderStatus::Shipped));
        assert_eq!(OrderStatus::parse("lost"), None);
        assert_eq!(SalesChannel::parse("market"), Some(SalesChannel::Market));
    }
}
