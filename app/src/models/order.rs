// app/src/models/order.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type as SqlxType};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, SqlxType)]
#[sqlx(type_name = "order_status_enum", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
  Pending,
  Paid,
  Shipped,
  Delivered,
  Cancelled,
}

impl OrderStatus {
  pub const ALL: [OrderStatus; 5] = [
    OrderStatus::Pending,
    OrderStatus::Paid,
    OrderStatus::Shipped,
    OrderStatus::Delivered,
    OrderStatus::Cancelled,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      OrderStatus::Pending => "pending",
      OrderStatus::Paid => "paid",
      OrderStatus::Shipped => "shipped",
      OrderStatus::Delivered => "delivered",
      OrderStatus::Cancelled => "cancelled",
    }
  }
}

impl fmt::Display for OrderStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for OrderStatus {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    OrderStatus::ALL
      .iter()
      .copied()
      .find(|status| status.as_str() == s)
      .ok_or_else(|| format!("Unknown order status '{}'.", s))
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct OrderItem {
  pub order_id: Uuid,
  pub product_id: Uuid,
  pub quantity: i32,
  pub price_cents: i64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Order {
  pub id: Uuid,
  pub customer_id: Uuid,
  pub cart_id: Uuid,
  /// Frozen at creation; product price changes never touch it.
  pub total_amount_cents: i64,
  pub order_status: OrderStatus,
  #[sqlx(skip)]
  pub items: Vec<OrderItem>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
  pub customer_id: Option<Uuid>,
  pub status: Option<OrderStatus>,
  pub limit: i64,
  pub offset: i64,
}

impl OrderFilter {
  pub fn accepts(&self, order: &Order) -> bool {
    self.customer_id.map_or(true, |c| order.customer_id == c) && self.status.map_or(true, |s| order.order_status == s)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn status_strings_round_trip_lowercase() {
    for status in OrderStatus::ALL {
      assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
    }
    assert_eq!(serde_json::to_string(&OrderStatus::Cancelled).unwrap(), "\"cancelled\"");
  }

  #[test]
  fn unknown_status_is_rejected() {
    assert!("PAID".parse::<OrderStatus>().is_err());
    assert!("refunded".parse::<OrderStatus>().is_err());
  }
}
