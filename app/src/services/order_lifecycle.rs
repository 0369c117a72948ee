// app/src/services/order_lifecycle.rs

//! Order status state machine and the cart-to-order snapshot.
//!
//! ```text
//! pending -> paid -> shipped -> delivered
//!    |        |
//!    +--------+--> cancelled
//! ```

use crate::errors::AppError;
use crate::models::{Cart, Order, OrderItem, OrderStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Orders above this total (10,000.00) are flagged for a manual look.
pub const HIGH_VALUE_ORDER_CENTS: i64 = 1_000_000;

pub fn valid_transitions(from: OrderStatus) -> &'static [OrderStatus] {
  match from {
    OrderStatus::Pending => &[OrderStatus::Paid, OrderStatus::Cancelled],
    OrderStatus::Paid => &[OrderStatus::Shipped, OrderStatus::Cancelled],
    OrderStatus::Shipped => &[OrderStatus::Delivered],
    OrderStatus::Delivered | OrderStatus::Cancelled => &[],
  }
}

pub fn is_terminal(status: OrderStatus) -> bool {
  valid_transitions(status).is_empty()
}

pub fn check_transition(from: OrderStatus, to: OrderStatus) -> Result<(), AppError> {
  if valid_transitions(from).contains(&to) {
    Ok(())
  } else {
    Err(AppError::InvalidTransition { from, to })
  }
}

/// Builds the pending order for `cart`. The cart must be open and non-empty.
///
/// The total is summed from the prices captured on the cart lines, so later
/// catalog price changes never reach an existing order.
pub fn snapshot_order(cart: &Cart, now: DateTime<Utc>) -> Result<Order, AppError> {
  cart.ensure_open()?;
  if cart.is_empty() {
    return Err(AppError::InvalidRequest("Cannot create an order from an empty cart.".to_string()));
  }
  let total_amount_cents = cart.total_cents()?;
  let order_id = Uuid::new_v4();
  let items = cart
    .items
    .iter()
    .map(|line| OrderItem {
      order_id,
      product_id: line.product_id,
      quantity: line.quantity,
      price_cents: line.price_cents,
    })
    .collect();
  Ok(Order {
    id: order_id,
    customer_id: cart.customer_id,
    cart_id: cart.id,
    total_amount_cents,
    order_status: OrderStatus::Pending,
    items,
    created_at: now,
    updated_at: now,
  })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderValidation {
  pub order_id: Uuid,
  pub is_valid: bool,
  pub errors: Vec<String>,
  pub warnings: Vec<String>,
}

/// Re-checks a stored order against the rules it was created under.
pub fn validate_order(order: &Order) -> OrderValidation {
  let mut errors = Vec::new();
  let mut warnings = Vec::new();

  if order.items.is_empty() {
    errors.push("Order must have at least one item.".to_string());
  }
  if order.items.iter().any(|item| item.quantity < 1) {
    errors.push("Every item must have a positive quantity.".to_string());
  }
  if order.total_amount_cents <= 0 {
    errors.push("Order total must be greater than zero.".to_string());
  }
  let line_sum = order.items.iter().try_fold(0i64, |total, item| {
    item
      .price_cents
      .checked_mul(i64::from(item.quantity))
      .and_then(|line| total.checked_add(line))
  });
  match line_sum {
    Some(sum) if sum == order.total_amount_cents => {}
    Some(sum) => errors.push(format!(
      "Order total {} does not match its items ({}).",
      order.total_amount_cents, sum
    )),
    None => errors.push("Order items overflow the total.".to_string()),
  }
  if order.total_amount_cents > HIGH_VALUE_ORDER_CENTS {
    warnings.push("High-value order requires additional verification.".to_string());
  }

  OrderValidation {
    order_id: order.id,
    is_valid: errors.is_empty(),
    errors,
    warnings,
  }
}
