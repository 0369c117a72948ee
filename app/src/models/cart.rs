// app/src/models/cart.rs

//! The cart aggregate: an owner, an ordered list of lines and the conversion marker.

use crate::errors::AppError;
use crate::models::Product;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct CartItem {
  pub product_id: Uuid,
  pub quantity: i32,
  /// Unit price captured when the product was last added.
  pub price_cents: i64,
}

impl CartItem {
  /// `None` when the line total does not fit in an `i64`.
  pub fn line_total_cents(&self) -> Option<i64> {
    self.price_cents.checked_mul(i64::from(self.quantity))
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct Cart {
  pub id: Uuid,
  pub customer_id: Uuid,
  /// Set once the cart has been converted into an order.
  pub order_id: Option<Uuid>,
  pub items: Vec<CartItem>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Cart {
  pub fn new(customer_id: Uuid) -> Self {
    let now = Utc::now();
    Self {
      id: Uuid::new_v4(),
      customer_id,
      order_id: None,
      items: Vec::new(),
      created_at: now,
      updated_at: now,
    }
  }

  pub fn is_open(&self) -> bool {
    self.order_id.is_none()
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  pub fn ensure_open(&self) -> Result<(), AppError> {
    match self.order_id {
      None => Ok(()),
      Some(order_id) => Err(AppError::Conflict(format!(
        "Cart has already been converted into order {}.",
        order_id
      ))),
    }
  }

  pub fn line(&self, product_id: Uuid) -> Option<&CartItem> {
    self.items.iter().find(|i| i.product_id == product_id)
  }

  pub fn total_cents(&self) -> Result<i64, AppError> {
    self
      .items
      .iter()
      .try_fold(0i64, |total, line| line.line_total_cents().and_then(|t| total.checked_add(t)))
      .ok_or_else(|| AppError::InvalidRequest("Order total is too large.".to_string()))
  }

  /// Adds `quantity` of `product`, merging into an existing line.
  ///
  /// A merged line keeps one entry, sums the quantities and takes the price
  /// captured by this call. The resulting quantity must fit the product's stock.
  pub fn add_product(&mut self, product: &Product, quantity: i32) -> Result<&CartItem, AppError> {
    self.ensure_open()?;
    if quantity < 1 {
      return Err(AppError::InvalidRequest("Quantity must be at least 1.".to_string()));
    }
    let existing = self.items.iter().position(|i| i.product_id == product.id);
    let current = existing.map_or(0, |idx| self.items[idx].quantity);
    let wanted = current
      .checked_add(quantity)
      .ok_or_else(|| AppError::InvalidRequest("Quantity is too large.".to_string()))?;
    check_stock(product, wanted)?;

    let idx = match existing {
      Some(idx) => {
        let line = &mut self.items[idx];
        line.quantity = wanted;
        line.price_cents = product.price_cents;
        idx
      }
      None => {
        self.items.push(CartItem {
          product_id: product.id,
          quantity,
          price_cents: product.price_cents,
        });
        self.items.len() - 1
      }
    };
    self.updated_at = Utc::now();
    Ok(&self.items[idx])
  }

  pub fn remove_product(&mut self, product_id: Uuid) -> Result<CartItem, AppError> {
    self.ensure_open()?;
    let idx = self
      .items
      .iter()
      .position(|i| i.product_id == product_id)
      .ok_or_else(|| AppError::NotFound("Product is not in the cart.".to_string()))?;
    self.updated_at = Utc::now();
    Ok(self.items.remove(idx))
  }

  /// Sets a line's quantity, keeping its captured price.
  pub fn update_quantity(&mut self, product: &Product, quantity: i32) -> Result<&CartItem, AppError> {
    self.ensure_open()?;
    if quantity < 1 {
      return Err(AppError::InvalidRequest("Quantity must be at least 1.".to_string()));
    }
    check_stock(product, quantity)?;
    let line = self
      .items
      .iter_mut()
      .find(|i| i.product_id == product.id)
      .ok_or_else(|| AppError::NotFound("Product is not in the cart.".to_string()))?;
    line.quantity = quantity;
    self.updated_at = Utc::now();
    Ok(line)
  }

  pub fn clear(&mut self) -> Result<(), AppError> {
    self.ensure_open()?;
    self.items.clear();
    self.updated_at = Utc::now();
    Ok(())
  }
}

fn check_stock(product: &Product, wanted: i32) -> Result<(), AppError> {
  if wanted > product.stock_quantity {
    return Err(AppError::InvalidRequest(format!(
      "Insufficient stock for '{}'. Only {} available.",
      product.name, product.stock_quantity
    )));
  }
  Ok(())
}
