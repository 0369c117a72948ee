// app/src/services/stock_levels.rs

//! Stock level classification and the admin stock reports.

use crate::errors::AppError;
use crate::models::Product;
use serde::Serialize;
use uuid::Uuid;

pub const LOW_STOCK_THRESHOLD: i32 = 10;
pub const CRITICAL_STOCK_THRESHOLD: i32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StockLevel {
  OutOfStock,
  Critical,
  Low,
  Normal,
}

pub fn stock_level(quantity: i32) -> StockLevel {
  if quantity <= 0 {
    StockLevel::OutOfStock
  } else if quantity <= CRITICAL_STOCK_THRESHOLD {
    StockLevel::Critical
  } else if quantity <= LOW_STOCK_THRESHOLD {
    StockLevel::Low
  } else {
    StockLevel::Normal
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct StockCheck {
  pub product_id: Uuid,
  pub available: bool,
  pub current_stock: i32,
  pub requested_quantity: i32,
  /// Stock left if the request were fulfilled; the current stock when it cannot be.
  pub remaining_after_fulfillment: i32,
  pub stock_level: StockLevel,
}

pub fn check_availability(product: &Product, requested_quantity: i32) -> Result<StockCheck, AppError> {
  if requested_quantity < 1 {
    return Err(AppError::InvalidRequest("Quantity must be a positive integer.".to_string()));
  }
  let current = product.stock_quantity;
  let available = current >= requested_quantity;
  Ok(StockCheck {
    product_id: product.id,
    available,
    current_stock: current,
    requested_quantity,
    remaining_after_fulfillment: if available { current - requested_quantity } else { current },
    stock_level: stock_level(current),
  })
}

#[derive(Debug, Clone, Serialize)]
pub struct StockEntry {
  pub product_id: Uuid,
  pub name: String,
  pub current_stock: i32,
  pub stock_level: StockLevel,
}

impl From<&Product> for StockEntry {
  fn from(product: &Product) -> Self {
    Self {
      product_id: product.id,
      name: product.name.clone(),
      current_stock: product.stock_quantity,
      stock_level: stock_level(product.stock_quantity),
    }
  }
}

/// In-stock products at or below `threshold` units.
pub fn low_stock(products: &[Product], threshold: i32) -> Vec<StockEntry> {
  products
    .iter()
    .filter(|p| p.stock_quantity > 0 && p.stock_quantity <= threshold)
    .map(StockEntry::from)
    .collect()
}

pub fn out_of_stock(products: &[Product]) -> Vec<StockEntry> {
  products
    .iter()
    .filter(|p| p.stock_quantity <= 0)
    .map(StockEntry::from)
    .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StockThresholds {
  pub low_stock: i32,
  pub critical_stock: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockSummary {
  pub total_products: usize,
  pub normal_stock: usize,
  /// Every in-stock product at or below the low threshold, critical ones included.
  pub low_stock: usize,
  pub critical_stock: usize,
  pub out_of_stock: usize,
  pub total_stock_value_cents: i64,
  pub thresholds: StockThresholds,
}

pub fn summarize(products: &[Product]) -> Result<StockSummary, AppError> {
  let count = |level: StockLevel| products.iter().filter(|p| stock_level(p.stock_quantity) == level).count();
  let total_stock_value_cents = products
    .iter()
    .try_fold(0i64, |total, p| {
      p.price_cents
        .checked_mul(i64::from(p.stock_quantity.max(0)))
        .and_then(|value| total.checked_add(value))
    })
    .ok_or_else(|| AppError::Internal("Stock value does not fit in 64 bits.".to_string()))?;

  Ok(StockSummary {
    total_products: products.len(),
    normal_stock: count(StockLevel::Normal),
    low_stock: count(StockLevel::Low) + count(StockLevel::Critical),
    critical_stock: count(StockLevel::Critical),
    out_of_stock: count(StockLevel::OutOfStock),
    total_stock_value_cents,
    thresholds: StockThresholds {
      low_stock: LOW_STOCK_THRESHOLD,
      critical_stock: CRITICAL_STOCK_THRESHOLD,
    },
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::Utc;

  fn product(name: &str, price_cents: i64, stock_quantity: i32) -> Product {
    let now = Utc::now();
    Product {
      id: Uuid::new_v4(),
      name: name.to_string(),
      description: None,
      category: None,
      price_cents,
      stock_quantity,
      rating: 0.0,
      created_at: now,
      updated_at: now,
    }
  }

  #[test]
  fn levels_follow_thresholds() {
    assert_eq!(stock_level(0), StockLevel::OutOfStock);
    assert_eq!(stock_level(1), StockLevel::Critical);
    assert_eq!(stock_level(5), StockLevel::Critical);
    assert_eq!(stock_level(6), StockLevel::Low);
    assert_eq!(stock_level(10), StockLevel::Low);
    assert_eq!(stock_level(11), StockLevel::Normal);
  }

  #[test]
  fn availability_reports_remaining_stock() {
    let p = product("Cable", 100, 4);
    let ok = check_availability(&p, 3).unwrap();
    assert!(ok.available);
    assert_eq!(ok.remaining_after_fulfillment, 1);

    let short = check_availability(&p, 5).unwrap();
    assert!(!short.available);
    assert_eq!(short.remaining_after_fulfillment, 4);
    assert_eq!(short.stock_level, StockLevel::Critical);

    assert!(matches!(check_availability(&p, 0), Err(AppError::InvalidRequest(_))));
  }

  #[test]
  fn reports_split_the_catalog() {
    let catalog = vec![
      product("Empty", 500, 0),
      product("Few", 200, 3),
      product("Some", 100, 8),
      product("Plenty", 50, 40),
    ];
    let low: Vec<_> = low_stock(&catalog, LOW_STOCK_THRESHOLD).into_iter().map(|e| e.name).collect();
    assert_eq!(low, vec!["Few", "Some"]);
    assert_eq!(out_of_stock(&catalog).len(), 1);

    let summary = summarize(&catalog).unwrap();
    assert_eq!(summary.total_products, 4);
    assert_eq!(summary.normal_stock, 1);
    assert_eq!(summary.low_stock, 2);
    assert_eq!(summary.critical_stock, 1);
    assert_eq!(summary.out_of_stock, 1);
    assert_eq!(summary.total_stock_value_cents, 200 * 3 + 100 * 8 + 50 * 40);
  }
}
