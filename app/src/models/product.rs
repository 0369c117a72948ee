// app/src/models/product.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Highest accepted unit price (1,000,000.00).
pub const MAX_PRICE_CENTS: i64 = 100_000_000;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Product {
  pub id: Uuid,
  pub name: String,
  pub description: Option<String>,
  pub category: Option<String>,
  pub price_cents: i64,
  pub stock_quantity: i32,
  /// Average rate of approved reviews, 0 when there are none.
  pub rating: f64,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Product {
  /// Case-insensitive match against name, description or category.
  pub fn matches_text(&self, needle_lower: &str) -> bool {
    let hit = |s: &str| s.to_lowercase().contains(needle_lower);
    hit(&self.name)
      || self.description.as_deref().map_or(false, hit)
      || self.category.as_deref().map_or(false, hit)
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
  pub name: String,
  pub description: Option<String>,
  pub category: Option<String>,
  pub price_cents: i64,
  pub stock_quantity: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductUpdate {
  pub name: Option<String>,
  pub description: Option<String>,
  pub category: Option<String>,
  pub price_cents: Option<i64>,
  pub stock_quantity: Option<i32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductSort {
  Name,
  Price,
  Rating,
  #[default]
  Newest,
}

#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
  pub search: Option<String>,
  pub category: Option<String>,
  pub min_price_cents: Option<i64>,
  pub max_price_cents: Option<i64>,
  pub in_stock: Option<bool>,
  pub sort_by: ProductSort,
  pub limit: i64,
  pub offset: i64,
}

impl ProductFilter {
  /// Applies the non-text filters; text search is handled by the caller's backend.
  pub fn accepts(&self, product: &Product) -> bool {
    if let Some(category) = &self.category {
      if product.category.as_deref().map(str::to_lowercase) != Some(category.to_lowercase()) {
        return false;
      }
    }
    if self.min_price_cents.map_or(false, |min| product.price_cents < min) {
      return false;
    }
    if self.max_price_cents.map_or(false, |max| product.price_cents > max) {
      return false;
    }
    match self.in_stock {
      Some(true) => product.stock_quantity > 0,
      Some(false) => product.stock_quantity == 0,
      None => true,
    }
  }
}
