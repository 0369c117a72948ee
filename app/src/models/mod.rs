// app/src/models/mod.rs

//! Domain entities and their request-side companions.

pub mod api_key;
pub mod cart;
pub mod customer;
pub mod order;
pub mod principal;
pub mod product;
pub mod review;

pub use api_key::{ApiKey, ApiKeyRole};
pub use cart::{Cart, CartItem};
pub use customer::{Customer, CustomerUpdate, NewCustomer};
pub use order::{Order, OrderFilter, OrderItem, OrderStatus};
pub use principal::Principal;
pub use product::{NewProduct, Product, ProductFilter, ProductSort, ProductUpdate};
pub use review::{NewReview, Review, ReviewUpdate};

/// Default page size for list endpoints.
pub const DEFAULT_PAGE_LIMIT: i64 = 50;
pub const MAX_PAGE_LIMIT: i64 = 100;

/// Clamps `limit`/`offset` query values into a usable page.
pub fn page_bounds(limit: Option<i64>, offset: Option<i64>) -> (i64, i64) {
  let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT);
  let offset = offset.unwrap_or(0).max(0);
  (limit, offset)
}
