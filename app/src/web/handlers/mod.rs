// app/src/web/handlers/mod.rs

use serde::Deserialize;

pub mod auth_handlers;
pub mod cart_handlers;
pub mod customer_handlers;
pub mod order_handlers;
pub mod product_handlers;
pub mod review_handlers;
pub mod stock_handlers;

/// `?limit=&offset=` on list endpoints.
#[derive(Deserialize, Debug, Default)]
pub struct PageQuery {
  pub limit: Option<i64>,
  pub offset: Option<i64>,
}
