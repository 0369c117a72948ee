// app/src/web/handlers/product_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::product::MAX_PRICE_CENTS;
use crate::models::{page_bounds, NewProduct, ProductFilter, ProductSort, ProductUpdate};
use crate::services::ownership::{self, Action};
use crate::state::AppState;
use crate::web::extractors::AdminCaller;
use crate::web::response;

#[derive(Deserialize, Debug, Default)]
pub struct ListProductsQuery {
  pub search: Option<String>,
  pub category: Option<String>,
  pub min_price_cents: Option<i64>,
  pub max_price_cents: Option<i64>,
  pub in_stock: Option<bool>,
  pub sort_by: Option<ProductSort>,
  pub limit: Option<i64>,
  pub offset: Option<i64>,
}

#[derive(Deserialize, Debug)]
pub struct SearchQuery {
  pub q: Option<String>,
  pub limit: Option<i64>,
  pub offset: Option<i64>,
}

fn non_blank(value: Option<String>) -> Option<String> {
  value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn validate_price_and_stock(price_cents: Option<i64>, stock_quantity: Option<i32>) -> Result<(), AppError> {
  if price_cents.map_or(false, |p| p < 0) {
    return Err(AppError::InvalidRequest("Price cannot be negative.".to_string()));
  }
  if price_cents.map_or(false, |p| p > MAX_PRICE_CENTS) {
    return Err(AppError::InvalidRequest(format!(
      "Price cannot exceed {} cents.",
      MAX_PRICE_CENTS
    )));
  }
  if stock_quantity.map_or(false, |s| s < 0) {
    return Err(AppError::InvalidRequest("Stock quantity cannot be negative.".to_string()));
  }
  Ok(())
}

#[instrument(name = "handler::list_products", skip(app_state))]
pub async fn list_products_handler(
  app_state: web::Data<AppState>,
  query: web::Query<ListProductsQuery>,
) -> Result<HttpResponse, AppError> {
  let query = query.into_inner();
  if let (Some(min), Some(max)) = (query.min_price_cents, query.max_price_cents) {
    if min > max {
      return Err(AppError::InvalidRequest(
        "min_price_cents cannot exceed max_price_cents.".to_string(),
      ));
    }
  }
  let (limit, offset) = page_bounds(query.limit, query.offset);
  let filter = ProductFilter {
    search: non_blank(query.search),
    category: non_blank(query.category),
    min_price_cents: query.min_price_cents,
    max_price_cents: query.max_price_cents,
    in_stock: query.in_stock,
    sort_by: query.sort_by.unwrap_or_default(),
    limit,
    offset,
  };
  let products = app_state.store.list_products(&filter).await?;
  info!(count = products.len(), "Products listed.");
  Ok(response::ok(products, "Products retrieved."))
}

#[instrument(name = "handler::search_products", skip(app_state))]
pub async fn search_products_handler(
  app_state: web::Data<AppState>,
  query: web::Query<SearchQuery>,
) -> Result<HttpResponse, AppError> {
  let query = query.into_inner();
  let needle =
    non_blank(query.q).ok_or_else(|| AppError::InvalidRequest("Search query 'q' is required.".to_string()))?;
  let (limit, offset) = page_bounds(query.limit, query.offset);
  let filter = ProductFilter {
    search: Some(needle),
    limit,
    offset,
    ..ProductFilter::default()
  };
  let products = app_state.store.list_products(&filter).await?;
  Ok(response::ok(products, "Search results."))
}

#[instrument(name = "handler::get_product", skip(app_state))]
pub async fn get_product_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let product = app_state
    .store
    .get_product(path.into_inner())
    .await?
    .ok_or_else(|| AppError::NotFound("Product not found.".to_string()))?;
  Ok(response::ok(product, "Product retrieved."))
}

#[instrument(name = "handler::create_product", skip(app_state, caller, payload))]
pub async fn create_product_handler(
  app_state: web::Data<AppState>,
  caller: AdminCaller,
  payload: web::Json<NewProduct>,
) -> Result<HttpResponse, AppError> {
  ownership::require(&caller.principal, Action::ProductWrite, None)?;
  let mut new_product = payload.into_inner();
  new_product.name = new_product.name.trim().to_string();
  if new_product.name.is_empty() {
    return Err(AppError::InvalidRequest("Product name is required.".to_string()));
  }
  validate_price_and_stock(Some(new_product.price_cents), Some(new_product.stock_quantity))?;

  let product = app_state.store.insert_product(new_product).await?;
  info!(product_id = %product.id, "Product created.");
  Ok(response::created(product, "Product created."))
}

/// Changes apply to carts filled afterwards; existing orders keep their snapshot.
#[instrument(name = "handler::update_product", skip(app_state, caller, payload))]
pub async fn update_product_handler(
  app_state: web::Data<AppState>,
  caller: AdminCaller,
  path: web::Path<Uuid>,
  payload: web::Json<ProductUpdate>,
) -> Result<HttpResponse, AppError> {
  ownership::require(&caller.principal, Action::ProductWrite, None)?;
  let update = payload.into_inner();
  if update.name.as_ref().map_or(false, |n| n.trim().is_empty()) {
    return Err(AppError::InvalidRequest("Product name cannot be blank.".to_string()));
  }
  validate_price_and_stock(update.price_cents, update.stock_quantity)?;

  let product = app_state
    .store
    .update_product(path.into_inner(), update)
    .await?
    .ok_or_else(|| AppError::NotFound("Product not found.".to_string()))?;
  info!(product_id = %product.id, price_cents = product.price_cents, "Product updated.");
  Ok(response::ok(product, "Product updated."))
}
