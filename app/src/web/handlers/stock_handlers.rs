// app/src/web/handlers/stock_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::services::ownership::{self, Action};
use crate::services::stock_levels::{self, LOW_STOCK_THRESHOLD};
use crate::state::AppState;
use crate::web::extractors::{AdminCaller, OptionalCaller};
use crate::web::response;

#[derive(Deserialize, Debug, Default)]
pub struct StockCheckQuery {
  pub quantity: Option<i32>,
}

#[derive(Deserialize, Debug, Default)]
pub struct LowStockQuery {
  pub threshold: Option<i32>,
}

#[instrument(name = "handler::check_stock", skip(app_state, caller))]
pub async fn check_stock_handler(
  app_state: web::Data<AppState>,
  caller: OptionalCaller,
  path: web::Path<Uuid>,
  query: web::Query<StockCheckQuery>,
) -> Result<HttpResponse, AppError> {
  ownership::require(&caller.principal, Action::StockRead, None)?;
  let product = app_state
    .store
    .get_product(path.into_inner())
    .await?
    .ok_or_else(|| AppError::NotFound("Product not found.".to_string()))?;
  let check = stock_levels::check_availability(&product, query.quantity.unwrap_or(1))?;
  Ok(response::ok(check, "Stock information retrieved."))
}

#[instrument(name = "handler::low_stock", skip(app_state, caller))]
pub async fn low_stock_handler(
  app_state: web::Data<AppState>,
  caller: AdminCaller,
  query: web::Query<LowStockQuery>,
) -> Result<HttpResponse, AppError> {
  ownership::require(&caller.principal, Action::StockReport, None)?;
  let threshold = query.threshold.unwrap_or(LOW_STOCK_THRESHOLD);
  if threshold < 1 {
    return Err(AppError::InvalidRequest("threshold must be at least 1.".to_string()));
  }
  let products = app_state.store.all_products().await?;
  let entries = stock_levels::low_stock(&products, threshold);
  info!(count = entries.len(), threshold = threshold, "Low stock report built.");
  Ok(response::ok(
    json!({ "count": entries.len(), "threshold_used": threshold, "products": entries }),
    "Low stock products retrieved.",
  ))
}

#[instrument(name = "handler::out_of_stock", skip(app_state, caller))]
pub async fn out_of_stock_handler(
  app_state: web::Data<AppState>,
  caller: AdminCaller,
) -> Result<HttpResponse, AppError> {
  ownership::require(&caller.principal, Action::StockReport, None)?;
  let products = app_state.store.all_products().await?;
  let entries = stock_levels::out_of_stock(&products);
  Ok(response::ok(
    json!({ "count": entries.len(), "products": entries }),
    "Out of stock products retrieved.",
  ))
}

#[instrument(name = "handler::stock_summary", skip(app_state, caller))]
pub async fn stock_summary_handler(
  app_state: web::Data<AppState>,
  caller: AdminCaller,
) -> Result<HttpResponse, AppError> {
  ownership::require(&caller.principal, Action::StockReport, None)?;
  let products = app_state.store.all_products().await?;
  let summary = stock_levels::summarize(&products)?;
  Ok(response::ok(summary, "Stock summary retrieved."))
}
