// app/src/web/handlers/customer_handlers.rs

use actix_web::{web, HttpResponse};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{page_bounds, CustomerUpdate, OrderFilter};
use crate::services::ownership::{self, Action};
use crate::state::AppState;
use crate::web::extractors::{AdminCaller, CustomerCaller};
use crate::web::handlers::PageQuery;
use crate::web::response;

fn customer_not_found() -> AppError {
  AppError::NotFound("Customer not found.".to_string())
}

pub(crate) fn check_customer_update(update: &CustomerUpdate) -> Result<(), AppError> {
  if update.is_empty() {
    return Err(AppError::InvalidRequest("No fields to update.".to_string()));
  }
  let names_blank = [&update.first_name, &update.last_name]
    .into_iter()
    .flatten()
    .any(|name| name.trim().is_empty());
  if names_blank {
    return Err(AppError::InvalidRequest("Names cannot be blank.".to_string()));
  }
  Ok(())
}

#[instrument(name = "handler::list_customers", skip(app_state, caller))]
pub async fn list_customers_handler(
  app_state: web::Data<AppState>,
  caller: AdminCaller,
  query: web::Query<PageQuery>,
) -> Result<HttpResponse, AppError> {
  ownership::require(&caller.principal, Action::CustomerList, None)?;
  let (limit, offset) = page_bounds(query.limit, query.offset);
  let customers = app_state.store.list_customers(limit, offset).await?;
  Ok(response::ok(customers, "Customers retrieved."))
}

#[instrument(name = "handler::get_customer", skip(app_state, caller))]
pub async fn get_customer_handler(
  app_state: web::Data<AppState>,
  caller: CustomerCaller,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let customer_id = path.into_inner();
  ownership::require(&caller.principal, Action::ProfileRead, Some(customer_id))?;
  let customer = app_state
    .store
    .get_customer(customer_id)
    .await?
    .ok_or_else(customer_not_found)?;
  Ok(response::ok(customer, "Customer retrieved."))
}

#[instrument(name = "handler::update_customer", skip(app_state, caller, payload))]
pub async fn update_customer_handler(
  app_state: web::Data<AppState>,
  caller: CustomerCaller,
  path: web::Path<Uuid>,
  payload: web::Json<CustomerUpdate>,
) -> Result<HttpResponse, AppError> {
  let customer_id = path.into_inner();
  ownership::require(&caller.principal, Action::ProfileUpdate, Some(customer_id))?;
  let update = payload.into_inner();
  check_customer_update(&update)?;
  let customer = app_state
    .store
    .update_customer(customer_id, update)
    .await?
    .ok_or_else(customer_not_found)?;
  info!(customer_id = %customer.id, "Customer profile updated.");
  Ok(response::ok(customer, "Customer updated."))
}

#[instrument(name = "handler::delete_customer", skip(app_state, caller))]
pub async fn delete_customer_handler(
  app_state: web::Data<AppState>,
  caller: CustomerCaller,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let customer_id = path.into_inner();
  ownership::require(&caller.principal, Action::ProfileDelete, Some(customer_id))?;
  if !app_state.store.delete_customer(customer_id).await? {
    return Err(customer_not_found());
  }
  info!(customer_id = %customer_id, "Customer deleted.");
  Ok(response::ok(serde_json::json!({}), "Customer deleted."))
}

#[instrument(name = "handler::customer_cart", skip(app_state, caller))]
pub async fn customer_cart_handler(
  app_state: web::Data<AppState>,
  caller: CustomerCaller,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let customer_id = path.into_inner();
  ownership::require(&caller.principal, Action::CartRead, Some(customer_id))?;
  let cart = app_state
    .store
    .open_cart_for(customer_id)
    .await?
    .ok_or_else(|| AppError::NotFound("Customer has no open cart.".to_string()))?;
  Ok(response::ok(cart, "Cart retrieved."))
}

#[instrument(name = "handler::customer_orders", skip(app_state, caller))]
pub async fn customer_orders_handler(
  app_state: web::Data<AppState>,
  caller: CustomerCaller,
  path: web::Path<Uuid>,
  query: web::Query<PageQuery>,
) -> Result<HttpResponse, AppError> {
  let customer_id = path.into_inner();
  ownership::require(&caller.principal, Action::OrderList, Some(customer_id))?;
  let (limit, offset) = page_bounds(query.limit, query.offset);
  let orders = app_state
    .store
    .list_orders(&OrderFilter {
      customer_id: Some(customer_id),
      status: None,
      limit,
      offset,
    })
    .await?;
  Ok(response::ok(orders, "Orders retrieved."))
}

/// Every review the customer wrote, pending moderation or not.
#[instrument(name = "handler::customer_reviews", skip(app_state, caller))]
pub async fn customer_reviews_handler(
  app_state: web::Data<AppState>,
  caller: CustomerCaller,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let customer_id = path.into_inner();
  ownership::require(&caller.principal, Action::ReviewRead, Some(customer_id))?;
  if app_state.store.get_customer(customer_id).await?.is_none() {
    return Err(customer_not_found());
  }
  let reviews = app_state.store.list_customer_reviews(customer_id).await?;
  Ok(response::ok(reviews, "Reviews retrieved."))
}
