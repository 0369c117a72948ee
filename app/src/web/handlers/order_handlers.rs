// app/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use std::str::FromStr;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{page_bounds, Order, OrderFilter, OrderStatus, Principal};
use crate::pipelines::contexts::{CheckoutCtxData, OrderStatusCtxData};
use crate::services::order_lifecycle;
use crate::services::ownership::{self, Action};
use crate::state::AppState;
use crate::web::extractors::{AdminCaller, CustomerCaller, OptionalCaller};
use crate::web::handlers::PageQuery;
use crate::web::response;
use flowline::{FlowContext, FlowOutcome};

#[derive(Deserialize, Debug)]
pub struct CreateOrderPayload {
  pub cart_id: Uuid,
}

#[derive(Deserialize, Debug)]
pub struct TransitionPayload {
  pub status: String,
}

#[derive(Deserialize, Debug, Default)]
pub struct OrderListQuery {
  pub status: Option<String>,
  pub limit: Option<i64>,
  pub offset: Option<i64>,
}

fn parse_status(raw: &str) -> Result<OrderStatus, AppError> {
  OrderStatus::from_str(raw).map_err(AppError::InvalidRequest)
}

async fn load_guarded_order(
  app_state: &AppState,
  principal: &Principal,
  order_id: Uuid,
  action: Action,
) -> Result<Order, AppError> {
  let order = app_state
    .store
    .get_order(order_id)
    .await?
    .ok_or_else(|| AppError::NotFound("Order not found.".to_string()))?;
  ownership::require(principal, action, Some(order.customer_id))?;
  Ok(order)
}

/// Customers see their own orders, administrators see all of them.
#[instrument(name = "handler::list_orders", skip(app_state, caller))]
pub async fn list_orders_handler(
  app_state: web::Data<AppState>,
  caller: OptionalCaller,
  query: web::Query<OrderListQuery>,
) -> Result<HttpResponse, AppError> {
  let owner = caller.principal.customer_id();
  ownership::require(&caller.principal, Action::OrderList, owner)?;
  let status = query.status.as_deref().map(parse_status).transpose()?;
  let (limit, offset) = page_bounds(query.limit, query.offset);
  let orders = app_state
    .store
    .list_orders(&OrderFilter {
      customer_id: owner,
      status,
      limit,
      offset,
    })
    .await?;
  Ok(response::ok(orders, "Orders retrieved."))
}

#[instrument(name = "handler::create_order", skip(app_state, caller, payload), fields(cart_id = %payload.cart_id))]
pub async fn create_order_handler(
  app_state: web::Data<AppState>,
  caller: CustomerCaller,
  payload: web::Json<CreateOrderPayload>,
) -> Result<HttpResponse, AppError> {
  let ctx = FlowContext::new(CheckoutCtxData {
    app_state: app_state.get_ref().clone(),
    principal: caller.principal,
    cart_id: payload.cart_id,
    cart: None,
    order: None,
  });

  match app_state.flows.run(ctx.clone()).await {
    Ok(FlowOutcome::Completed) => {
      let order = ctx
        .read()
        .order
        .clone()
        .ok_or_else(|| AppError::Internal("Checkout completed without an order.".to_string()))?;
      info!(order_id = %order.id, "Checkout successful.");
      Ok(response::created(order, "Order created."))
    }
    Ok(FlowOutcome::Stopped) => Err(AppError::PipelineHaltedByHandler),
    Err(app_err) => {
      warn!(error = %app_err, "Checkout flow failed.");
      Err(app_err)
    }
  }
}

#[instrument(name = "handler::order_status_summary", skip(app_state, caller))]
pub async fn order_status_summary_handler(
  app_state: web::Data<AppState>,
  caller: AdminCaller,
) -> Result<HttpResponse, AppError> {
  ownership::require(&caller.principal, Action::OrderReport, None)?;
  let counts = app_state.store.order_status_counts().await?;
  let summary: serde_json::Map<String, serde_json::Value> = OrderStatus::ALL
    .iter()
    .map(|status| {
      let count = counts.iter().find(|(s, _)| s == status).map_or(0, |(_, n)| *n);
      (status.as_str().to_string(), json!(count))
    })
    .collect();
  Ok(response::ok(summary, "Order status summary."))
}

#[instrument(name = "handler::orders_by_status", skip(app_state, caller))]
pub async fn orders_by_status_handler(
  app_state: web::Data<AppState>,
  caller: AdminCaller,
  path: web::Path<String>,
  query: web::Query<PageQuery>,
) -> Result<HttpResponse, AppError> {
  ownership::require(&caller.principal, Action::OrderReport, None)?;
  let status = parse_status(&path.into_inner())?;
  let (limit, offset) = page_bounds(query.limit, query.offset);
  let orders = app_state
    .store
    .list_orders(&OrderFilter {
      customer_id: None,
      status: Some(status),
      limit,
      offset,
    })
    .await?;
  Ok(response::ok(
    json!({ "status": status, "count": orders.len(), "orders": orders }),
    "Orders retrieved.",
  ))
}

#[instrument(name = "handler::get_order", skip(app_state, caller))]
pub async fn get_order_handler(
  app_state: web::Data<AppState>,
  caller: CustomerCaller,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let order = load_guarded_order(&app_state, &caller.principal, path.into_inner(), Action::OrderRead).await?;
  Ok(response::ok(order, "Order retrieved."))
}

#[instrument(name = "handler::order_items", skip(app_state, caller))]
pub async fn order_items_handler(
  app_state: web::Data<AppState>,
  caller: CustomerCaller,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let order = load_guarded_order(&app_state, &caller.principal, path.into_inner(), Action::OrderRead).await?;
  Ok(response::ok(order.items, "Order items retrieved."))
}

#[instrument(name = "handler::validate_order", skip(app_state, caller))]
pub async fn validate_order_handler(
  app_state: web::Data<AppState>,
  caller: CustomerCaller,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let order = load_guarded_order(&app_state, &caller.principal, path.into_inner(), Action::OrderRead).await?;
  let report = order_lifecycle::validate_order(&order);
  if !report.is_valid {
    warn!(order_id = %order.id, errors = report.errors.len(), "Order failed validation.");
  }
  Ok(response::ok(report, "Order validation completed."))
}

#[instrument(name = "handler::order_transitions", skip(app_state, caller))]
pub async fn order_transitions_handler(
  app_state: web::Data<AppState>,
  caller: CustomerCaller,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let order = load_guarded_order(&app_state, &caller.principal, path.into_inner(), Action::OrderRead).await?;
  Ok(response::ok(
    json!({
      "order_id": order.id,
      "current_status": order.order_status,
      "valid_transitions": order_lifecycle::valid_transitions(order.order_status),
    }),
    "Valid transitions retrieved.",
  ))
}

#[instrument(name = "handler::transition_order", skip(app_state, caller, payload), fields(target = %payload.status))]
pub async fn transition_order_handler(
  app_state: web::Data<AppState>,
  caller: AdminCaller,
  path: web::Path<Uuid>,
  payload: web::Json<TransitionPayload>,
) -> Result<HttpResponse, AppError> {
  let target = parse_status(&payload.status)?;
  let ctx = FlowContext::new(OrderStatusCtxData {
    app_state: app_state.get_ref().clone(),
    principal: caller.principal,
    order_id: path.into_inner(),
    target,
    previous: None,
    order: None,
  });

  match app_state.flows.run(ctx.clone()).await {
    Ok(FlowOutcome::Completed) => {
      let order = ctx
        .read()
        .order
        .clone()
        .ok_or_else(|| AppError::Internal("Status change completed without an order.".to_string()))?;
      Ok(response::ok(order, "Order status updated."))
    }
    Ok(FlowOutcome::Stopped) => Err(AppError::PipelineHaltedByHandler),
    Err(app_err) => {
      warn!(error = %app_err, "Order status flow failed.");
      Err(app_err)
    }
  }
}
