// app/src/pipelines/order_status_pipeline.rs

use crate::errors::AppError;
use crate::pipelines::contexts::OrderStatusCtxData;
use crate::services::order_lifecycle;
use crate::services::ownership::{self, Action};
use flowline::{Flow, FlowContext, FlowRegistry, StepControl};
use tracing::{info, warn};

/// Registers the order status transition flow. Only administrators get past
/// the first step.
pub fn register_order_status_pipeline(registry: &FlowRegistry<AppError>) {
  let mut status_p = Flow::<OrderStatusCtxData, AppError>::new(
    "order_status_transition",
    &[
      ("authorize_transition", false, None),
      ("load_order", false, None),
      ("check_transition", false, None),
      ("apply_transition", false, None),
    ],
  );

  status_p.on_root("authorize_transition", |ctx: FlowContext<OrderStatusCtxData>| async move {
    let principal = ctx.read().principal;
    ownership::require(&principal, Action::OrderTransition, None)?;
    Ok::<_, AppError>(StepControl::Continue)
  });

  status_p.on_root("load_order", |ctx: FlowContext<OrderStatusCtxData>| async move {
    let (order_id, store) = {
      let guard = ctx.read();
      (guard.order_id, guard.app_state.store.clone())
    };
    let order = store
      .get_order(order_id)
      .await?
      .ok_or_else(|| AppError::NotFound("Order not found.".to_string()))?;
    ctx.write().previous = Some(order.order_status);
    Ok::<_, AppError>(StepControl::Continue)
  });

  status_p.on_root("check_transition", |ctx: FlowContext<OrderStatusCtxData>| async move {
    let (from, to) = {
      let guard = ctx.read();
      (guard.previous, guard.target)
    };
    let from = from.ok_or_else(|| AppError::Internal("Order status missing from context.".to_string()))?;
    if let Err(e) = order_lifecycle::check_transition(from, to) {
      warn!(from = %from, to = %to, "Rejected order status transition.");
      return Err(e);
    }
    Ok(StepControl::Continue)
  });

  status_p.on_root("apply_transition", |ctx: FlowContext<OrderStatusCtxData>| async move {
    let (order_id, from, to, store) = {
      let guard = ctx.read();
      (guard.order_id, guard.previous, guard.target, guard.app_state.store.clone())
    };
    let from = from.ok_or_else(|| AppError::Internal("Order status missing from context.".to_string()))?;
    let order = store.transition_order_status(order_id, from, to).await?;
    info!(order_id = %order.id, from = %from, to = %to, "Order status changed.");
    ctx.write().order = Some(order);
    Ok::<_, AppError>(StepControl::Continue)
  });

  registry.register(status_p);
  tracing::info!("Order status flow registered.");
}
