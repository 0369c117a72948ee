// app/src/pipelines/checkout_pipeline.rs

use crate::errors::AppError;
use crate::pipelines::contexts::CheckoutCtxData;
use crate::services::ownership::{self, Action};
use flowline::{Flow, FlowContext, FlowRegistry, StepControl};
use tracing::{event, info, warn, Level};

/// Registers the checkout flow: one open, non-empty cart becomes one pending order.
pub fn register_checkout_pipeline(registry: &FlowRegistry<AppError>) {
  let mut checkout_p = Flow::<CheckoutCtxData, AppError>::new(
    "checkout",
    &[
      ("load_cart", false, None),
      ("authorize_checkout", false, None),
      ("ensure_cart_convertible", false, None),
      ("create_order", false, None),
    ],
  );

  checkout_p.on_root("load_cart", |ctx: FlowContext<CheckoutCtxData>| async move {
    let (cart_id, store) = {
      let guard = ctx.read();
      (guard.cart_id, guard.app_state.store.clone())
    };
    let cart = store
      .get_cart(cart_id)
      .await?
      .ok_or_else(|| AppError::NotFound("Cart not found.".to_string()))?;
    ctx.write().cart = Some(cart);
    Ok::<_, AppError>(StepControl::Continue)
  });

  checkout_p.on_root("authorize_checkout", |ctx: FlowContext<CheckoutCtxData>| async move {
    let guard = ctx.read();
    let owner = guard.cart.as_ref().map(|c| c.customer_id);
    ownership::require(&guard.principal, Action::OrderCreate, owner)?;
    Ok::<_, AppError>(StepControl::Continue)
  });

  // Early rejection with the same rules the store re-checks inside its transaction.
  checkout_p.on_root("ensure_cart_convertible", |ctx: FlowContext<CheckoutCtxData>| async move {
    let guard = ctx.read();
    let cart = guard
      .cart
      .as_ref()
      .ok_or_else(|| AppError::Internal("Cart missing from checkout context.".to_string()))?;
    if let Err(e) = cart.ensure_open() {
      warn!(cart_id = %cart.id, "Checkout of an already converted cart.");
      return Err(e);
    }
    if cart.is_empty() {
      return Err(AppError::InvalidRequest("Cannot create an order from an empty cart.".to_string()));
    }
    let total_cents = cart.total_cents()?;
    event!(Level::DEBUG, cart_id = %cart.id, total_cents = total_cents, "Cart ready for checkout.");
    Ok(StepControl::Continue)
  });

  checkout_p.on_root("create_order", |ctx: FlowContext<CheckoutCtxData>| async move {
    let (cart_id, store) = {
      let guard = ctx.read();
      (guard.cart_id, guard.app_state.store.clone())
    };
    let order = store.create_order_from_cart(cart_id).await?;
    info!(
      order_id = %order.id,
      customer_id = %order.customer_id,
      total_amount_cents = order.total_amount_cents,
      "Order created from cart."
    );
    ctx.write().order = Some(order);
    Ok::<_, AppError>(StepControl::Continue)
  });

  registry.register(checkout_p);
  tracing::info!("Checkout flow registered.");
}
