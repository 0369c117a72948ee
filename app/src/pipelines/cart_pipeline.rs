// app/src/pipelines/cart_pipeline.rs

use crate::errors::AppError;
use crate::models::Cart;
use crate::pipelines::contexts::AddToCartCtxData;
use crate::services::ownership::{self, Action};
use flowline::{Flow, FlowContext, FlowRegistry, StepControl};
use tracing::{event, info, Level};

/// Registers the add-to-cart flow.
///
/// The cart is loaded before the guard runs because ownership is only known
/// once the cart is in hand. The merge itself happens inside the store, against
/// the cart as it stands at that moment.
pub fn register_add_to_cart_pipeline(registry: &FlowRegistry<AppError>) {
  let mut add_to_cart_p = Flow::<AddToCartCtxData, AppError>::new(
    "add_to_cart",
    &[
      ("validate_quantity", false, None),
      ("load_cart", false, None),
      ("authorize_cart_owner", false, None),
      ("fetch_product", false, None),
      ("merge_cart_line", false, None),
    ],
  );

  add_to_cart_p.on_root("validate_quantity", |ctx: FlowContext<AddToCartCtxData>| async move {
    let quantity = ctx.read().quantity;
    if quantity < 1 {
      return Err(AppError::InvalidRequest("Quantity must be at least 1.".to_string()));
    }
    Ok(StepControl::Continue)
  });

  add_to_cart_p.on_root("load_cart", |ctx: FlowContext<AddToCartCtxData>| async move {
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

  add_to_cart_p.on_root("authorize_cart_owner", |ctx: FlowContext<AddToCartCtxData>| async move {
    let guard = ctx.read();
    let owner = guard.cart.as_ref().map(|c| c.customer_id);
    ownership::require(&guard.principal, Action::CartAddProduct, owner)?;
    if let Some(cart) = guard.cart.as_ref() {
      cart.ensure_open()?;
    }
    Ok::<_, AppError>(StepControl::Continue)
  });

  add_to_cart_p.on_root("fetch_product", |ctx: FlowContext<AddToCartCtxData>| async move {
    let (product_id, store) = {
      let guard = ctx.read();
      (guard.product_id, guard.app_state.store.clone())
    };
    let product = store
      .get_product(product_id)
      .await?
      .ok_or_else(|| AppError::NotFound("Product not found.".to_string()))?;
    event!(Level::DEBUG, product_id = %product.id, price_cents = product.price_cents, "Product fetched for cart.");
    ctx.write().product = Some(product);
    Ok::<_, AppError>(StepControl::Continue)
  });

  add_to_cart_p.on_root("merge_cart_line", |ctx: FlowContext<AddToCartCtxData>| async move {
    let (cart_id, product, quantity, store) = {
      let guard = ctx.read();
      (guard.cart_id, guard.product.clone(), guard.quantity, guard.app_state.store.clone())
    };
    let product = product.ok_or_else(|| AppError::Internal("Product missing from cart context.".to_string()))?;
    let product_id = product.id;
    let saved = store
      .update_cart(
        cart_id,
        Box::new(move |cart: &mut Cart| cart.add_product(&product, quantity).map(|_| ())),
      )
      .await?;
    let merged = saved.line(product_id).map_or(0, |line| line.quantity);
    info!(cart_id = %saved.id, product_id = %product_id, quantity = merged, lines = saved.items.len(), "Cart updated.");
    ctx.write().cart = Some(saved);
    Ok::<_, AppError>(StepControl::Continue)
  });

  registry.register(add_to_cart_p);
  tracing::info!("Add-to-cart flow registered.");
}
