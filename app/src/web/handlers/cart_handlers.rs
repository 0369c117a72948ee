// app/src/web/handlers/cart_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{Cart, Principal, Product};
use crate::pipelines::contexts::AddToCartCtxData;
use crate::services::ownership::{self, Action};
use crate::state::AppState;
use crate::web::extractors::CustomerCaller;
use crate::web::response;
use flowline::{FlowContext, FlowOutcome};

#[derive(Deserialize, Debug, Default)]
pub struct CreateCartPayload {
  /// Required when an administrator creates a cart on a customer's behalf.
  pub customer_id: Option<Uuid>,
}

fn default_quantity() -> i32 {
  1
}

#[derive(Deserialize, Debug)]
pub struct AddProductPayload {
  pub product_id: Uuid,
  #[serde(default = "default_quantity")]
  pub quantity: i32,
}

#[derive(Deserialize, Debug)]
pub struct CartLinePayload {
  pub product_id: Uuid,
  pub quantity: i32,
}

#[derive(Deserialize, Debug)]
pub struct ReplaceCartPayload {
  pub items: Vec<CartLinePayload>,
}

/// Loads a cart and checks `action` against its owner.
async fn load_guarded_cart(
  app_state: &AppState,
  principal: &Principal,
  cart_id: Uuid,
  action: Action,
) -> Result<Cart, AppError> {
  let cart = app_state
    .store
    .get_cart(cart_id)
    .await?
    .ok_or_else(|| AppError::NotFound("Cart not found.".to_string()))?;
  ownership::require(principal, action, Some(cart.customer_id))?;
  Ok(cart)
}

async fn fetch_product(app_state: &AppState, product_id: Uuid) -> Result<Product, AppError> {
  app_state
    .store
    .get_product(product_id)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Product {} not found.", product_id)))
}

#[instrument(name = "handler::list_carts", skip(app_state, caller))]
pub async fn list_carts_handler(app_state: web::Data<AppState>, caller: CustomerCaller) -> Result<HttpResponse, AppError> {
  let owner = caller.principal.customer_id();
  ownership::require(&caller.principal, Action::CartRead, owner)?;
  let carts = app_state.store.list_carts(owner).await?;
  Ok(response::ok(carts, "Carts retrieved."))
}

/// An empty body is the same as `{}`; anything else must be valid JSON.
fn parse_create_cart_body(body: &[u8]) -> Result<CreateCartPayload, AppError> {
  if body.iter().all(u8::is_ascii_whitespace) {
    return Ok(CreateCartPayload::default());
  }
  serde_json::from_slice(body).map_err(|e| AppError::InvalidRequest(format!("Invalid JSON body: {}", e)))
}

#[instrument(name = "handler::create_cart", skip(app_state, caller, body))]
pub async fn create_cart_handler(
  app_state: web::Data<AppState>,
  caller: CustomerCaller,
  body: web::Bytes,
) -> Result<HttpResponse, AppError> {
  let requested = parse_create_cart_body(&body)?.customer_id;
  let customer_id = requested
    .or_else(|| caller.principal.customer_id())
    .ok_or_else(|| AppError::InvalidRequest("customer_id is required.".to_string()))?;
  ownership::require(&caller.principal, Action::CartCreate, Some(customer_id))?;

  let cart = app_state.store.create_cart(customer_id).await?;
  info!(cart_id = %cart.id, customer_id = %customer_id, "Cart created.");
  Ok(response::created(cart, "Cart created."))
}

#[instrument(name = "handler::get_cart", skip(app_state, caller))]
pub async fn get_cart_handler(
  app_state: web::Data<AppState>,
  caller: CustomerCaller,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let cart = load_guarded_cart(&app_state, &caller.principal, path.into_inner(), Action::CartRead).await?;
  Ok(response::ok(cart, "Cart retrieved."))
}

/// Replaces every line, re-capturing current prices.
#[instrument(name = "handler::replace_cart", skip(app_state, caller, payload))]
pub async fn replace_cart_handler(
  app_state: web::Data<AppState>,
  caller: CustomerCaller,
  path: web::Path<Uuid>,
  payload: web::Json<ReplaceCartPayload>,
) -> Result<HttpResponse, AppError> {
  let cart = load_guarded_cart(&app_state, &caller.principal, path.into_inner(), Action::CartUpdate).await?;
  let mut lines = Vec::with_capacity(payload.items.len());
  for line in &payload.items {
    lines.push((fetch_product(&app_state, line.product_id).await?, line.quantity));
  }
  let cart = app_state
    .store
    .update_cart(
      cart.id,
      Box::new(move |cart: &mut Cart| {
        cart.clear()?;
        for (product, quantity) in &lines {
          cart.add_product(product, *quantity)?;
        }
        Ok(())
      }),
    )
    .await?;
  Ok(response::ok(cart, "Cart updated."))
}

#[instrument(name = "handler::delete_cart", skip(app_state, caller))]
pub async fn delete_cart_handler(
  app_state: web::Data<AppState>,
  caller: CustomerCaller,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let cart = load_guarded_cart(&app_state, &caller.principal, path.into_inner(), Action::CartDelete).await?;
  if !app_state.store.delete_cart(cart.id).await? {
    return Err(AppError::NotFound("Cart not found.".to_string()));
  }
  info!(cart_id = %cart.id, converted = !cart.is_open(), "Cart deleted.");
  Ok(response::ok(serde_json::json!({}), "Cart deleted."))
}

#[instrument(
  name = "handler::add_product",
  skip(app_state, caller, payload),
  fields(product_id = %payload.product_id, quantity = payload.quantity)
)]
pub async fn add_product_handler(
  app_state: web::Data<AppState>,
  caller: CustomerCaller,
  path: web::Path<Uuid>,
  payload: web::Json<AddProductPayload>,
) -> Result<HttpResponse, AppError> {
  let ctx = FlowContext::new(AddToCartCtxData {
    app_state: app_state.get_ref().clone(),
    principal: caller.principal,
    cart_id: path.into_inner(),
    product_id: payload.product_id,
    quantity: payload.quantity,
    cart: None,
    product: None,
  });

  match app_state.flows.run(ctx.clone()).await {
    Ok(FlowOutcome::Completed) => {
      let cart = ctx
        .read()
        .cart
        .clone()
        .ok_or_else(|| AppError::Internal("Add-to-cart completed without a cart.".to_string()))?;
      Ok(response::ok(cart, "Product added to cart."))
    }
    Ok(FlowOutcome::Stopped) => Err(AppError::PipelineHaltedByHandler),
    Err(app_err) => {
      warn!(error = %app_err, "Add-to-cart flow failed.");
      Err(app_err)
    }
  }
}

#[instrument(name = "handler::remove_product", skip(app_state, caller))]
pub async fn remove_product_handler(
  app_state: web::Data<AppState>,
  caller: CustomerCaller,
  path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse, AppError> {
  let (cart_id, product_id) = path.into_inner();
  let cart = load_guarded_cart(&app_state, &caller.principal, cart_id, Action::CartRemoveProduct).await?;
  let cart = app_state
    .store
    .update_cart(
      cart.id,
      Box::new(move |cart: &mut Cart| cart.remove_product(product_id).map(|_| ())),
    )
    .await?;
  Ok(response::ok(cart, "Product removed from cart."))
}

#[instrument(name = "handler::update_quantity", skip(app_state, caller, payload))]
pub async fn update_quantity_handler(
  app_state: web::Data<AppState>,
  caller: CustomerCaller,
  path: web::Path<Uuid>,
  payload: web::Json<CartLinePayload>,
) -> Result<HttpResponse, AppError> {
  let cart = load_guarded_cart(&app_state, &caller.principal, path.into_inner(), Action::CartUpdateQuantity).await?;
  let product = fetch_product(&app_state, payload.product_id).await?;
  let quantity = payload.quantity;
  let cart = app_state
    .store
    .update_cart(
      cart.id,
      Box::new(move |cart: &mut Cart| cart.update_quantity(&product, quantity).map(|_| ())),
    )
    .await?;
  Ok(response::ok(cart, "Quantity updated."))
}

#[instrument(name = "handler::clear_cart", skip(app_state, caller))]
pub async fn clear_cart_handler(
  app_state: web::Data<AppState>,
  caller: CustomerCaller,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let cart = load_guarded_cart(&app_state, &caller.principal, path.into_inner(), Action::CartClear).await?;
  let cart = app_state
    .store
    .update_cart(cart.id, Box::new(|cart: &mut Cart| cart.clear()))
    .await?;
  Ok(response::ok(cart, "Cart cleared."))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn create_cart_body_is_optional_but_must_parse() {
    assert_eq!(parse_create_cart_body(b"").unwrap().customer_id, None);
    assert_eq!(parse_create_cart_body(b" \n").unwrap().customer_id, None);
    let id = Uuid::new_v4();
    let body = format!("{{\"customer_id\": \"{}\"}}", id);
    assert_eq!(parse_create_cart_body(body.as_bytes()).unwrap().customer_id, Some(id));
    assert!(matches!(
      parse_create_cart_body(br#"{"customer_id": "not-a-uuid"}"#),
      Err(AppError::InvalidRequest(_))
    ));
  }
}
