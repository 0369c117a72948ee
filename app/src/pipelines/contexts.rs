// app/src/pipelines/contexts.rs

//! Data carried through each flow. Handlers see these wrapped in `FlowContext`.

use crate::models::{Cart, Customer, Order, OrderStatus, Principal, Product};
use crate::services::token_service::IssuedToken;
use crate::state::AppState;
use uuid::Uuid;

#[derive(Clone)]
pub struct SignupCtxData {
  pub app_state: AppState,
  pub email: String,
  pub password: String,
  pub first_name: String,
  pub last_name: String,
  pub address: Option<String>,
  pub password_hash: Option<String>,
  pub customer: Option<Customer>,
  pub token: Option<IssuedToken>,
}

#[derive(Clone)]
pub struct SigninCtxData {
  pub app_state: AppState,
  pub email: String,
  pub password: String,
  pub temp_password_hash: Option<String>,
  pub customer: Option<Customer>,
  pub token: Option<IssuedToken>,
}

#[derive(Clone)]
pub struct PasswordChangeCtxData {
  pub app_state: AppState,
  pub customer_id: Uuid,
  pub current_password: String,
  pub new_password: String,
  pub stored_hash: Option<String>,
  pub new_password_hash: Option<String>,
}

#[derive(Clone)]
pub struct AddToCartCtxData {
  pub app_state: AppState,
  pub principal: Principal,
  pub cart_id: Uuid,
  pub product_id: Uuid,
  pub quantity: i32,
  pub cart: Option<Cart>,
  pub product: Option<Product>,
}

#[derive(Clone)]
pub struct CheckoutCtxData {
  pub app_state: AppState,
  pub principal: Principal,
  pub cart_id: Uuid,
  pub cart: Option<Cart>,
  pub order: Option<Order>,
}

#[derive(Clone)]
pub struct OrderStatusCtxData {
  pub app_state: AppState,
  pub principal: Principal,
  pub order_id: Uuid,
  pub target: OrderStatus,
  pub previous: Option<OrderStatus>,
  pub order: Option<Order>,
}
