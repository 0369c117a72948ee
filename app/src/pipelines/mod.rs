// app/src/pipelines/mod.rs

//! Flows for the multi-step write paths: sign-up, sign-in, password change,
//! add-to-cart, checkout and order status changes. Read paths go straight to the store.

use crate::errors::AppError;
use flowline::FlowRegistry;

pub mod contexts;

pub mod cart_pipeline;
pub mod checkout_pipeline;
pub mod order_status_pipeline;
pub mod password_change_pipeline;
pub mod signin_pipeline;
pub mod signup_pipeline;

/// Registers every flow. Called once when the application state is built.
pub fn register_all_pipelines(registry: &FlowRegistry<AppError>) {
  tracing::info!("Registering flows...");

  signup_pipeline::register_signup_pipeline(registry);
  signin_pipeline::register_signin_pipeline(registry);
  password_change_pipeline::register_password_change_pipeline(registry);
  cart_pipeline::register_add_to_cart_pipeline(registry);
  checkout_pipeline::register_checkout_pipeline(registry);
  order_status_pipeline::register_order_status_pipeline(registry);

  tracing::info!(count = registry.len(), "All application flows registered.");
}
