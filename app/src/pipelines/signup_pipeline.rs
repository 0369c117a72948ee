// app/src/pipelines/signup_pipeline.rs

use crate::errors::AppError;
use crate::models::customer::{is_valid_email, normalize_email};
use crate::models::NewCustomer;
use crate::pipelines::contexts::SignupCtxData;
use crate::services::auth_service::{self, MIN_PASSWORD_LEN};
use flowline::{Flow, FlowContext, FlowRegistry, StepControl};
use tracing::{event, info, warn, Level};

/// Registers the sign-up flow. A successful run leaves the new customer and
/// their first access token in the context.
pub fn register_signup_pipeline(registry: &FlowRegistry<AppError>) {
  let mut signup_p = Flow::<SignupCtxData, AppError>::new(
    "signup",
    &[
      ("validate_signup_input", false, None),
      ("hash_password", false, None),
      ("create_customer_record", false, None),
      ("issue_access_token", false, None),
    ],
  );

  signup_p.on_root("validate_signup_input", |ctx: FlowContext<SignupCtxData>| async move {
    let mut guard = ctx.write();
    guard.email = normalize_email(&guard.email);
    guard.first_name = guard.first_name.trim().to_string();
    guard.last_name = guard.last_name.trim().to_string();

    if !is_valid_email(&guard.email) {
      warn!(email = %guard.email, "Invalid email on sign-up.");
      return Err(AppError::InvalidRequest("A valid email is required.".to_string()));
    }
    if guard.first_name.is_empty() || guard.last_name.is_empty() {
      return Err(AppError::InvalidRequest("First and last name are required.".to_string()));
    }
    if guard.password.chars().count() < MIN_PASSWORD_LEN {
      return Err(AppError::InvalidRequest(format!(
        "Password must be at least {} characters long.",
        MIN_PASSWORD_LEN
      )));
    }
    event!(Level::DEBUG, email = %guard.email, "Sign-up input valid.");
    Ok(StepControl::Continue)
  });

  signup_p.on_root("hash_password", |ctx: FlowContext<SignupCtxData>| async move {
    let password = ctx.read().password.clone();
    let hash = auth_service::run_blocking(move || auth_service::hash_password(&password)).await?;
    ctx.write().password_hash = Some(hash);
    Ok::<_, AppError>(StepControl::Continue)
  });

  signup_p.on_root("create_customer_record", |ctx: FlowContext<SignupCtxData>| async move {
    let (new_customer, store) = {
      let guard = ctx.read();
      let password_hash = guard
        .password_hash
        .clone()
        .ok_or_else(|| AppError::Internal("Password hash missing when creating customer.".to_string()))?;
      (
        NewCustomer {
          first_name: guard.first_name.clone(),
          last_name: guard.last_name.clone(),
          email: guard.email.clone(),
          password_hash,
          address: guard.address.clone(),
        },
        guard.app_state.store.clone(),
      )
    };

    let customer = store.insert_customer(new_customer).await?;
    info!(customer_id = %customer.id, "Customer account created.");
    ctx.write().customer = Some(customer);
    Ok::<_, AppError>(StepControl::Continue)
  });

  signup_p.on_root("issue_access_token", |ctx: FlowContext<SignupCtxData>| async move {
    let (customer, tokens) = {
      let guard = ctx.read();
      (guard.customer.clone(), guard.app_state.tokens.clone())
    };
    let customer = customer.ok_or_else(|| AppError::Internal("Customer missing when issuing token.".to_string()))?;
    let token = tokens.issue(customer.id, &customer.email)?;
    ctx.write().token = Some(token);
    Ok::<_, AppError>(StepControl::Continue)
  });

  registry.register(signup_p);
  tracing::info!("Sign-up flow registered.");
}
