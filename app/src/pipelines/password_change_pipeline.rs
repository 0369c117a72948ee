// app/src/pipelines/password_change_pipeline.rs

use crate::errors::AppError;
use crate::pipelines::contexts::PasswordChangeCtxData;
use crate::services::auth_service::{self, MIN_PASSWORD_LEN};
use flowline::{Flow, FlowContext, FlowRegistry, StepControl};
use tracing::{event, info, warn, Level};

/// Registers the password change flow. Tokens issued before the change stay
/// valid until they expire.
pub fn register_password_change_pipeline(registry: &FlowRegistry<AppError>) {
  let mut change_p = Flow::<PasswordChangeCtxData, AppError>::new(
    "password_change",
    &[
      ("validate_new_password", false, None),
      ("fetch_customer", false, None),
      ("verify_current_password", false, None),
      ("hash_new_password", false, None),
      ("store_password_hash", false, None),
    ],
  );

  change_p.on_root("validate_new_password", |ctx: FlowContext<PasswordChangeCtxData>| async move {
    let guard = ctx.read();
    if guard.current_password.is_empty() {
      return Err(AppError::InvalidRequest("current_password is required.".to_string()));
    }
    if guard.new_password.chars().count() < MIN_PASSWORD_LEN {
      return Err(AppError::InvalidRequest(format!(
        "Password must be at least {} characters long.",
        MIN_PASSWORD_LEN
      )));
    }
    if guard.new_password == guard.current_password {
      return Err(AppError::InvalidRequest(
        "New password must differ from the current one.".to_string(),
      ));
    }
    Ok(StepControl::Continue)
  });

  change_p.on_root("fetch_customer", |ctx: FlowContext<PasswordChangeCtxData>| async move {
    let (customer_id, store) = {
      let guard = ctx.read();
      (guard.customer_id, guard.app_state.store.clone())
    };
    let customer = store
      .get_customer(customer_id)
      .await?
      .ok_or_else(|| AppError::NotFound("Customer not found.".to_string()))?;
    ctx.write().stored_hash = Some(customer.password_hash);
    Ok::<_, AppError>(StepControl::Continue)
  });

  change_p.on_root("verify_current_password", |ctx: FlowContext<PasswordChangeCtxData>| async move {
    let (customer_id, stored_hash, current) = {
      let mut guard = ctx.write();
      (guard.customer_id, guard.stored_hash.take(), guard.current_password.clone())
    };
    let stored_hash =
      stored_hash.ok_or_else(|| AppError::Internal("Password hash missing from context.".to_string()))?;

    let verified = auth_service::run_blocking(move || auth_service::verify_password(&stored_hash, &current)).await?;
    if !verified {
      warn!(customer_id = %customer_id, "Wrong current password on password change.");
      return Err(AppError::Unauthenticated("Current password is incorrect.".to_string()));
    }
    event!(Level::DEBUG, "Current password verified.");
    Ok::<_, AppError>(StepControl::Continue)
  });

  change_p.on_root("hash_new_password", |ctx: FlowContext<PasswordChangeCtxData>| async move {
    let password = ctx.read().new_password.clone();
    let hash = auth_service::run_blocking(move || auth_service::hash_password(&password)).await?;
    ctx.write().new_password_hash = Some(hash);
    Ok::<_, AppError>(StepControl::Continue)
  });

  change_p.on_root("store_password_hash", |ctx: FlowContext<PasswordChangeCtxData>| async move {
    let (customer_id, hash, store) = {
      let guard = ctx.read();
      (guard.customer_id, guard.new_password_hash.clone(), guard.app_state.store.clone())
    };
    let hash = hash.ok_or_else(|| AppError::Internal("New password hash missing from context.".to_string()))?;
    if !store.update_password_hash(customer_id, &hash).await? {
      return Err(AppError::NotFound("Customer not found.".to_string()));
    }
    info!(customer_id = %customer_id, "Password changed.");
    Ok::<_, AppError>(StepControl::Continue)
  });

  registry.register(change_p);
  tracing::info!("Password change flow registered.");
}
