// app/src/pipelines/signin_pipeline.rs

use crate::errors::AppError;
use crate::models::customer::normalize_email;
use crate::pipelines::contexts::SigninCtxData;
use crate::services::auth_service;
use flowline::{Flow, FlowContext, FlowRegistry, StepControl};
use tracing::{event, warn, Level};

fn invalid_credentials() -> AppError {
  AppError::Unauthenticated("Invalid email or password.".to_string())
}

/// Registers the sign-in flow: credentials in, access token out.
pub fn register_signin_pipeline(registry: &FlowRegistry<AppError>) {
  let mut signin_p = Flow::<SigninCtxData, AppError>::new(
    "signin",
    &[
      ("validate_signin_input", false, None),
      ("fetch_customer_by_email", false, None),
      ("verify_customer_password", false, None),
      ("issue_access_token", false, None),
    ],
  );

  signin_p.on_root("validate_signin_input", |ctx: FlowContext<SigninCtxData>| async move {
    let (email, password_is_empty) = {
      let guard = ctx.read();
      (normalize_email(&guard.email), guard.password.is_empty())
    };

    event!(Level::DEBUG, email = %email, "Validating sign-in input.");
    if email.is_empty() || password_is_empty {
      warn!("Sign-in attempted without email or password.");
      return Err(AppError::InvalidRequest("Email and password are required.".to_string()));
    }
    ctx.write().email = email;
    Ok(StepControl::Continue)
  });

  signin_p.on_root("fetch_customer_by_email", |ctx: FlowContext<SigninCtxData>| async move {
    let (email, store) = {
      let guard = ctx.read();
      (guard.email.clone(), guard.app_state.store.clone())
    };

    match store.find_customer_by_email(&email).await? {
      Some(customer) => {
        event!(Level::INFO, customer_id = %customer.id, "Customer found for sign-in.");
        let mut guard = ctx.write();
        guard.temp_password_hash = Some(customer.password_hash.clone());
        guard.customer = Some(customer);
        Ok(StepControl::Continue)
      }
      None => {
        warn!(email = %email, "No customer for sign-in email.");
        Err(invalid_credentials())
      }
    }
  });

  signin_p.on_root("verify_customer_password", |ctx: FlowContext<SigninCtxData>| async move {
    let (stored_hash, password) = {
      let mut guard = ctx.write();
      (guard.temp_password_hash.take(), guard.password.clone())
    };
    let stored_hash = stored_hash.ok_or_else(|| {
      event!(Level::ERROR, "Password hash missing from sign-in context.");
      AppError::Internal("Password hash unexpectedly missing for verification.".to_string())
    })?;

    let verified = auth_service::run_blocking(move || auth_service::verify_password(&stored_hash, &password)).await?;
    if verified {
      event!(Level::DEBUG, "Password verified for sign-in.");
      Ok(StepControl::Continue)
    } else {
      warn!("Password mismatch on sign-in.");
      Err(invalid_credentials())
    }
  });

  signin_p.on_root("issue_access_token", |ctx: FlowContext<SigninCtxData>| async move {
    let (customer, tokens) = {
      let guard = ctx.read();
      (guard.customer.clone(), guard.app_state.tokens.clone())
    };
    let customer = customer.ok_or_else(|| AppError::Internal("Customer missing when issuing token.".to_string()))?;

    let token = tokens.issue(customer.id, &customer.email)?;
    event!(Level::INFO, customer_id = %customer.id, "Access token issued.");
    ctx.write().token = Some(token);
    Ok::<_, AppError>(StepControl::Continue)
  });

  registry.register(signin_p);
  tracing::info!("Sign-in flow registered.");
}
