// app/src/web/handlers/auth_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{ApiKeyRole, CustomerUpdate, Principal};
use crate::pipelines::contexts::{PasswordChangeCtxData, SigninCtxData, SignupCtxData};
use crate::services::ownership::{self, Action};
use crate::state::AppState;
use crate::web::extractors::{AdminCaller, CustomerCaller};
use crate::web::handlers::customer_handlers::check_customer_update;
use crate::web::response;
use flowline::{FlowContext, FlowOutcome};

#[derive(Deserialize, Debug)]
pub struct RegisterPayload {
  pub email: String,
  pub password: String,
  pub first_name: String,
  pub last_name: String,
  #[serde(default)]
  pub address: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct LoginPayload {
  pub email: String,
  pub password: String,
}

#[derive(Deserialize, Debug)]
pub struct ApiKeyPayload {
  pub role: ApiKeyRole,
}

#[derive(Deserialize, Debug)]
pub struct ChangePasswordPayload {
  pub current_password: String,
  pub new_password: String,
}

/// Profile endpoints act on the signed-in customer; API keys have no profile.
fn signed_in_customer(principal: &Principal) -> Result<Uuid, AppError> {
  principal
    .customer_id()
    .ok_or_else(|| AppError::Unauthenticated("Customer authentication required.".to_string()))
}

#[instrument(name = "handler::register", skip(app_state, payload), fields(req_email = %payload.email))]
pub async fn register_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<RegisterPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = payload.into_inner();
  let ctx = FlowContext::new(SignupCtxData {
    app_state: app_state.get_ref().clone(),
    email: payload.email,
    password: payload.password,
    first_name: payload.first_name,
    last_name: payload.last_name,
    address: payload.address,
    password_hash: None,
    customer: None,
    token: None,
  });

  match app_state.flows.run(ctx.clone()).await {
    Ok(FlowOutcome::Completed) => {
      let (customer, token) = {
        let guard = ctx.read();
        (guard.customer.clone(), guard.token.clone())
      };
      let (customer, token) = customer.zip(token).ok_or_else(|| {
        warn!("Sign-up completed without a customer or token in context.");
        AppError::Internal("Sign-up completed without creating a customer.".to_string())
      })?;
      info!(customer_id = %customer.id, "Sign-up successful.");
      Ok(response::created(
        json!({
          "access_token": token.access_token,
          "token_type": token.token_type,
          "expires_in": token.expires_in,
          "customer": customer,
        }),
        "Account created.",
      ))
    }
    Ok(FlowOutcome::Stopped) => Err(AppError::PipelineHaltedByHandler),
    Err(app_err) => {
      warn!(error = %app_err, "Sign-up flow failed.");
      Err(app_err)
    }
  }
}

#[instrument(name = "handler::login", skip(app_state, payload), fields(req_email = %payload.email))]
pub async fn login_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<LoginPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = payload.into_inner();
  let ctx = FlowContext::new(SigninCtxData {
    app_state: app_state.get_ref().clone(),
    email: payload.email,
    password: payload.password,
    temp_password_hash: None,
    customer: None,
    token: None,
  });

  match app_state.flows.run(ctx.clone()).await {
    Ok(FlowOutcome::Completed) => {
      let (customer, token) = {
        let guard = ctx.read();
        (guard.customer.clone(), guard.token.clone())
      };
      let (customer, token) = customer.zip(token).ok_or_else(|| {
        warn!("Sign-in completed without a customer or token in context.");
        AppError::Internal("Sign-in completed without issuing a token.".to_string())
      })?;
      info!(customer_id = %customer.id, "Sign-in successful.");
      Ok(response::ok(
        json!({
          "access_token": token.access_token,
          "token_type": token.token_type,
          "expires_in": token.expires_in,
          "customer": customer,
        }),
        "Login successful.",
      ))
    }
    Ok(FlowOutcome::Stopped) => Err(AppError::PipelineHaltedByHandler),
    Err(app_err) => {
      warn!(error = %app_err, "Sign-in flow failed.");
      Err(app_err)
    }
  }
}

#[instrument(name = "handler::me", skip(caller))]
pub async fn me_handler(caller: CustomerCaller) -> Result<HttpResponse, AppError> {
  Ok(response::ok(caller.principal, "Authenticated."))
}

#[instrument(name = "handler::issue_api_key", skip(app_state, caller, payload))]
pub async fn issue_api_key_handler(
  app_state: web::Data<AppState>,
  caller: AdminCaller,
  payload: web::Json<ApiKeyPayload>,
) -> Result<HttpResponse, AppError> {
  ownership::require(&caller.principal, Action::ApiKeyIssue, None)?;
  let api_key = app_state.api_keys.generate(payload.role);
  Ok(response::created(api_key, "API key created."))
}

#[instrument(name = "handler::profile", skip(app_state, caller))]
pub async fn profile_handler(
  app_state: web::Data<AppState>,
  caller: CustomerCaller,
) -> Result<HttpResponse, AppError> {
  let customer_id = signed_in_customer(&caller.principal)?;
  ownership::require(&caller.principal, Action::ProfileRead, Some(customer_id))?;
  let customer = app_state
    .store
    .get_customer(customer_id)
    .await?
    .ok_or_else(|| AppError::NotFound("Customer not found.".to_string()))?;
  Ok(response::ok(customer, "Profile retrieved."))
}

#[instrument(name = "handler::update_profile", skip(app_state, caller, payload))]
pub async fn update_profile_handler(
  app_state: web::Data<AppState>,
  caller: CustomerCaller,
  payload: web::Json<CustomerUpdate>,
) -> Result<HttpResponse, AppError> {
  let customer_id = signed_in_customer(&caller.principal)?;
  ownership::require(&caller.principal, Action::ProfileUpdate, Some(customer_id))?;
  let update = payload.into_inner();
  check_customer_update(&update)?;
  let customer = app_state
    .store
    .update_customer(customer_id, update)
    .await?
    .ok_or_else(|| AppError::NotFound("Customer not found.".to_string()))?;
  info!(customer_id = %customer.id, "Profile updated.");
  Ok(response::ok(customer, "Profile updated."))
}

#[instrument(name = "handler::change_password", skip(app_state, caller, payload))]
pub async fn change_password_handler(
  app_state: web::Data<AppState>,
  caller: CustomerCaller,
  payload: web::Json<ChangePasswordPayload>,
) -> Result<HttpResponse, AppError> {
  let customer_id = signed_in_customer(&caller.principal)?;
  ownership::require(&caller.principal, Action::ProfileUpdate, Some(customer_id))?;
  let payload = payload.into_inner();
  let ctx = FlowContext::new(PasswordChangeCtxData {
    app_state: app_state.get_ref().clone(),
    customer_id,
    current_password: payload.current_password,
    new_password: payload.new_password,
    stored_hash: None,
    new_password_hash: None,
  });

  match app_state.flows.run(ctx).await {
    Ok(FlowOutcome::Completed) => Ok(response::ok(json!({}), "Password changed.")),
    Ok(FlowOutcome::Stopped) => Err(AppError::PipelineHaltedByHandler),
    Err(app_err) => {
      warn!(error = %app_err, "Password change flow failed.");
      Err(app_err)
    }
  }
}
