// app/src/web/extractors.rs

//! The authentication boundary: turns the `Authorization` header into a
//! [`Principal`] once per request.

use crate::errors::AppError;
use crate::models::Principal;
use crate::services::credentials::{resolve_principal, AccessLevel};
use crate::state::AppState;
use actix_web::dev::Payload;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{web, FromRequest, HttpRequest};
use futures_util::future::LocalBoxFuture;
use std::marker::PhantomData;

/// Route-level access policy, chosen by the extractor's type parameter.
pub trait AccessPolicy {
  const LEVEL: AccessLevel;
}

#[derive(Debug)]
pub struct OptionalAccess;
#[derive(Debug)]
pub struct CustomerAccess;
#[derive(Debug)]
pub struct AdminAccess;

impl AccessPolicy for OptionalAccess {
  const LEVEL: AccessLevel = AccessLevel::Optional;
}
impl AccessPolicy for CustomerAccess {
  const LEVEL: AccessLevel = AccessLevel::Customer;
}
impl AccessPolicy for AdminAccess {
  const LEVEL: AccessLevel = AccessLevel::Admin;
}

#[derive(Debug)]
pub struct Authenticated<P: AccessPolicy> {
  pub principal: Principal,
  _policy: PhantomData<P>,
}

pub type OptionalCaller = Authenticated<OptionalAccess>;
pub type CustomerCaller = Authenticated<CustomerAccess>;
pub type AdminCaller = Authenticated<AdminAccess>;

impl<P: AccessPolicy + 'static> FromRequest for Authenticated<P> {
  type Error = AppError;
  type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    let app_state = req.app_data::<web::Data<AppState>>().cloned();
    // A header that is not visible ASCII is treated as malformed, not as absent.
    let header = req
      .headers()
      .get(AUTHORIZATION)
      .map(|value| value.to_str().map(str::to_owned).unwrap_or_default());

    Box::pin(async move {
      let app_state =
        app_state.ok_or_else(|| AppError::Internal("Application state is not configured.".to_string()))?;
      let principal = resolve_principal(&app_state, header.as_deref(), P::LEVEL).await?;
      Ok(Authenticated {
        principal,
        _policy: PhantomData,
      })
    })
  }
}
