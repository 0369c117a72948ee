// app/src/services/credentials.rs

//! Resolves the `Authorization` header into a [`Principal`].

use crate::errors::AppError;
use crate::models::{ApiKeyRole, Principal};
use crate::state::AppState;
use tracing::{debug, instrument, warn};

/// How much authentication a route demands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessLevel {
  Public,
  Optional,
  Customer,
  Admin,
}

impl AccessLevel {
  /// Public and optional routes fall back to an anonymous caller.
  pub fn allows_anonymous(self) -> bool {
    matches!(self, AccessLevel::Public | AccessLevel::Optional)
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
  Bearer(String),
  ApiKey(String),
}

fn unauthenticated(message: &str) -> AppError {
  AppError::Unauthenticated(message.to_string())
}

/// Splits `<scheme> <credential>`; the scheme is case-insensitive.
pub fn parse_authorization(header: &str) -> Result<Credential, AppError> {
  let (scheme, value) = header
    .trim()
    .split_once(char::is_whitespace)
    .ok_or_else(|| unauthenticated("Malformed Authorization header."))?;
  let value = value.trim();
  if value.is_empty() {
    return Err(unauthenticated("Malformed Authorization header."));
  }
  if scheme.eq_ignore_ascii_case("bearer") {
    Ok(Credential::Bearer(value.to_string()))
  } else if scheme.eq_ignore_ascii_case("api-key") {
    Ok(Credential::ApiKey(value.to_string()))
  } else {
    Err(unauthenticated("Unsupported authorization scheme."))
  }
}

/// Resolves a present credential. Never yields `Anonymous`.
pub async fn resolve_credential(state: &AppState, credential: &Credential) -> Result<Principal, AppError> {
  match credential {
    Credential::Bearer(token) => {
      let claims = state.tokens.verify(token)?;
      match state.store.get_customer(claims.customer_id).await? {
        Some(customer) => Ok(Principal::Customer { id: customer.id }),
        None => {
          warn!(customer_id = %claims.customer_id, "Token names a customer that no longer exists.");
          Err(unauthenticated("Invalid or expired token."))
        }
      }
    }
    Credential::ApiKey(key) => match state.api_keys.role_of(key) {
      Some(ApiKeyRole::Admin) => Ok(Principal::Admin),
      Some(role) => {
        warn!(role = ?role, "Non-admin API key presented.");
        Err(unauthenticated("API key does not grant access."))
      }
      None => Err(unauthenticated("Invalid API key.")),
    },
  }
}

/// Full credential check for a route at `level`.
///
/// A missing or failing credential degrades to `Anonymous` where the level
/// allows it and is `Unauthenticated` otherwise. On an admin route a valid
/// customer token is `Forbidden`. Database failures always propagate.
#[instrument(name = "credentials::resolve_principal", skip(state, header), fields(has_header = header.is_some()))]
pub async fn resolve_principal(state: &AppState, header: Option<&str>, level: AccessLevel) -> Result<Principal, AppError> {
  let Some(header) = header else {
    return if level.allows_anonymous() {
      Ok(Principal::Anonymous)
    } else {
      Err(unauthenticated("Authentication required."))
    };
  };

  let resolved = match parse_authorization(header) {
    Ok(credential) => resolve_credential(state, &credential).await,
    Err(e) => Err(e),
  };
  match resolved {
    Ok(principal) if level == AccessLevel::Admin && !principal.is_admin() => {
      warn!(principal = ?principal, "Non-admin principal on an admin route.");
      Err(AppError::Forbidden("Administrator access required.".to_string()))
    }
    Ok(principal) => {
      debug!(principal = ?principal, "Principal resolved.");
      Ok(principal)
    }
    Err(AppError::Unauthenticated(reason)) if level.allows_anonymous() => {
      debug!(reason = %reason, "Credential rejected, continuing anonymously.");
      Ok(Principal::Anonymous)
    }
    Err(e) => Err(e),
  }
}
