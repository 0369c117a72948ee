// app/src/services/token_service.rs

//! HS256 access tokens: `base64url(header).base64url(claims).base64url(hmac)`.

use crate::errors::AppError;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

pub const ACCESS_TOKEN_TYPE: &str = "access_token";
const ALGORITHM: &str = "HS256";

#[derive(Debug, Serialize, Deserialize)]
struct Header {
  alg: String,
  typ: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
  pub customer_id: Uuid,
  pub email: String,
  pub iat: i64,
  pub exp: i64,
  #[serde(rename = "type")]
  pub token_type: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
  pub access_token: String,
  pub token_type: &'static str,
  /// Seconds until expiry.
  pub expires_in: i64,
}

/// Signs and verifies access tokens with a shared secret.
#[derive(Clone)]
pub struct TokenSigner {
  secret: Arc<[u8]>,
  ttl: Duration,
}

impl TokenSigner {
  pub fn new(secret: &[u8], ttl_hours: i64) -> Self {
    Self {
      secret: Arc::from(secret),
      ttl: Duration::hours(ttl_hours),
    }
  }

  fn mac(&self) -> Result<HmacSha256, AppError> {
    HmacSha256::new_from_slice(&self.secret).map_err(|e| AppError::Internal(format!("Invalid signing key: {}", e)))
  }

  pub fn issue(&self, customer_id: Uuid, email: &str) -> Result<IssuedToken, AppError> {
    self.issue_at(customer_id, email, Utc::now())
  }

  #[instrument(name = "token_service::issue", skip(self, email, now))]
  pub fn issue_at(&self, customer_id: Uuid, email: &str, now: DateTime<Utc>) -> Result<IssuedToken, AppError> {
    let claims = Claims {
      customer_id,
      email: email.to_string(),
      iat: now.timestamp(),
      exp: (now + self.ttl).timestamp(),
      token_type: ACCESS_TOKEN_TYPE.to_string(),
    };
    let header = Header {
      alg: ALGORITHM.to_string(),
      typ: "JWT".to_string(),
    };
    let signing_input = format!("{}.{}", encode_part(&header)?, encode_part(&claims)?);

    let mut mac = self.mac()?;
    mac.update(signing_input.as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    debug!("Access token issued.");
    Ok(IssuedToken {
      access_token: format!("{}.{}", signing_input, signature),
      token_type: "Bearer",
      expires_in: self.ttl.num_seconds(),
    })
  }

  pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
    self.verify_at(token, Utc::now())
  }

  /// Checks structure, algorithm, signature, token type and expiry, in that order.
  #[instrument(name = "token_service::verify", skip_all)]
  pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AppError> {
    let rejected = |reason: &str| {
      warn!(reason = reason, "Access token rejected.");
      AppError::Unauthenticated("Invalid or expired token.".to_string())
    };

    let mut parts = token.split('.');
    let (header_b64, claims_b64, signature_b64) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
      (Some(h), Some(c), Some(s), None) => (h, c, s),
      _ => return Err(rejected("malformed")),
    };

    let header: Header = decode_part(header_b64).ok_or_else(|| rejected("bad header"))?;
    if header.alg != ALGORITHM {
      return Err(rejected("unsupported algorithm"));
    }

    let signature = URL_SAFE_NO_PAD
      .decode(signature_b64)
      .map_err(|_| rejected("bad signature encoding"))?;
    let mut mac = self.mac()?;
    mac.update(header_b64.as_bytes());
    mac.update(b".");
    mac.update(claims_b64.as_bytes());
    mac.verify_slice(&signature).map_err(|_| rejected("signature mismatch"))?;

    let claims: Claims = decode_part(claims_b64).ok_or_else(|| rejected("bad claims"))?;
    if claims.token_type != ACCESS_TOKEN_TYPE {
      return Err(rejected("wrong token type"));
    }
    if now.timestamp() >= claims.exp {
      return Err(rejected("expired"));
    }
    Ok(claims)
  }
}

fn encode_part<T: Serialize>(value: &T) -> Result<String, AppError> {
  let bytes = serde_json::to_vec(value).map_err(|e| AppError::Internal(format!("Token encoding failed: {}", e)))?;
  Ok(URL_SAFE_NO_PAD.encode(bytes))
}

fn decode_part<T: for<'de> Deserialize<'de>>(part: &str) -> Option<T> {
  let bytes = URL_SAFE_NO_PAD.decode(part).ok()?;
  serde_json::from_slice(&bytes).ok()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn signer() -> TokenSigner {
    TokenSigner::new(b"test-secret-0123456789", 24)
  }

  #[test]
  fn issued_token_verifies_and_carries_claims() {
    let s = signer();
    let id = Uuid::new_v4();
    let issued = s.issue(id, "ada@example.com").unwrap();
    assert_eq!(issued.token_type, "Bearer");
    assert_eq!(issued.expires_in, 24 * 3600);

    let claims = s.verify(&issued.access_token).unwrap();
    assert_eq!(claims.customer_id, id);
    assert_eq!(claims.email, "ada@example.com");
    assert_eq!(claims.exp - claims.iat, 24 * 3600);
    assert_eq!(claims.token_type, ACCESS_TOKEN_TYPE);
  }

  #[test]
  fn token_older_than_ttl_is_rejected() {
    let s = signer();
    let issued_at = Utc::now() - Duration::hours(25);
    let token = s.issue_at(Uuid::new_v4(), "old@example.com", issued_at).unwrap();
    assert!(matches!(s.verify(&token.access_token), Err(AppError::Unauthenticated(_))));
    assert!(s.verify_at(&token.access_token, issued_at + Duration::hours(23)).is_ok());
  }

  #[test]
  fn tampered_claims_are_rejected() {
    let s = signer();
    let token = s.issue(Uuid::new_v4(), "ada@example.com").unwrap().access_token;
    let parts: Vec<&str> = token.split('.').collect();
    let forged_claims = Claims {
      customer_id: Uuid::new_v4(),
      email: "mallory@example.com".to_string(),
      iat: 0,
      exp: i64::MAX,
      token_type: ACCESS_TOKEN_TYPE.to_string(),
    };
    let forged = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged_claims).unwrap());
    let tampered = format!("{}.{}.{}", parts[0], forged, parts[2]);
    assert!(matches!(s.verify(&tampered), Err(AppError::Unauthenticated(_))));
  }

  #[test]
  fn other_secret_or_garbage_is_rejected() {
    let token = signer().issue(Uuid::new_v4(), "ada@example.com").unwrap().access_token;
    let other = TokenSigner::new(b"another-secret-9876543210", 24);
    assert!(other.verify(&token).is_err());
    assert!(signer().verify("not-a-token").is_err());
    assert!(signer().verify("a.b.c.d").is_err());
    assert!(signer().verify("").is_err());
  }
}
