// app/src/models/customer.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Customer {
  pub id: Uuid,
  pub first_name: String,
  pub last_name: String,
  pub email: String,
  #[serde(skip_serializing)]
  pub password_hash: String,
  pub address: Option<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// A validated registration with the password already hashed.
#[derive(Debug, Clone)]
pub struct NewCustomer {
  pub first_name: String,
  pub last_name: String,
  pub email: String,
  pub password_hash: String,
  pub address: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomerUpdate {
  pub first_name: Option<String>,
  pub last_name: Option<String>,
  pub address: Option<String>,
}

impl CustomerUpdate {
  pub fn is_empty(&self) -> bool {
    self.first_name.is_none() && self.last_name.is_none() && self.address.is_none()
  }
}

/// Lower-cases and trims an email so lookups and the uniqueness check agree.
pub fn normalize_email(raw: &str) -> String {
  raw.trim().to_lowercase()
}

/// Deliberately loose: one `@` with a non-empty local part and a dotted domain.
pub fn is_valid_email(email: &str) -> bool {
  match email.split_once('@') {
    Some((local, domain)) => {
      !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
    }
    None => false,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn email_checks() {
    assert!(is_valid_email("ada@example.com"));
    assert!(!is_valid_email("ada.example.com"));
    assert!(!is_valid_email("@example.com"));
    assert!(!is_valid_email("ada@example"));
    assert!(!is_valid_email("ada@@example.com"));
    assert!(!is_valid_email("a da@example.com"));
    assert_eq!(normalize_email("  Ada@Example.COM "), "ada@example.com");
  }
}
