// app/src/services/api_keys.rs

//! In-process registry of API keys. Admin keys are seeded from configuration;
//! more can be issued at runtime.

use crate::models::{ApiKey, ApiKeyRole};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use parking_lot::RwLock;
use rand_core::{OsRng, RngCore};
use std::collections::HashMap;
use tracing::info;

const KEY_BYTES: usize = 32;

#[derive(Debug, Default)]
pub struct ApiKeyRegistry {
  keys: RwLock<HashMap<String, ApiKey>>,
}

impl ApiKeyRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_admin_keys<I, S>(keys: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    let registry = Self::new();
    for key in keys {
      registry.insert(key.into(), ApiKeyRole::Admin);
    }
    registry
  }

  pub fn insert(&self, key: String, role: ApiKeyRole) -> ApiKey {
    let api_key = ApiKey {
      key: key.clone(),
      role,
      created_at: Utc::now(),
    };
    self.keys.write().insert(key, api_key.clone());
    api_key
  }

  /// Issues a fresh random key for `role`.
  pub fn generate(&self, role: ApiKeyRole) -> ApiKey {
    let mut bytes = [0u8; KEY_BYTES];
    OsRng.fill_bytes(&mut bytes);
    let api_key = self.insert(URL_SAFE_NO_PAD.encode(bytes), role);
    info!(role = ?role, "API key generated.");
    api_key
  }

  pub fn role_of(&self, key: &str) -> Option<ApiKeyRole> {
    self.keys.read().get(key).map(|k| k.role)
  }

  pub fn len(&self) -> usize {
    self.keys.read().len()
  }

  pub fn is_empty(&self) -> bool {
    self.keys.read().is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn seeded_keys_are_admin() {
    let registry = ApiKeyRegistry::with_admin_keys(["k1", "k2"]);
    assert_eq!(registry.len(), 2);
    assert_eq!(registry.role_of("k1"), Some(ApiKeyRole::Admin));
    assert_eq!(registry.role_of("nope"), None);
  }

  #[test]
  fn generated_keys_are_unique_and_registered() {
    let registry = ApiKeyRegistry::new();
    let a = registry.generate(ApiKeyRole::Customer);
    let b = registry.generate(ApiKeyRole::Admin);
    assert_ne!(a.key, b.key);
    assert_eq!(a.key.len(), 43);
    assert_eq!(registry.role_of(&a.key), Some(ApiKeyRole::Customer));
    assert_eq!(registry.role_of(&b.key), Some(ApiKeyRole::Admin));
  }
}
