// app/src/models/api_key.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiKeyRole {
  Admin,
  Customer,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiKey {
  pub key: String,
  pub role: ApiKeyRole,
  pub created_at: DateTime<Utc>,
}
