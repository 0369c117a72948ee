// app/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::env;
use std::fmt;

const MIN_JWT_SECRET_LEN: usize = 16;
/// One year.
pub const MAX_TOKEN_TTL_HOURS: i64 = 8760;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
  Text,
  Json,
}

#[derive(Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  /// `None` selects the in-memory store.
  pub database_url: Option<String>,
  pub jwt_secret: String,
  pub token_ttl_hours: i64,
  pub admin_api_keys: Vec<String>,
  pub seed_db: bool,
  pub log_format: LogFormat,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok();
    Self::from_lookup(|name| env::var(name).ok())
  }

  /// Builds the configuration from an arbitrary variable source.
  pub fn from_lookup<F>(lookup: F) -> Result<Self>
  where
    F: Fn(&str) -> Option<String>,
  {
    let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    let server_host = get("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
    let server_port = get("SERVER_PORT")
      .unwrap_or_else(|| "8080".to_string())
      .parse::<u16>()
      .map_err(|e| AppError::Config(format!("Invalid SERVER_PORT: {}", e)))?;
    let database_url = get("DATABASE_URL");

    let jwt_secret = get("JWT_SECRET")
      .ok_or_else(|| AppError::Config("Missing environment variable 'JWT_SECRET'".to_string()))?;
    if jwt_secret.len() < MIN_JWT_SECRET_LEN {
      return Err(AppError::Config(format!(
        "JWT_SECRET must be at least {} bytes",
        MIN_JWT_SECRET_LEN
      )));
    }

    let token_ttl_hours = get("TOKEN_TTL_HOURS")
      .unwrap_or_else(|| "24".to_string())
      .parse::<i64>()
      .map_err(|e| AppError::Config(format!("Invalid TOKEN_TTL_HOURS: {}", e)))?;
    if !(1..=MAX_TOKEN_TTL_HOURS).contains(&token_ttl_hours) {
      return Err(AppError::Config(format!(
        "TOKEN_TTL_HOURS must be between 1 and {}",
        MAX_TOKEN_TTL_HOURS
      )));
    }

    let admin_api_keys = get("ADMIN_API_KEYS")
      .map(|raw| {
        raw
          .split(',')
          .map(str::trim)
          .filter(|k| !k.is_empty())
          .map(String::from)
          .collect()
      })
      .unwrap_or_default();

    let seed_db = get("SEED_DB")
      .unwrap_or_else(|| "false".to_string())
      .parse::<bool>()
      .map_err(|e| AppError::Config(format!("Invalid SEED_DB value: {}", e)))?;

    let log_format = match get("LOG_FORMAT").as_deref() {
      None | Some("text") => LogFormat::Text,
      Some("json") => LogFormat::Json,
      Some(other) => return Err(AppError::Config(format!("Invalid LOG_FORMAT: {}", other))),
    };

    Ok(Self {
      server_host,
      server_port,
      database_url,
      jwt_secret,
      token_ttl_hours,
      admin_api_keys,
      seed_db,
      log_format,
    })
  }

  pub fn bind_address(&self) -> String {
    format!("{}:{}", self.server_host, self.server_port)
  }
}

impl fmt::Debug for AppConfig {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("AppConfig")
      .field("server_host", &self.server_host)
      .field("server_port", &self.server_port)
      .field("database_url", &self.database_url.as_ref().map(|_| "[REDACTED]"))
      .field("jwt_secret", &"[REDACTED]")
      .field("token_ttl_hours", &self.token_ttl_hours)
      .field("admin_api_keys", &self.admin_api_keys.len())
      .field("seed_db", &self.seed_db)
      .field("log_format", &self.log_format)
      .finish()
  }
}
