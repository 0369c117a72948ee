// app/src/errors.rs

use crate::models::OrderStatus;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use flowline::FlowError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Authentication required: {0}")]
  Unauthenticated(String),

  #[error("Forbidden: {0}")]
  Forbidden(String),

  #[error("Invalid request: {0}")]
  InvalidRequest(String),

  #[error("Resource not found: {0}")]
  NotFound(String),

  #[error("Conflict: {0}")]
  Conflict(String),

  #[error("Invalid status transition from '{from}' to '{to}'")]
  InvalidTransition { from: OrderStatus, to: OrderStatus },

  #[error("Configuration error: {0}")]
  Config(String),

  #[error("Database error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("Workflow error: {source}")]
  Workflow {
    #[from]
    source: FlowError,
  },

  #[error("Internal server error: {0}")]
  Internal(String),

  /// A flow stopped cleanly where the handler expected it to complete.
  #[error("Pipeline execution was halted by a handler.")]
  PipelineHaltedByHandler,
}

impl AppError {
  /// Machine-readable kind carried in the error envelope.
  pub fn kind(&self) -> &'static str {
    match self {
      AppError::Unauthenticated(_) => "unauthenticated",
      AppError::Forbidden(_) => "forbidden",
      AppError::InvalidRequest(_) => "invalid_request",
      AppError::NotFound(_) => "not_found",
      AppError::Conflict(_) => "conflict",
      AppError::InvalidTransition { .. } => "invalid_transition",
      AppError::Config(_)
      | AppError::Sqlx(_)
      | AppError::Workflow { .. }
      | AppError::Internal(_)
      | AppError::PipelineHaltedByHandler => "internal",
    }
  }

  fn public_message(&self) -> String {
    match self {
      AppError::Unauthenticated(m)
      | AppError::Forbidden(m)
      | AppError::InvalidRequest(m)
      | AppError::NotFound(m)
      | AppError::Conflict(m) => m.clone(),
      AppError::InvalidTransition { from, to } => {
        format!("Cannot change order status from '{}' to '{}'.", from, to)
      }
      _ => "An internal error occurred.".to_string(),
    }
  }
}

impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    match err.downcast::<AppError>() {
      Ok(app_err) => app_err,
      Err(err) => match err.downcast::<sqlx::Error>() {
        Ok(sqlx_err) => AppError::Sqlx(sqlx_err),
        Err(err) => AppError::Internal(err.to_string()),
      },
    }
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
      AppError::Forbidden(_) => StatusCode::FORBIDDEN,
      AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::Conflict(_) | AppError::InvalidTransition { .. } => StatusCode::CONFLICT,
      _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    if status.is_server_error() {
      match self {
        AppError::Workflow { source } => {
          tracing::error!(flow_error_source = ?source, "Responding with workflow error");
        }
        _ => tracing::error!(application_error = %self, "Responding with error"),
      }
    } else {
      tracing::warn!(application_error = %self, status = status.as_u16(), "Request rejected");
    }
    HttpResponse::build(status).json(json!({
      "data": {},
      "message": self.public_message(),
      "error": self.kind(),
    }))
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
