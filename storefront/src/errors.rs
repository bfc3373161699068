// duka-storefront/src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use duka_flow::FlowError;
use serde_json::json;
use thiserror::Error;

use crate::db::StoreError;
use crate::services::mpesa::GatewayError;

const GATEWAY_NOT_CONFIGURED_HINT: &str =
  "Set MPESA_CONSUMER_KEY, MPESA_CONSUMER_SECRET, MPESA_SHORTCODE, MPESA_PASSKEY and CALLBACK_BASE_URL.";
const GATEWAY_FAILURE_HINT: &str = "Check the M-Pesa credentials and that the phone number is registered for M-Pesa.";

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  #[error("Payment gateway not configured: {0}")]
  CredentialsMissing(String),

  #[error("Payment gateway authentication failed: {0}")]
  Authentication(String),

  #[error("Payment gateway rejected the request: {0}")]
  GatewayRejected(String),

  #[error("Payment gateway unreachable: {0}")]
  Network(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("Flow Error: {source}")]
  Workflow {
    #[from]
    source: FlowError,
  },

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl AppError {
  pub fn is_gateway_error(&self) -> bool {
    matches!(
      self,
      AppError::CredentialsMissing(_) | AppError::Authentication(_) | AppError::GatewayRejected(_) | AppError::Network(_)
    )
  }
}

impl From<GatewayError> for AppError {
  fn from(err: GatewayError) -> Self {
    match err {
      GatewayError::Validation(m) => AppError::Validation(m),
      GatewayError::CredentialsMissing(m) => AppError::CredentialsMissing(m),
      GatewayError::Authentication(m) => AppError::Authentication(m),
      rejected @ GatewayError::Rejected { .. } => AppError::GatewayRejected(rejected.to_string()),
      GatewayError::Network(m) => AppError::Network(m),
    }
  }
}

impl From<StoreError> for AppError {
  fn from(err: StoreError) -> Self {
    match err {
      StoreError::NotFound(order_id) => AppError::NotFound(format!("Order {} not found", order_id)),
      StoreError::Database(e) => AppError::Sqlx(e),
    }
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation(_) => StatusCode::BAD_REQUEST,
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    tracing::error!(application_error = %self, "Responding with error");
    let mut builder = HttpResponse::build(self.status_code());
    match self {
      AppError::Validation(m) | AppError::NotFound(m) => builder.json(json!({ "error": m })),
      AppError::CredentialsMissing(m) => builder.json(json!({
        "error": "Payment gateway not configured",
        "details": m,
        "hint": GATEWAY_NOT_CONFIGURED_HINT,
      })),
      AppError::Authentication(m) | AppError::GatewayRejected(m) | AppError::Network(m) => builder.json(json!({
        "error": "Payment initiation failed",
        "details": m,
        "hint": GATEWAY_FAILURE_HINT,
      })),
      AppError::Config(m) => builder.json(json!({ "error": "Configuration issue", "details": m })),
      AppError::Sqlx(_) => builder.json(json!({ "error": "Database operation failed" })),
      AppError::Workflow { source } => {
        tracing::error!(flow_error_source = ?source, "Workflow error details");
        builder.json(json!({ "error": "Workflow processing error", "details": source.to_string() }))
      }
      AppError::Internal(m) => builder.json(json!({ "error": "An internal error occurred", "details": m })),
    }
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
