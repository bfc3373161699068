// duka-storefront/src/services/mpesa/error.rs

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
  #[error("{0}")]
  Validation(String),

  #[error("Payment gateway not configured: {0}")]
  CredentialsMissing(String),

  #[error("Failed to authenticate with M-Pesa: {0}")]
  Authentication(String),

  #[error("STK push rejected ({code}): {message}")]
  Rejected { code: String, message: String },

  #[error("Network error talking to M-Pesa: {0}")]
  Network(String),
}

impl From<reqwest::Error> for GatewayError {
  fn from(err: reqwest::Error) -> Self {
    GatewayError::Network(err.to_string())
  }
}
