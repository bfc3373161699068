// duka-storefront/src/services/mpesa/mod.rs

//! M-Pesa push payments.
//!
//! A successful [`PaymentGateway::initiate_push`] only means the provider
//! accepted the prompt for delivery to the subscriber's phone. The outcome
//! arrives later on the webhook.

pub mod daraja;
pub mod error;
pub mod types;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

pub use daraja::DarajaClient;
pub use error::GatewayError;

/// Country-code-prefixed subscriber number, e.g. `254712345678`.
/// ASCII digits only; `\d` in `regex` also matches other Unicode digits.
static PHONE_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{12}$").unwrap());

pub fn is_valid_phone(phone: &str) -> bool {
  PHONE_PATTERN.is_match(phone)
}

#[derive(Debug, Clone)]
pub struct PushRequest {
  pub amount: Decimal,
  pub phone: String,
  pub order_reference: String,
  pub callback_url: String,
}

/// A request that passed [`PushRequest::validate`]; the amount is in whole units.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedPush {
  pub amount: i64,
  pub phone: String,
  pub order_reference: String,
  pub callback_url: String,
}

impl PushRequest {
  /// Input checks that run before any network activity.
  pub fn validate(&self) -> Result<ValidatedPush, GatewayError> {
    if self.amount <= Decimal::ZERO {
      return Err(GatewayError::Validation("Amount must be greater than zero".to_string()));
    }
    let phone = self.phone.trim();
    if !is_valid_phone(phone) {
      return Err(GatewayError::Validation(
        "Invalid phone number format. Use 254XXXXXXXXX".to_string(),
      ));
    }
    let order_reference = self.order_reference.trim();
    if order_reference.is_empty() {
      return Err(GatewayError::Validation("Missing orderId".to_string()));
    }
    let amount = self
      .amount
      .ceil()
      .to_i64()
      .ok_or_else(|| GatewayError::Validation("Amount is out of range".to_string()))?;
    Ok(ValidatedPush {
      amount,
      phone: phone.to_string(),
      order_reference: order_reference.to_string(),
      callback_url: self.callback_url.clone(),
    })
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PushAcceptance {
  pub provider_request_id: String,
  pub provider_checkout_id: String,
  pub response_code: String,
  pub response_message: String,
  pub customer_message: Option<String>,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
  async fn initiate_push(&self, request: PushRequest) -> Result<PushAcceptance, GatewayError>;
}
