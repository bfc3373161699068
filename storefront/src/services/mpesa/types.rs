// duka-storefront/src/services/mpesa/types.rs

//! Daraja wire types.

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
  pub access_token: Option<String>,
  pub expires_in: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct StkPushRequest {
  pub business_short_code: String,
  pub password: String,
  pub timestamp: String,
  pub transaction_type: String,
  pub amount: i64,
  pub party_a: String,
  pub party_b: String,
  pub phone_number: String,
  #[serde(rename = "CallBackURL")]
  pub callback_url: String,
  pub account_reference: String,
  pub transaction_desc: String,
}

/// Both the acceptance body and Daraja's error body
/// (`requestId`, `errorCode`, `errorMessage`) decode into this.
#[derive(Debug, Default, Deserialize)]
pub struct StkPushResponse {
  #[serde(rename = "MerchantRequestID")]
  pub merchant_request_id: Option<String>,
  #[serde(rename = "CheckoutRequestID")]
  pub checkout_request_id: Option<String>,
  #[serde(rename = "ResponseCode")]
  pub response_code: Option<String>,
  #[serde(rename = "ResponseDescription")]
  pub response_description: Option<String>,
  #[serde(rename = "CustomerMessage")]
  pub customer_message: Option<String>,
  #[serde(rename = "errorCode")]
  pub error_code: Option<String>,
  #[serde(rename = "errorMessage")]
  pub error_message: Option<String>,
}
