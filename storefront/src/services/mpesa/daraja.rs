// duka-storefront/src/services/mpesa/daraja.rs

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Utc;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument};

use super::error::GatewayError;
use super::types::{StkPushRequest, StkPushResponse, TokenResponse};
use super::{PaymentGateway, PushAcceptance, PushRequest};
use crate::config::{MpesaConfig, MpesaCredentials};

const TOKEN_PATH: &str = "/oauth/v1/generate?grant_type=client_credentials";
const STK_PUSH_PATH: &str = "/mpesa/stkpush/v1/processrequest";

/// Safaricom Daraja STK push client. A fresh OAuth token is fetched for every push.
#[derive(Clone)]
pub struct DarajaClient {
  config: Arc<MpesaConfig>,
  http_client: Client,
}

impl DarajaClient {
  pub fn new(config: MpesaConfig) -> Result<Self, GatewayError> {
    let http_client = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()
      .map_err(|e| GatewayError::Network(e.to_string()))?;

    Ok(DarajaClient {
      config: Arc::new(config),
      http_client,
    })
  }

  pub fn config(&self) -> &MpesaConfig {
    &self.config
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
  }

  #[instrument(name = "daraja::access_token", skip_all)]
  async fn access_token(&self, credentials: &MpesaCredentials) -> Result<String, GatewayError> {
    let response = self
      .http_client
      .get(self.url(TOKEN_PATH))
      .basic_auth(&credentials.consumer_key, Some(&credentials.consumer_secret))
      .send()
      .await?;

    let status = response.status();
    let body = response.text().await?;
    let token = serde_json::from_str::<TokenResponse>(&body)
      .ok()
      .and_then(|t| t.access_token)
      .filter(|t| !t.is_empty());

    match token {
      Some(token) if status.is_success() => {
        info!("Access token obtained");
        Ok(token)
      }
      _ => {
        error!(status = %status, "Failed to get access token");
        Err(GatewayError::Authentication(format!(
          "token endpoint answered {} without an access token",
          status
        )))
      }
    }
  }
}

/// `base64(shortcode + passkey + timestamp)`
pub fn stk_password(shortcode: &str, passkey: &str, timestamp: &str) -> String {
  STANDARD.encode(format!("{}{}{}", shortcode, passkey, timestamp))
}

#[async_trait]
impl PaymentGateway for DarajaClient {
  #[instrument(
    name = "daraja::initiate_push",
    skip_all,
    fields(order_reference = %request.order_reference, amount = %request.amount)
  )]
  async fn initiate_push(&self, request: PushRequest) -> Result<PushAcceptance, GatewayError> {
    let push = request.validate()?;
    let credentials = self.config.credentials()?;

    let token = self.access_token(&credentials).await?;

    let timestamp = Utc::now().format("%Y%m%d%H%M%S").to_string();
    let body = StkPushRequest {
      business_short_code: credentials.shortcode.clone(),
      password: stk_password(&credentials.shortcode, &credentials.passkey, &timestamp),
      timestamp,
      transaction_type: self.config.transaction_type.clone(),
      amount: push.amount,
      party_a: push.phone.clone(),
      party_b: credentials.shortcode.clone(),
      phone_number: push.phone.clone(),
      callback_url: push.callback_url.clone(),
      account_reference: push.order_reference.clone(),
      transaction_desc: format!("Payment for Order {}", push.order_reference),
    };

    info!("Initiating STK push");
    let response = self
      .http_client
      .post(self.url(STK_PUSH_PATH))
      .bearer_auth(&token)
      .json(&body)
      .send()
      .await?;

    let status = response.status();
    let text = response.text().await?;
    let parsed = serde_json::from_str::<StkPushResponse>(&text);

    let stk = match parsed {
      Ok(stk) => stk,
      Err(e) if status.is_success() => {
        return Err(GatewayError::Network(format!("unreadable STK push response: {}", e)));
      }
      Err(_) => StkPushResponse::default(),
    };

    if !status.is_success() || stk.response_code.as_deref() != Some("0") {
      let code = stk
        .response_code
        .clone()
        .or_else(|| stk.error_code.clone())
        .unwrap_or_else(|| status.as_u16().to_string());
      let message = stk
        .response_description
        .clone()
        .or_else(|| stk.error_message.clone())
        .unwrap_or_else(|| "STK Push failed".to_string());
      error!(code = %code, message = %message, "STK Push failed");
      return Err(GatewayError::Rejected { code, message });
    }

    info!(checkout_request_id = ?stk.checkout_request_id, "STK push accepted");
    Ok(PushAcceptance {
      provider_request_id: stk.merchant_request_id.unwrap_or_default(),
      provider_checkout_id: stk.checkout_request_id.unwrap_or_default(),
      response_code: stk.response_code.unwrap_or_default(),
      response_message: stk.response_description.unwrap_or_default(),
      customer_message: stk.customer_message,
    })
  }
}
