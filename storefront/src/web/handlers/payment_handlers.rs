// duka-storefront/src/web/handlers/payment_handlers.rs

use actix_web::{web, HttpResponse};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};
use std::str::FromStr;
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::services::mpesa::PushRequest;
use crate::state::AppState;

/// `amount` and `orderId` arrive as numbers or strings depending on the caller.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiatePushPayload {
  #[serde(default)]
  pub amount: Option<Value>,
  #[serde(default)]
  pub phone: Option<String>,
  #[serde(default)]
  pub order_id: Option<Value>,
}

fn decimal_from(value: &Value) -> Option<Decimal> {
  match value {
    Value::Number(n) => {
      let text = n.to_string();
      Decimal::from_str(&text).or_else(|_| Decimal::from_scientific(&text)).ok()
    }
    Value::String(s) => Decimal::from_str(s.trim()).ok(),
    _ => None,
  }
}

fn reference_from(value: &Value) -> Option<String> {
  match value {
    Value::Number(n) => Some(n.to_string()),
    Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
    _ => None,
  }
}

#[instrument(
  name = "handler::initiate_push",
  skip(app_state, payload),
  fields(order_id = ?payload.order_id, amount = ?payload.amount)
)]
pub async fn initiate_push_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<InitiatePushPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = payload.into_inner();
  info!("Payment initiation request");

  let amount = payload.amount.as_ref().filter(|v| !v.is_null());
  let phone = payload.phone.as_deref().map(str::trim).filter(|p| !p.is_empty());
  let (Some(amount), Some(phone)) = (amount, phone) else {
    return Err(AppError::Validation("Missing amount or phone number".to_string()));
  };
  let amount =
    decimal_from(amount).ok_or_else(|| AppError::Validation("Amount must be a number".to_string()))?;
  let order_reference = payload
    .order_id
    .as_ref()
    .and_then(reference_from)
    .ok_or_else(|| AppError::Validation("Missing orderId".to_string()))?;

  let request = PushRequest {
    amount,
    phone: phone.to_string(),
    order_reference: order_reference.clone(),
    callback_url: String::new(),
  };
  // Input errors outrank configuration errors.
  request.validate()?;
  let callback_url = app_state.config.mpesa.callback_url(&order_reference)?;

  let acceptance = app_state
    .gateway
    .initiate_push(PushRequest { callback_url, ..request })
    .await?;

  Ok(HttpResponse::Ok().json(json!({
    "success": true,
    "message": "STK push initiated successfully",
    "data": acceptance,
  })))
}

/// Preflight for browsers calling the initiation endpoint cross-origin.
pub async fn preflight_handler() -> HttpResponse {
  HttpResponse::Ok().finish()
}

pub async fn method_not_allowed_handler() -> HttpResponse {
  HttpResponse::MethodNotAllowed().json(json!({ "error": "Method Not Allowed" }))
}
