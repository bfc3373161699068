// duka-storefront/src/pipelines/callback.rs

//! Parsing of provider callbacks into a typed [`ProviderCallback`].
//!
//! Two shapes are accepted:
//! - the flat aggregator shape `{api_ref, state, tracking_id, value, phone_number | mpesa_number}`;
//! - Daraja's `{Body: {stkCallback: {..}}}`, correlated through the `orderId`
//!   query parameter of the callback URL.

use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::str::FromStr;
use thiserror::Error;

pub const UNKNOWN_PHONE: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
  Complete,
  Failed,
  /// Any other reported state, kept verbatim for logging.
  Other(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProviderCallback {
  pub order_reference: String,
  pub outcome: CallbackOutcome,
  pub transaction_id: Option<String>,
  pub amount: Decimal,
  pub phone: String,
  pub payload: Value,
}

#[derive(Debug, Error, PartialEq)]
pub enum CallbackParseError {
  #[error("Missing api_ref (Order ID)")]
  MissingCorrelation,

  #[error("Callback body is not valid JSON: {0}")]
  InvalidJson(String),

  #[error("Callback is missing '{0}'")]
  MissingField(&'static str),

  #[error("Callback field '{field}' is malformed: {reason}")]
  InvalidField { field: &'static str, reason: String },
}

impl CallbackParseError {
  /// Only a missing correlation token makes the request itself malformed;
  /// everything else is acknowledged and skipped.
  pub fn rejects_request(&self) -> bool {
    matches!(self, CallbackParseError::MissingCorrelation)
  }
}

pub fn parse_callback(body: &[u8], query_order_id: Option<&str>) -> Result<ProviderCallback, CallbackParseError> {
  let query_order_id = query_order_id.map(str::trim).filter(|s| !s.is_empty());

  let payload: Value = match serde_json::from_slice(body) {
    Ok(v) => v,
    Err(e) => {
      return match query_order_id {
        Some(_) => Err(CallbackParseError::InvalidJson(e.to_string())),
        None => Err(CallbackParseError::MissingCorrelation),
      };
    }
  };

  if payload.pointer("/Body/stkCallback").is_some() {
    parse_stk_callback(payload, query_order_id)
  } else {
    parse_flat_callback(payload, query_order_id)
  }
}

fn parse_flat_callback(payload: Value, query_order_id: Option<&str>) -> Result<ProviderCallback, CallbackParseError> {
  let Some(fields) = payload.as_object() else {
    return match query_order_id {
      Some(_) => Err(CallbackParseError::InvalidField {
        field: "body",
        reason: "expected a JSON object".to_string(),
      }),
      None => Err(CallbackParseError::MissingCorrelation),
    };
  };

  let order_reference = scalar_text(fields.get("api_ref"))
    .or_else(|| query_order_id.map(str::to_string))
    .ok_or(CallbackParseError::MissingCorrelation)?;

  let state = match fields.get("state") {
    Some(Value::String(s)) => s.trim().to_string(),
    Some(_) => {
      return Err(CallbackParseError::InvalidField {
        field: "state",
        reason: "expected a string".to_string(),
      })
    }
    None => return Err(CallbackParseError::MissingField("state")),
  };
  let outcome = match state.as_str() {
    "COMPLETE" => CallbackOutcome::Complete,
    "FAILED" => CallbackOutcome::Failed,
    _ => CallbackOutcome::Other(state),
  };

  let transaction_id = scalar_text(fields.get("tracking_id"));
  let amount = amount_field(fields, "value")?;
  let phone = scalar_text(fields.get("phone_number"))
    .or_else(|| scalar_text(fields.get("mpesa_number")))
    .unwrap_or_else(|| UNKNOWN_PHONE.to_string());

  Ok(ProviderCallback {
    order_reference,
    outcome,
    transaction_id,
    amount,
    phone,
    payload,
  })
}

fn parse_stk_callback(payload: Value, query_order_id: Option<&str>) -> Result<ProviderCallback, CallbackParseError> {
  let order_reference = query_order_id
    .map(str::to_string)
    .ok_or(CallbackParseError::MissingCorrelation)?;

  let stk = payload
    .pointer("/Body/stkCallback")
    .and_then(Value::as_object)
    .ok_or(CallbackParseError::InvalidField {
      field: "stkCallback",
      reason: "expected a JSON object".to_string(),
    })?;

  let result_code = match stk.get("ResultCode") {
    Some(Value::Number(n)) => n.as_i64(),
    Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
    _ => return Err(CallbackParseError::MissingField("ResultCode")),
  }
  .ok_or(CallbackParseError::InvalidField {
    field: "ResultCode",
    reason: "expected an integer".to_string(),
  })?;

  let outcome = if result_code == 0 {
    CallbackOutcome::Complete
  } else {
    CallbackOutcome::Failed
  };

  let metadata: Map<String, Value> = stk
    .get("CallbackMetadata")
    .and_then(|m| m.get("Item"))
    .and_then(Value::as_array)
    .map(|items| {
      items
        .iter()
        .filter_map(|item| {
          let name = item.get("Name")?.as_str()?;
          Some((name.to_string(), item.get("Value").cloned().unwrap_or(Value::Null)))
        })
        .collect()
    })
    .unwrap_or_default();

  let transaction_id =
    scalar_text(metadata.get("MpesaReceiptNumber")).or_else(|| scalar_text(stk.get("CheckoutRequestID")));
  let amount = amount_field(&metadata, "Amount")?;
  let phone = scalar_text(metadata.get("PhoneNumber")).unwrap_or_else(|| UNKNOWN_PHONE.to_string());

  Ok(ProviderCallback {
    order_reference,
    outcome,
    transaction_id,
    amount,
    phone,
    payload,
  })
}

/// Strings and numbers as trimmed text; anything else (or empty) is absent.
fn scalar_text(value: Option<&Value>) -> Option<String> {
  match value? {
    Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
    Value::Number(n) => Some(n.to_string()),
    _ => None,
  }
}

/// Missing or null amounts count as zero.
fn amount_field(fields: &Map<String, Value>, field: &'static str) -> Result<Decimal, CallbackParseError> {
  let text = match fields.get(field) {
    None | Some(Value::Null) => return Ok(Decimal::ZERO),
    Some(Value::String(s)) if s.trim().is_empty() => return Ok(Decimal::ZERO),
    Some(Value::String(s)) => s.trim().to_string(),
    Some(Value::Number(n)) => n.to_string(),
    Some(_) => {
      return Err(CallbackParseError::InvalidField {
        field,
        reason: "expected a number".to_string(),
      })
    }
  };
  Decimal::from_str(&text)
    .or_else(|_| Decimal::from_scientific(&text))
    .map_err(|e| CallbackParseError::InvalidField {
      field,
      reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn bytes(value: Value) -> Vec<u8> {
    serde_json::to_vec(&value).unwrap()
  }

  #[test]
  fn flat_complete_callback() {
    let body = bytes(json!({
      "api_ref": "42",
      "state": "COMPLETE",
      "tracking_id": "TXN1",
      "value": "1000",
      "mpesa_number": "254712345678"
    }));
    let cb = parse_callback(&body, None).unwrap();
    assert_eq!(cb.order_reference, "42");
    assert_eq!(cb.outcome, CallbackOutcome::Complete);
    assert_eq!(cb.transaction_id.as_deref(), Some("TXN1"));
    assert_eq!(cb.amount, Decimal::new(1000, 0));
    assert_eq!(cb.phone, "254712345678");
  }

  #[test]
  fn numeric_api_ref_and_missing_phone() {
    let body = bytes(json!({ "api_ref": 7, "state": "PENDING", "value": 12.5 }));
    let cb = parse_callback(&body, None).unwrap();
    assert_eq!(cb.order_reference, "7");
    assert_eq!(cb.outcome, CallbackOutcome::Other("PENDING".to_string()));
    assert_eq!(cb.amount, Decimal::new(125, 1));
    assert_eq!(cb.phone, UNKNOWN_PHONE);
    assert!(cb.transaction_id.is_none());
  }

  #[test]
  fn missing_correlation_rejects_the_request() {
    let body = bytes(json!({ "state": "COMPLETE", "tracking_id": "TXN1" }));
    let err = parse_callback(&body, None).unwrap_err();
    assert_eq!(err, CallbackParseError::MissingCorrelation);
    assert!(err.rejects_request());
  }

  #[test]
  fn garbage_body_without_query_is_missing_correlation() {
    assert_eq!(
      parse_callback(b"not json", None).unwrap_err(),
      CallbackParseError::MissingCorrelation
    );
  }

  #[test]
  fn garbage_body_with_query_fails_closed() {
    let err = parse_callback(b"not json", Some("42")).unwrap_err();
    assert!(matches!(err, CallbackParseError::InvalidJson(_)));
    assert!(!err.rejects_request());
  }

  #[test]
  fn query_order_id_correlates_flat_payload_without_api_ref() {
    let body = bytes(json!({ "state": "FAILED", "tracking_id": "TXN9" }));
    let cb = parse_callback(&body, Some("42")).unwrap();
    assert_eq!(cb.order_reference, "42");
    assert_eq!(cb.outcome, CallbackOutcome::Failed);
  }

  #[test]
  fn missing_state_fails_closed() {
    let body = bytes(json!({ "api_ref": "42" }));
    let err = parse_callback(&body, None).unwrap_err();
    assert_eq!(err, CallbackParseError::MissingField("state"));
    assert!(!err.rejects_request());
  }

  #[test]
  fn mistyped_amount_fails_closed() {
    let body = bytes(json!({ "api_ref": "42", "state": "COMPLETE", "value": {"x": 1} }));
    assert!(matches!(
      parse_callback(&body, None),
      Err(CallbackParseError::InvalidField { field: "value", .. })
    ));
  }

  #[test]
  fn daraja_success_callback() {
    let body = bytes(json!({
      "Body": { "stkCallback": {
        "MerchantRequestID": "29115-34620561-1",
        "CheckoutRequestID": "ws_CO_191220191020363925",
        "ResultCode": 0,
        "ResultDesc": "The service request is processed successfully.",
        "CallbackMetadata": { "Item": [
          { "Name": "Amount", "Value": 1.00 },
          { "Name": "MpesaReceiptNumber", "Value": "NLJ7RT61SV" },
          { "Name": "TransactionDate", "Value": 20191219102115u64 },
          { "Name": "PhoneNumber", "Value": 254708374149u64 }
        ]}
      }}
    }));
    let cb = parse_callback(&body, Some("42")).unwrap();
    assert_eq!(cb.order_reference, "42");
    assert_eq!(cb.outcome, CallbackOutcome::Complete);
    assert_eq!(cb.transaction_id.as_deref(), Some("NLJ7RT61SV"));
    assert_eq!(cb.amount, Decimal::ONE);
    assert_eq!(cb.phone, "254708374149");
  }

  #[test]
  fn daraja_cancelled_callback_uses_checkout_id() {
    let body = bytes(json!({
      "Body": { "stkCallback": {
        "MerchantRequestID": "29115-34620561-1",
        "CheckoutRequestID": "ws_CO_1",
        "ResultCode": 1032,
        "ResultDesc": "Request cancelled by user"
      }}
    }));
    let cb = parse_callback(&body, Some("42")).unwrap();
    assert_eq!(cb.outcome, CallbackOutcome::Failed);
    assert_eq!(cb.transaction_id.as_deref(), Some("ws_CO_1"));
    assert_eq!(cb.amount, Decimal::ZERO);
  }

  #[test]
  fn daraja_callback_without_order_id_is_missing_correlation() {
    let body = bytes(json!({ "Body": { "stkCallback": { "ResultCode": 0 } } }));
    assert_eq!(
      parse_callback(&body, None).unwrap_err(),
      CallbackParseError::MissingCorrelation
    );
  }
}
