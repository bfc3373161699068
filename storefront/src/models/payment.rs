// duka-storefront/src/models/payment.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::Type as SqlxType;

use super::order::OrderId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, SqlxType)]
#[sqlx(type_name = "payment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
  Pending,
  Completed,
  Failed,
}

/// A provider-reported payment attempt. `transaction_id` is unique.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
  pub id: i64,
  pub order_id: OrderId,
  pub transaction_id: String,
  pub amount: Decimal,
  pub phone_number: String,
  pub status: PaymentStatus,
  pub payment_method: String,
  pub initiated_at: Option<DateTime<Utc>>,
  pub completed_at: Option<DateTime<Utc>>,
  pub metadata: serde_json::Value,
}

#[derive(Debug, Clone)]
pub struct NewPayment {
  pub order_id: OrderId,
  pub transaction_id: String,
  pub amount: Decimal,
  pub phone_number: String,
  pub status: PaymentStatus,
  pub payment_method: String,
  pub initiated_at: Option<DateTime<Utc>>,
  pub completed_at: Option<DateTime<Utc>>,
  pub metadata: serde_json::Value,
}
