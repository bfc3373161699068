// duka-storefront/src/models/order.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::Type as SqlxType;
use std::fmt;

use super::order_item::LineItem;

pub type OrderId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, SqlxType)]
#[sqlx(type_name = "order_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
  Pending,
  Paid,
  PaymentFailed,
  Completed,
  Cancelled,
}

impl OrderStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      OrderStatus::Pending => "pending",
      OrderStatus::Paid => "paid",
      OrderStatus::PaymentFailed => "payment_failed",
      OrderStatus::Completed => "completed",
      OrderStatus::Cancelled => "cancelled",
    }
  }

  fn progress(&self) -> u8 {
    match self {
      OrderStatus::Pending => 0,
      OrderStatus::PaymentFailed => 1,
      OrderStatus::Paid => 2,
      OrderStatus::Completed | OrderStatus::Cancelled => 3,
    }
  }

  /// True when moving to `next` would undo progress already recorded,
  /// e.g. `paid -> payment_failed`.
  pub fn is_regression_to(&self, next: OrderStatus) -> bool {
    next.progress() < self.progress()
  }
}

impl fmt::Display for OrderStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, SqlxType)]
#[sqlx(type_name = "payment_method", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
  #[serde(alias = "mpesa")]
  MobileMoney,
  #[serde(alias = "cash")]
  CashOnDelivery,
}

impl PaymentMethod {
  /// Label stored on payment records.
  pub fn label(&self) -> &'static str {
    match self {
      PaymentMethod::MobileMoney => "M-Pesa",
      PaymentMethod::CashOnDelivery => "Cash on Delivery",
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShippingAddress {
  pub address1: String,
  pub address2: String,
  pub city: String,
  pub country: String,
  pub postcode: String,
  pub notes: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
  pub id: OrderId,
  pub customer_name: String,
  pub customer_email: String,
  pub customer_phone: String,
  pub shipping_address: ShippingAddress,
  pub items: Vec<LineItem>,
  pub total: Decimal,
  pub payment_method: PaymentMethod,
  pub status: OrderStatus,
  pub created_at: DateTime<Utc>,
}

/// Order as submitted to the store; id, status and timestamp are assigned there.
#[derive(Debug, Clone)]
pub struct NewOrder {
  pub customer_name: String,
  pub customer_email: String,
  pub customer_phone: String,
  pub shipping_address: ShippingAddress,
  pub items: Vec<LineItem>,
  pub total: Decimal,
  pub payment_method: PaymentMethod,
}
