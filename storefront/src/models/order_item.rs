// duka-storefront/src/models/order_item.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One line of a cart or order. Stored inside the order row as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
  #[serde(alias = "productId", alias = "id")]
  pub product_ref: String,
  pub name: String,
  #[serde(alias = "qty")]
  pub quantity: u32,
  #[serde(alias = "price")]
  pub unit_price: Decimal,
}

impl LineItem {
  pub fn line_total(&self) -> Decimal {
    self.unit_price * Decimal::from(self.quantity)
  }
}
