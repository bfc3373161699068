// duka-storefront/src/models/cart.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::order_item::LineItem;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
  #[serde(default)]
  pub items: Vec<LineItem>,
}

impl Cart {
  pub fn total(&self) -> Decimal {
    self.items.iter().map(LineItem::line_total).sum()
  }
}
