// duka-storefront/src/pipelines/contexts.rs

//! Data carried through the checkout and webhook flows.
//! Handlers receive these wrapped in `duka_flow::FlowContext`.

use actix_web::web::Bytes;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::warn;

use super::callback::ProviderCallback;
use super::checkout_state::CheckoutState;
use crate::models::{LineItem, Order, OrderId, OrderStatus, PaymentMethod, ShippingAddress};
use crate::services::mpesa::PushAcceptance;
use crate::state::AppState;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
  #[serde(default)]
  pub customer_name: String,
  #[serde(default)]
  pub customer_email: String,
  #[serde(default)]
  pub customer_phone: String,
  #[serde(default)]
  pub shipping_address: ShippingAddress,
  /// Falls back to the session cart when absent or empty.
  #[serde(default)]
  pub items: Option<Vec<LineItem>>,
  pub payment_method: PaymentMethod,
  /// M-Pesa number to push to; defaults to `customer_phone`.
  #[serde(default, alias = "mpesaPhone")]
  pub phone: Option<String>,
}

#[derive(Clone)]
pub struct CheckoutCtxData {
  pub app_state: AppState,
  pub session_id: Option<String>,
  pub request: CheckoutRequest,
  pub state: CheckoutState,
  /// Every state entered, in order, starting after `Idle`.
  pub transitions: Vec<CheckoutState>,
  pub items: Vec<LineItem>,
  pub total: Decimal,
  pub push_phone: Option<String>,
  pub order: Option<Order>,
  pub acceptance: Option<PushAcceptance>,
  pub failure: Option<String>,
}

impl CheckoutCtxData {
  pub fn new(app_state: AppState, session_id: Option<String>, request: CheckoutRequest) -> Self {
    Self {
      app_state,
      session_id,
      request,
      state: CheckoutState::Idle,
      transitions: Vec::new(),
      items: Vec::new(),
      total: Decimal::ZERO,
      push_phone: None,
      order: None,
      acceptance: None,
      failure: None,
    }
  }

  pub fn transition(&mut self, next: CheckoutState) {
    if !self.state.can_advance_to(next) {
      warn!(from = %self.state, to = %next, "Unexpected checkout transition");
    }
    self.state = next;
    self.transitions.push(next);
  }

  pub fn fail(&mut self, reason: impl Into<String>) {
    self.failure = Some(reason.into());
    self.transition(CheckoutState::Failed);
  }

  pub fn order_id(&self) -> Option<OrderId> {
    self.order.as_ref().map(|o| o.id)
  }
}

/// How a webhook delivery was reconciled.
#[derive(Debug, Clone, PartialEq)]
pub enum Reconciliation {
  /// Order moved to `status`; payment recorded when a transaction id was present.
  Applied { order_id: OrderId, status: OrderStatus },
  /// Outcome state that carries no status change.
  Ignored { state: String },
  /// Delivery could not be tied to an order or was malformed; nothing was written.
  Skipped { reason: String },
  /// A failure outcome whose order update did not go through. The payment is
  /// still recorded and the delivery acknowledged.
  StatusNotWritten { order_id: OrderId, reason: String },
}

#[derive(Clone)]
pub struct WebhookCtxData {
  pub app_state: AppState,
  pub raw_payload: Bytes,
  /// `orderId` from the callback URL query string.
  pub query_order_id: Option<String>,
  pub callback: Option<ProviderCallback>,
  pub order_id: Option<OrderId>,
  pub previous_status: Option<OrderStatus>,
  pub reconciliation: Option<Reconciliation>,
  pub payment_recorded: bool,
}

impl WebhookCtxData {
  pub fn new(app_state: AppState, raw_payload: Bytes, query_order_id: Option<String>) -> Self {
    Self {
      app_state,
      raw_payload,
      query_order_id,
      callback: None,
      order_id: None,
      previous_status: None,
      reconciliation: None,
      payment_recorded: false,
    }
  }
}
