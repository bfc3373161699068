// duka-storefront/src/pipelines/checkout_state.rs

use serde::Serialize;
use std::fmt;

use crate::models::OrderStatus;

/// Progress of one checkout attempt.
///
/// ```text
/// Idle -> Validating -> OrderCreated -> GatewayCalled -> AwaitingConfirmation -> Succeeded | Failed
/// ```
///
/// Cash on delivery goes straight from `OrderCreated` to `Succeeded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutState {
  Idle,
  Validating,
  OrderCreated,
  GatewayCalled,
  AwaitingConfirmation,
  Succeeded,
  Failed,
}

impl CheckoutState {
  pub fn is_terminal(&self) -> bool {
    matches!(self, CheckoutState::Succeeded | CheckoutState::Failed)
  }

  pub fn can_advance_to(&self, next: CheckoutState) -> bool {
    use CheckoutState::*;
    matches!(
      (self, next),
      (Idle, Validating)
        | (Validating, OrderCreated)
        | (Validating, Failed)
        | (OrderCreated, GatewayCalled)
        | (OrderCreated, Succeeded)
        | (OrderCreated, Failed)
        | (GatewayCalled, AwaitingConfirmation)
        | (GatewayCalled, Failed)
        | (AwaitingConfirmation, Succeeded)
        | (AwaitingConfirmation, Failed)
    )
  }

  /// What a stored order status means for a checkout waiting on it.
  pub fn from_order_status(status: OrderStatus) -> CheckoutState {
    match status {
      OrderStatus::Paid | OrderStatus::Completed => CheckoutState::Succeeded,
      OrderStatus::PaymentFailed | OrderStatus::Cancelled => CheckoutState::Failed,
      OrderStatus::Pending => CheckoutState::AwaitingConfirmation,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      CheckoutState::Idle => "idle",
      CheckoutState::Validating => "validating",
      CheckoutState::OrderCreated => "order_created",
      CheckoutState::GatewayCalled => "gateway_called",
      CheckoutState::AwaitingConfirmation => "awaiting_confirmation",
      CheckoutState::Succeeded => "succeeded",
      CheckoutState::Failed => "failed",
    }
  }
}

impl fmt::Display for CheckoutState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}
