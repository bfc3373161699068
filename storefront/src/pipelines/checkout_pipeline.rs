// duka-storefront/src/pipelines/checkout_pipeline.rs

//! Checkout flow.
//!
//! `validate_checkout` -> `create_pending_order` -> one of
//! `initiate_push_payment` (mobile money) or `settle_cash_on_delivery`; the
//! other is skipped by a predicate on the payment method. The order is always
//! persisted as `pending` before the push goes out, so the webhook has
//! something to reconcile against even if the HTTP response is lost.
//! A mobile money checkout ends in `AwaitingConfirmation`; the outcome only
//! ever arrives through the webhook.

use duka_flow::{Flow, FlowContext, FlowControl, FlowRegistry, SkipCondition};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

use crate::db::{OrderStore, StoreError};
use crate::errors::AppError;
use crate::models::{LineItem, NewOrder, Order, OrderId, OrderStatus, PaymentMethod};
use crate::pipelines::checkout_state::CheckoutState;
use crate::pipelines::contexts::{CheckoutCtxData, CheckoutRequest};
use crate::services::mpesa::{self, PushRequest};
use crate::state::AppState;

pub const CHECKOUT_STEPS: [&str; 4] = [
  "validate_checkout",
  "create_pending_order",
  "initiate_push_payment",
  "settle_cash_on_delivery",
];

fn pays_with(method: PaymentMethod) -> SkipCondition<CheckoutCtxData> {
  Arc::new(move |ctx: FlowContext<CheckoutCtxData>| ctx.with(|d| d.request.payment_method != method))
}

pub fn build_checkout_flow() -> Flow<CheckoutCtxData, AppError> {
  let mut flow = Flow::<CheckoutCtxData, AppError>::new(
    "checkout",
    &[
      (CHECKOUT_STEPS[0], false, None),
      (CHECKOUT_STEPS[1], false, None),
      (CHECKOUT_STEPS[2], false, Some(pays_with(PaymentMethod::MobileMoney))),
      (CHECKOUT_STEPS[3], false, Some(pays_with(PaymentMethod::CashOnDelivery))),
    ],
  );

  flow.on("validate_checkout", validate_checkout);
  flow.on("create_pending_order", create_pending_order);
  flow.on("initiate_push_payment", initiate_push_payment);
  flow.on("settle_cash_on_delivery", settle_cash_on_delivery);
  flow
}

pub fn register_checkout_flow(registry: &FlowRegistry<AppError>) {
  registry.register(build_checkout_flow());
}

/// Items, total and push number of a checkout that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedCheckout {
  pub items: Vec<LineItem>,
  pub total: Decimal,
  pub push_phone: Option<String>,
}

/// Field checks for a checkout. The total is always computed here, never taken
/// from the client.
pub fn validate_request(request: &CheckoutRequest, items: Vec<LineItem>) -> Result<ValidatedCheckout, String> {
  if request.customer_name.trim().is_empty() {
    return Err("Customer name is required".to_string());
  }
  if items.is_empty() {
    return Err("Cart is empty".to_string());
  }
  for item in &items {
    if item.quantity < 1 {
      return Err(format!("Quantity for '{}' must be at least 1", item.name));
    }
    if item.unit_price < Decimal::ZERO {
      return Err(format!("Price for '{}' cannot be negative", item.name));
    }
  }
  let total: Decimal = items.iter().map(LineItem::line_total).sum();
  if total <= Decimal::ZERO {
    return Err("Order total must be greater than zero".to_string());
  }

  let push_phone = match request.payment_method {
    PaymentMethod::MobileMoney => {
      let phone = request
        .phone
        .as_deref()
        .unwrap_or(&request.customer_phone)
        .trim()
        .to_string();
      if phone.is_empty() {
        return Err("Missing amount or phone number".to_string());
      }
      if !mpesa::is_valid_phone(&phone) {
        return Err("Invalid phone number format. Use 254XXXXXXXXX".to_string());
      }
      Some(phone)
    }
    PaymentMethod::CashOnDelivery => None,
  };

  Ok(ValidatedCheckout {
    items,
    total,
    push_phone,
  })
}

#[instrument(name = "checkout::validate", skip_all)]
async fn validate_checkout(ctx: FlowContext<CheckoutCtxData>) -> Result<FlowControl, AppError> {
  let (request, session_id, sessions) = ctx.update(|d| {
    d.transition(CheckoutState::Validating);
    (d.request.clone(), d.session_id.clone(), d.app_state.sessions.clone())
  });

  let items = match request.items.clone() {
    Some(items) if !items.is_empty() => items,
    _ => match session_id.as_deref() {
      Some(session_id) => sessions.get(session_id).await.map(|c| c.items).unwrap_or_default(),
      None => Vec::new(),
    },
  };

  match validate_request(&request, items) {
    Ok(valid) => {
      info!(total = %valid.total, items = valid.items.len(), "Checkout validated");
      ctx.update(|d| {
        d.items = valid.items;
        d.total = valid.total;
        d.push_phone = valid.push_phone;
      });
      Ok(FlowControl::Continue)
    }
    Err(reason) => {
      warn!(reason = %reason, "Checkout rejected");
      ctx.update(|d| d.fail(reason.clone()));
      Err(AppError::Validation(reason))
    }
  }
}

#[instrument(name = "checkout::create_pending_order", skip_all)]
async fn create_pending_order(ctx: FlowContext<CheckoutCtxData>) -> Result<FlowControl, AppError> {
  let (store, new_order) = ctx.with(|d| {
    let request = &d.request;
    let customer_phone = if request.customer_phone.trim().is_empty() {
      d.push_phone.clone().unwrap_or_default()
    } else {
      request.customer_phone.trim().to_string()
    };
    (
      d.app_state.store.clone(),
      NewOrder {
        customer_name: request.customer_name.trim().to_string(),
        customer_email: request.customer_email.trim().to_string(),
        customer_phone,
        shipping_address: request.shipping_address.clone(),
        items: d.items.clone(),
        total: d.total,
        payment_method: request.payment_method,
      },
    )
  });

  match store.create_order(new_order).await {
    Ok(order) => {
      info!(order_id = order.id, total = %order.total, "Pending order created");
      ctx.update(|d| {
        d.order = Some(order);
        d.transition(CheckoutState::OrderCreated);
      });
      Ok(FlowControl::Continue)
    }
    Err(e) => {
      error!(error = %e, "Failed to create order");
      ctx.update(|d| d.fail(e.to_string()));
      Err(e.into())
    }
  }
}

#[instrument(name = "checkout::initiate_push_payment", skip_all)]
async fn initiate_push_payment(ctx: FlowContext<CheckoutCtxData>) -> Result<FlowControl, AppError> {
  let (order_id, total, phone, app_state) = ctx.update(|d| {
    d.transition(CheckoutState::GatewayCalled);
    (d.order_id(), d.total, d.push_phone.clone(), d.app_state.clone())
  });
  let order_id = order_id.ok_or_else(|| AppError::Internal("Push attempted before the order was created".into()))?;
  let order_reference = order_id.to_string();

  // Config and gateway errors share one failure path: either way the order
  // already exists and has to be marked failed.
  let result = async {
    let callback_url = app_state.config.mpesa.callback_url(&order_reference)?;
    app_state
      .gateway
      .initiate_push(PushRequest {
        amount: total,
        phone: phone.unwrap_or_default(),
        order_reference: order_reference.clone(),
        callback_url,
      })
      .await
  }
  .await;

  match result {
    Ok(acceptance) => {
      info!(order_id, checkout_request_id = %acceptance.provider_checkout_id, "Awaiting payment confirmation");
      ctx.update(|d| {
        d.acceptance = Some(acceptance);
        d.transition(CheckoutState::AwaitingConfirmation);
      });
      Ok(FlowControl::Continue)
    }
    Err(gateway_err) => {
      let err = AppError::from(gateway_err);
      error!(order_id, error = %err, gateway = err.is_gateway_error(), "Payment initiation failed");
      ctx.update(|d| d.fail(err.to_string()));
      mark_payment_failed(app_state.store.as_ref(), order_id).await;
      Err(err)
    }
  }
}

/// Best effort; a failure here is only logged.
async fn mark_payment_failed(store: &dyn OrderStore, order_id: OrderId) {
  if let Err(e) = store.update_order_status(order_id, OrderStatus::PaymentFailed).await {
    error!(order_id, error = %e, "Could not mark order as payment_failed");
  }
}

#[instrument(name = "checkout::settle_cash_on_delivery", skip_all)]
async fn settle_cash_on_delivery(ctx: FlowContext<CheckoutCtxData>) -> Result<FlowControl, AppError> {
  let (order_id, session_id, sessions) = ctx.update(|d| {
    d.transition(CheckoutState::Succeeded);
    (d.order_id(), d.session_id.clone(), d.app_state.sessions.clone())
  });
  if let Some(session_id) = session_id {
    sessions.clear(&session_id).await;
  }
  info!(order_id = ?order_id, "Cash on delivery order placed");
  Ok(FlowControl::Continue)
}

#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
  pub interval: Duration,
  pub max_attempts: u32,
}

impl PollPolicy {
  pub fn once() -> Self {
    Self {
      interval: Duration::ZERO,
      max_attempts: 1,
    }
  }
}

impl Default for PollPolicy {
  fn default() -> Self {
    Self {
      interval: Duration::from_secs(2),
      max_attempts: 30,
    }
  }
}

/// Polls the store until the order leaves `pending` or the attempts run out.
/// Resolution itself only ever comes from the webhook.
pub async fn await_confirmation(
  store: &dyn OrderStore,
  order_id: OrderId,
  policy: PollPolicy,
) -> Result<(Order, CheckoutState), StoreError> {
  let attempts = policy.max_attempts.max(1);
  let mut attempt = 1;
  loop {
    let order = store.get_order(order_id).await?;
    let state = CheckoutState::from_order_status(order.status);
    if state.is_terminal() || attempt >= attempts {
      return Ok((order, state));
    }
    attempt += 1;
    tokio::time::sleep(policy.interval).await;
  }
}

/// Confirmation check behind `GET /api/checkout/{id}`; clears the session cart
/// once the order is paid.
#[instrument(name = "checkout::poll_confirmation", skip(app_state, session_id))]
pub async fn poll_confirmation(
  app_state: &AppState,
  session_id: Option<&str>,
  order_id: OrderId,
  policy: PollPolicy,
) -> Result<(Order, CheckoutState), AppError> {
  let (order, state) = await_confirmation(app_state.store.as_ref(), order_id, policy).await?;
  if state == CheckoutState::Succeeded {
    if let Some(session_id) = session_id {
      app_state.sessions.clear(session_id).await;
    }
  }
  Ok((order, state))
}
