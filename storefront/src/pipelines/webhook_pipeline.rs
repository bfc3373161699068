// duka-storefront/src/pipelines/webhook_pipeline.rs

//! Webhook reconciliation flow: `parse_callback` -> `resolve_order` ->
//! `apply_outcome` -> `record_payment`.
//!
//! Each step either continues or stops the flow with a `Reconciliation`
//! written into the context; the handler turns that into the HTTP reply.
//! Order status writes are last-write-wins. A status that moves backward is
//! still applied, with a warning, since deliveries can arrive out of order.

use chrono::Utc;
use duka_flow::{Flow, FlowContext, FlowControl, FlowRegistry};
use tracing::{error, info, instrument, warn};

use crate::errors::AppError;
use crate::models::{NewPayment, OrderId, OrderStatus, PaymentMethod, PaymentStatus};
use crate::pipelines::callback::{self, CallbackOutcome};
use crate::pipelines::contexts::{Reconciliation, WebhookCtxData};

pub const WEBHOOK_STEPS: [&str; 4] = ["parse_callback", "resolve_order", "apply_outcome", "record_payment"];

pub fn build_webhook_flow() -> Flow<WebhookCtxData, AppError> {
  let mut flow = Flow::<WebhookCtxData, AppError>::new(
    "mpesa_webhook",
    &[
      (WEBHOOK_STEPS[0], false, None),
      (WEBHOOK_STEPS[1], false, None),
      (WEBHOOK_STEPS[2], false, None),
      (WEBHOOK_STEPS[3], false, None),
    ],
  );

  flow.on("parse_callback", parse_callback);
  flow.on("resolve_order", resolve_order);
  flow.on("apply_outcome", apply_outcome);
  flow.on("record_payment", record_payment);
  flow
}

pub fn register_webhook_flow(registry: &FlowRegistry<AppError>) {
  registry.register(build_webhook_flow());
}

fn skip(ctx: &FlowContext<WebhookCtxData>, reason: impl Into<String>) -> FlowControl {
  let reason = reason.into();
  warn!(reason = %reason, "Webhook reconciliation skipped");
  ctx.update(|d| d.reconciliation = Some(Reconciliation::Skipped { reason }));
  FlowControl::Stop
}

#[instrument(name = "webhook::parse_callback", skip_all)]
async fn parse_callback(ctx: FlowContext<WebhookCtxData>) -> Result<FlowControl, AppError> {
  let (raw, query_order_id) = ctx.with(|d| (d.raw_payload.clone(), d.query_order_id.clone()));

  match callback::parse_callback(&raw, query_order_id.as_deref()) {
    Ok(parsed) => {
      info!(
        order_reference = %parsed.order_reference,
        outcome = ?parsed.outcome,
        transaction_id = ?parsed.transaction_id,
        "Received M-Pesa webhook"
      );
      ctx.update(|d| d.callback = Some(parsed));
      Ok(FlowControl::Continue)
    }
    Err(e) if e.rejects_request() => {
      warn!(error = %e, "Webhook without a correlation token");
      Err(AppError::Validation(e.to_string()))
    }
    Err(e) => Ok(skip(&ctx, e.to_string())),
  }
}

#[instrument(name = "webhook::resolve_order", skip_all)]
async fn resolve_order(ctx: FlowContext<WebhookCtxData>) -> Result<FlowControl, AppError> {
  let (reference, store) = ctx.with(|d| {
    (
      d.callback.as_ref().map(|c| c.order_reference.clone()).unwrap_or_default(),
      d.app_state.store.clone(),
    )
  });

  let order_id = match reference.trim().parse::<OrderId>() {
    Ok(id) if id > 0 => id,
    _ => {
      warn!(order_reference = %reference, "Received non-numeric order ID");
      return Ok(skip(&ctx, "Non-numeric Order ID ignored"));
    }
  };

  match store.get_order(order_id).await {
    Ok(order) => {
      ctx.update(|d| {
        d.order_id = Some(order.id);
        d.previous_status = Some(order.status);
      });
      Ok(FlowControl::Continue)
    }
    Err(e) if e.is_not_found() => Ok(skip(&ctx, format!("Unknown Order ID {} ignored", order_id))),
    Err(e) => {
      error!(order_id, error = %e, "Error loading order");
      Err(e.into())
    }
  }
}

#[instrument(name = "webhook::apply_outcome", skip_all)]
async fn apply_outcome(ctx: FlowContext<WebhookCtxData>) -> Result<FlowControl, AppError> {
  let (outcome, order_id, previous, store) = ctx.with(|d| {
    (
      d.callback.as_ref().map(|c| c.outcome.clone()),
      d.order_id,
      d.previous_status,
      d.app_state.store.clone(),
    )
  });
  let (Some(outcome), Some(order_id)) = (outcome, order_id) else {
    return Err(AppError::Internal("Webhook outcome applied before the order was resolved".into()));
  };

  let target = match outcome {
    CallbackOutcome::Complete => OrderStatus::Paid,
    CallbackOutcome::Failed => OrderStatus::PaymentFailed,
    CallbackOutcome::Other(state) => {
      info!(order_id, state = %state, "Webhook state carries no status change");
      ctx.update(|d| d.reconciliation = Some(Reconciliation::Ignored { state }));
      return Ok(FlowControl::Stop);
    }
  };

  if let Some(previous) = previous {
    if previous.is_regression_to(target) {
      warn!(
        order_id,
        from = %previous,
        to = %target,
        "Order status moving backward; applying last write"
      );
    }
  }

  match store.update_order_status(order_id, target).await {
    Ok(order) => {
      info!(order_id, status = %order.status, "Order status updated");
      ctx.update(|d| {
        d.reconciliation = Some(Reconciliation::Applied {
          order_id,
          status: order.status,
        })
      });
      Ok(FlowControl::Continue)
    }
    Err(e) if e.is_not_found() => Ok(skip(&ctx, format!("Unknown Order ID {} ignored", order_id))),
    // A failed payment leaves the order unpaid either way, so a lost status
    // write is logged and acknowledged instead of inviting provider retries.
    Err(e) if target == OrderStatus::PaymentFailed => {
      error!(order_id, error = %e, "Could not mark order as payment_failed; acknowledging anyway");
      ctx.update(|d| {
        d.reconciliation = Some(Reconciliation::StatusNotWritten {
          order_id,
          reason: format!("Order {} status not updated", order_id),
        })
      });
      Ok(FlowControl::Continue)
    }
    Err(e) => {
      error!(order_id, error = %e, "Error updating order");
      Err(e.into())
    }
  }
}

#[instrument(name = "webhook::record_payment", skip_all)]
async fn record_payment(ctx: FlowContext<WebhookCtxData>) -> Result<FlowControl, AppError> {
  let (callback, order_id, store) = ctx.with(|d| (d.callback.clone(), d.order_id, d.app_state.store.clone()));
  let (Some(callback), Some(order_id)) = (callback, order_id) else {
    return Ok(FlowControl::Continue);
  };

  let Some(transaction_id) = callback.transaction_id.clone() else {
    warn!(order_id, "Webhook carried no transaction id; payment not recorded");
    return Ok(FlowControl::Continue);
  };

  // Completion stamps completed_at; a failure only marks when we first heard
  // about the attempt. The store keeps the earliest initiated_at.
  let now = Utc::now();
  let (status, initiated_at, completed_at) = match callback.outcome {
    CallbackOutcome::Complete => (PaymentStatus::Completed, None, Some(now)),
    CallbackOutcome::Failed => (PaymentStatus::Failed, Some(now), None),
    CallbackOutcome::Other(_) => return Ok(FlowControl::Continue),
  };

  let payment = NewPayment {
    order_id,
    transaction_id,
    amount: callback.amount,
    phone_number: callback.phone.clone(),
    status,
    payment_method: PaymentMethod::MobileMoney.label().to_string(),
    initiated_at,
    completed_at,
    metadata: callback.payload.clone(),
  };

  match store.upsert_payment(payment).await {
    Ok(record) => {
      info!(order_id, transaction_id = %record.transaction_id, "Payment recorded");
      ctx.update(|d| d.payment_recorded = true);
    }
    Err(e) => {
      error!(order_id, error = %e, "Error recording payment");
    }
  }
  Ok(FlowControl::Continue)
}
