// duka-storefront/src/web/handlers/checkout_handlers.rs

use actix_web::{web, HttpResponse};
use duka_flow::{FlowContext, FlowOutcome};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{info, instrument, warn};

use crate::errors::AppError;
use crate::models::OrderId;
use crate::pipelines::contexts::{CheckoutCtxData, CheckoutRequest};
use crate::pipelines::{poll_confirmation, CheckoutState, PollPolicy};
use crate::state::AppState;
use crate::web::extractors::SessionId;

/// Longest `wait` a status poll may ask for.
const MAX_WAIT_SECS: u32 = 30;

#[instrument(
  name = "handler::start_checkout",
  skip(app_state, session, payload),
  fields(payment_method = ?payload.payment_method)
)]
pub async fn start_checkout_handler(
  app_state: web::Data<AppState>,
  session: Option<SessionId>,
  payload: web::Json<CheckoutRequest>,
) -> Result<HttpResponse, AppError> {
  let session_id = session.map(|s| s.0);
  let ctx = FlowContext::new(CheckoutCtxData::new(
    app_state.get_ref().clone(),
    session_id,
    payload.into_inner(),
  ));

  match app_state.flows.run(ctx.clone()).await {
    Ok(FlowOutcome::Completed) => {
      let (order, state, acceptance) = ctx.with(|d| (d.order.clone(), d.state, d.acceptance.clone()));
      let order = order.ok_or_else(|| AppError::Internal("Checkout completed without an order".to_string()))?;
      info!(order_id = order.id, state = %state, "Checkout completed");

      match state {
        CheckoutState::AwaitingConfirmation => Ok(HttpResponse::Accepted().json(json!({
          "orderId": order.id,
          "state": state,
          "order": order,
          "payment": acceptance,
          "message": "Check your phone and enter your M-Pesa PIN to complete the payment.",
        }))),
        CheckoutState::Succeeded => Ok(HttpResponse::Created().json(json!({
          "orderId": order.id,
          "state": state,
          "order": order,
          "message": "Order placed. You will pay cash on delivery.",
        }))),
        other => Err(AppError::Internal(format!("Checkout ended in unexpected state '{}'", other))),
      }
    }
    Ok(FlowOutcome::Stopped) => {
      warn!("Checkout flow was stopped by a handler.");
      Err(AppError::Internal("Checkout was halted before completion.".to_string()))
    }
    Err(app_err) => {
      let order_id = ctx.with(|d| d.order_id());
      warn!(order_id = ?order_id, error = %app_err, "Checkout failed; cart kept");
      Err(app_err)
    }
  }
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
  /// Seconds to keep polling while the order is still pending.
  #[serde(default)]
  pub wait: Option<u32>,
}

#[instrument(name = "handler::checkout_status", skip(app_state, session, query))]
pub async fn checkout_status_handler(
  app_state: web::Data<AppState>,
  session: Option<SessionId>,
  path: web::Path<OrderId>,
  query: web::Query<StatusQuery>,
) -> Result<HttpResponse, AppError> {
  let order_id = path.into_inner();
  let policy = match query.wait.map(|w| w.min(MAX_WAIT_SECS)) {
    Some(wait) if wait > 0 => PollPolicy {
      interval: Duration::from_secs(1),
      max_attempts: wait + 1,
    },
    _ => PollPolicy::once(),
  };

  let (order, state) = poll_confirmation(
    app_state.get_ref(),
    session.as_ref().map(SessionId::as_str),
    order_id,
    policy,
  )
  .await?;

  Ok(HttpResponse::Ok().json(json!({
    "orderId": order.id,
    "status": order.status,
    "state": state,
  })))
}
