// duka-storefront/src/web/handlers/webhook_handlers.rs

//! M-Pesa callback endpoint.
//!
//! The provider retries any delivery it does not see acknowledged, so this
//! handler answers 200 for everything it can make sense of, including
//! deliveries it decided to ignore. Only a callback that cannot be tied to an
//! order at all (400) or a store failure while marking an order paid (500)
//! is reported back as an error.

use actix_web::{web, HttpResponse};
use duka_flow::{FlowContext, FlowOutcome};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info, instrument, warn};

use crate::errors::AppError;
use crate::pipelines::contexts::{Reconciliation, WebhookCtxData};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
  #[serde(rename = "orderId")]
  pub order_id: Option<String>,
}

/// Provider callback. Anything short of a missing correlation token or an
/// internal store failure is acknowledged with 200 so the provider stops retrying.
#[instrument(
  name = "handler::mpesa_webhook",
  skip(app_state, query, body),
  fields(query_order_id = ?query.order_id, payload_bytes = body.len())
)]
pub async fn mpesa_webhook_handler(
  app_state: web::Data<AppState>,
  query: web::Query<CallbackQuery>,
  body: web::Bytes,
) -> Result<HttpResponse, AppError> {
  let ctx = FlowContext::new(WebhookCtxData::new(
    app_state.get_ref().clone(),
    body,
    query.into_inner().order_id,
  ));

  match app_state.flows.run(ctx.clone()).await {
    // The flow stops early for skipped and ignored deliveries, so the
    // reconciliation recorded in the context decides the body, not the outcome.
    Ok(outcome) => {
      let reconciliation = ctx.with(|d| d.reconciliation.clone());
      match (outcome, reconciliation) {
        (_, Some(Reconciliation::Skipped { reason })) => {
          Ok(HttpResponse::Ok().json(json!({ "received": true, "warning": reason })))
        }
        (FlowOutcome::Completed, Some(Reconciliation::Applied { order_id, status })) => {
          info!(order_id, status = %status, "Webhook reconciled");
          Ok(HttpResponse::Ok().json(json!({ "received": true })))
        }
        (_, Some(Reconciliation::StatusNotWritten { order_id, reason })) => {
          warn!(order_id, reason = %reason, "Webhook acknowledged without an order update");
          Ok(HttpResponse::Ok().json(json!({ "received": true, "warning": reason })))
        }
        (_, Some(Reconciliation::Ignored { state })) => {
          info!(state = %state, "Webhook acknowledged without changes");
          Ok(HttpResponse::Ok().json(json!({ "received": true })))
        }
        (outcome, other) => {
          warn!(outcome = ?outcome, reconciliation = ?other, "Webhook flow ended without a reconciliation result");
          Ok(HttpResponse::Ok().json(json!({ "received": true })))
        }
      }
    }
    Err(AppError::Validation(message)) => {
      warn!(error = %message, "Rejecting malformed webhook");
      Ok(HttpResponse::BadRequest().json(json!({ "error": message })))
    }
    Err(app_err) => {
      error!(error = %app_err, "Webhook processing error");
      Ok(HttpResponse::InternalServerError().json(json!({ "error": app_err.to_string() })))
    }
  }
}
