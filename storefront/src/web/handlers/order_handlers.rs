// duka-storefront/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::instrument;

use crate::errors::AppError;
use crate::models::OrderId;
use crate::state::AppState;

#[instrument(name = "handler::get_order", skip(app_state))]
pub async fn get_order_handler(
  app_state: web::Data<AppState>,
  path: web::Path<OrderId>,
) -> Result<HttpResponse, AppError> {
  let order_id = path.into_inner();
  let order = app_state.store.get_order(order_id).await?;
  let payments = app_state.store.payments_for_order(order_id).await?;
  Ok(HttpResponse::Ok().json(json!({ "order": order, "payments": payments })))
}
