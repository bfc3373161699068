// duka-storefront/src/web/handlers/cart_handlers.rs

use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::models::Cart;
use crate::state::AppState;
use crate::web::extractors::SessionId;

#[instrument(name = "handler::get_cart", skip(app_state), fields(session = %session.as_str()))]
pub async fn get_cart_handler(app_state: web::Data<AppState>, session: SessionId) -> Result<HttpResponse, AppError> {
  let cart = app_state.sessions.get(session.as_str()).await.unwrap_or_default();
  Ok(HttpResponse::Ok().json(json!({ "items": cart.items, "total": cart.total() })))
}

#[instrument(name = "handler::put_cart", skip(app_state, cart), fields(session = %session.as_str()))]
pub async fn put_cart_handler(
  app_state: web::Data<AppState>,
  session: SessionId,
  cart: web::Json<Cart>,
) -> Result<HttpResponse, AppError> {
  let cart = cart.into_inner();
  if let Some(item) = cart.items.iter().find(|i| i.quantity < 1) {
    return Err(AppError::Validation(format!("Quantity for '{}' must be at least 1", item.name)));
  }
  info!("Storing cart with {} item(s).", cart.items.len());
  let total = cart.total();
  app_state.sessions.set(session.as_str(), cart.clone()).await;
  Ok(HttpResponse::Ok().json(json!({ "items": cart.items, "total": total })))
}

#[instrument(name = "handler::clear_cart", skip(app_state), fields(session = %session.as_str()))]
pub async fn clear_cart_handler(app_state: web::Data<AppState>, session: SessionId) -> Result<HttpResponse, AppError> {
  app_state.sessions.clear(session.as_str()).await;
  Ok(HttpResponse::NoContent().finish())
}
