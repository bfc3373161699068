// duka-storefront/src/web/routes.rs

use actix_web::http::header;
use actix_web::middleware::DefaultHeaders;
use actix_web::{error, web, HttpResponse};

use crate::errors::AppError;
use crate::web::handlers::{cart_handlers, checkout_handlers, order_handlers, payment_handlers, webhook_handlers};

async fn health_check_handler() -> HttpResponse {
  HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

/// CORS headers added to every response.
pub fn cors_headers() -> DefaultHeaders {
  DefaultHeaders::new()
    .add((header::ACCESS_CONTROL_ALLOW_CREDENTIALS, "true"))
    .add((header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"))
    .add((header::ACCESS_CONTROL_ALLOW_METHODS, "GET,OPTIONS,PATCH,DELETE,POST,PUT"))
    .add((
      header::ACCESS_CONTROL_ALLOW_HEADERS,
      "X-CSRF-Token, X-Requested-With, X-Session-Id, Accept, Accept-Version, Content-Length, Content-MD5, \
       Content-Type, Date, X-Api-Version",
    ))
}

/// Malformed JSON bodies answer with the same `{error}` shape as other 400s.
fn json_config() -> web::JsonConfig {
  web::JsonConfig::default().error_handler(|err, _req| {
    let message = match &err {
      error::JsonPayloadError::ContentType => "Expected a JSON body".to_string(),
      other => format!("Invalid JSON body: {}", other),
    };
    AppError::Validation(message).into()
  })
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.app_data(json_config()).service(
    web::scope("/api")
      .route("/health", web::get().to(health_check_handler))
      .service(
        web::resource("/mpesa/initiate")
          .route(web::post().to(payment_handlers::initiate_push_handler))
          .route(web::method(actix_web::http::Method::OPTIONS).to(payment_handlers::preflight_handler))
          .default_service(web::to(payment_handlers::method_not_allowed_handler)),
      )
      .service(
        web::resource("/webhooks/mpesa")
          .route(web::post().to(webhook_handlers::mpesa_webhook_handler))
          .default_service(web::to(payment_handlers::method_not_allowed_handler)),
      )
      .service(
        web::resource("/checkout")
          .route(web::post().to(checkout_handlers::start_checkout_handler)),
      )
      .service(
        web::resource("/checkout/{order_id}")
          .route(web::get().to(checkout_handlers::checkout_status_handler)),
      )
      .service(
        web::resource("/orders/{order_id}")
          .route(web::get().to(order_handlers::get_order_handler)),
      )
      .service(
        web::resource("/cart")
          .route(web::get().to(cart_handlers::get_cart_handler))
          .route(web::put().to(cart_handlers::put_cart_handler))
          .route(web::delete().to(cart_handlers::clear_cart_handler)),
      ),
  );
}
