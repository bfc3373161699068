// duka-storefront/src/web/extractors.rs

use actix_web::{FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};
use tracing::warn;

use crate::errors::AppError;

pub const SESSION_HEADER: &str = "X-Session-Id";

/// Cart session named by the `X-Session-Id` header.
/// Use `Option<SessionId>` where the session is not required.
#[derive(Debug, Clone)]
pub struct SessionId(pub String);

impl SessionId {
  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl FromRequest for SessionId {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
    let session = req
      .headers()
      .get(SESSION_HEADER)
      .and_then(|v| v.to_str().ok())
      .map(str::trim)
      .filter(|v| !v.is_empty());

    match session {
      Some(id) => ready(Ok(SessionId(id.to_string()))),
      None => {
        warn!("SessionId extractor: missing {} header.", SESSION_HEADER);
        ready(Err(AppError::Validation(format!("Missing {} header", SESSION_HEADER))))
      }
    }
  }
}
