// duka-storefront/src/config.rs

use crate::errors::{AppError, Result};
use crate::services::mpesa::GatewayError;
use dotenvy::dotenv;
use reqwest::Url;
use std::env;

pub const DEFAULT_MPESA_BASE_URL: &str = "https://sandbox.safaricom.co.ke";
pub const DEFAULT_TRANSACTION_TYPE: &str = "CustomerPayBillOnline";
pub const WEBHOOK_PATH: &str = "/api/webhooks/mpesa";

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  /// `None` runs the storefront on the in-memory order store.
  pub database_url: Option<String>,
  pub mpesa: MpesaConfig,
}

/// Daraja settings. Credentials stay optional at load time so the server can
/// boot without them; they are checked when a push is attempted.
#[derive(Clone)]
pub struct MpesaConfig {
  pub base_url: String,
  pub consumer_key: Option<String>,
  pub consumer_secret: Option<String>,
  pub shortcode: Option<String>,
  pub passkey: Option<String>,
  pub callback_base_url: Option<String>,
  pub transaction_type: String,
  pub timeout_secs: u64,
}

/// Credentials that passed the presence check.
#[derive(Clone)]
pub struct MpesaCredentials {
  pub consumer_key: String,
  pub consumer_secret: String,
  pub shortcode: String,
  pub passkey: String,
}

impl std::fmt::Debug for MpesaConfig {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let redact = |v: &Option<String>| if v.is_some() { "[REDACTED]" } else { "<unset>" };
    f.debug_struct("MpesaConfig")
      .field("base_url", &self.base_url)
      .field("consumer_key", &redact(&self.consumer_key))
      .field("consumer_secret", &redact(&self.consumer_secret))
      .field("shortcode", &self.shortcode)
      .field("passkey", &redact(&self.passkey))
      .field("callback_base_url", &self.callback_base_url)
      .field("transaction_type", &self.transaction_type)
      .field("timeout_secs", &self.timeout_secs)
      .finish()
  }
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok();

    let get_env = |var_name: &str| {
      env::var(var_name).map_err(|e| AppError::Config(format!("Missing environment variable '{}': {}", var_name, e)))
    };

    let server_host = get_env("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let server_port = get_env("SERVER_PORT")
      .unwrap_or_else(|_| "8080".to_string())
      .parse::<u16>()
      .map_err(|e| AppError::Config(format!("Invalid SERVER_PORT: {}", e)))?;
    let database_url = optional_env("DATABASE_URL");

    let mpesa = MpesaConfig {
      base_url: get_env("MPESA_BASE_URL").unwrap_or_else(|_| DEFAULT_MPESA_BASE_URL.to_string()),
      consumer_key: optional_env("MPESA_CONSUMER_KEY"),
      consumer_secret: optional_env("MPESA_CONSUMER_SECRET"),
      shortcode: optional_env("MPESA_SHORTCODE"),
      passkey: optional_env("MPESA_PASSKEY"),
      callback_base_url: optional_env("CALLBACK_BASE_URL"),
      transaction_type: get_env("MPESA_TRANSACTION_TYPE").unwrap_or_else(|_| DEFAULT_TRANSACTION_TYPE.to_string()),
      timeout_secs: get_env("MPESA_TIMEOUT_SECS")
        .unwrap_or_else(|_| "30".to_string())
        .parse::<u64>()
        .map_err(|e| AppError::Config(format!("Invalid MPESA_TIMEOUT_SECS: {}", e)))?,
    };

    tracing::info!("Application configuration loaded successfully.");
    tracing::debug!(mpesa = ?mpesa, database = database_url.is_some(), "Loaded config details");

    Ok(Self {
      server_host,
      server_port,
      database_url,
      mpesa,
    })
  }
}

impl MpesaConfig {
  /// Config pointing at `base_url` with every credential unset.
  pub fn unconfigured(base_url: impl Into<String>) -> Self {
    Self {
      base_url: base_url.into(),
      consumer_key: None,
      consumer_secret: None,
      shortcode: None,
      passkey: None,
      callback_base_url: None,
      transaction_type: DEFAULT_TRANSACTION_TYPE.to_string(),
      timeout_secs: 30,
    }
  }

  pub fn credentials(&self) -> std::result::Result<MpesaCredentials, GatewayError> {
    let require = |value: &Option<String>, name: &str| {
      value
        .clone()
        .ok_or_else(|| GatewayError::CredentialsMissing(format!("{} is not set", name)))
    };
    Ok(MpesaCredentials {
      consumer_key: require(&self.consumer_key, "MPESA_CONSUMER_KEY")?,
      consumer_secret: require(&self.consumer_secret, "MPESA_CONSUMER_SECRET")?,
      shortcode: require(&self.shortcode, "MPESA_SHORTCODE")?,
      passkey: require(&self.passkey, "MPESA_PASSKEY")?,
    })
  }

  /// `{CALLBACK_BASE_URL}/api/webhooks/mpesa?orderId={order_reference}`
  pub fn callback_url(&self, order_reference: &str) -> std::result::Result<String, GatewayError> {
    let base = self
      .callback_base_url
      .as_deref()
      .ok_or_else(|| GatewayError::CredentialsMissing("CALLBACK_BASE_URL is not set".to_string()))?;
    let mut url = Url::parse(&format!("{}{}", base.trim_end_matches('/'), WEBHOOK_PATH))
      .map_err(|e| GatewayError::CredentialsMissing(format!("CALLBACK_BASE_URL is not a valid URL: {}", e)))?;
    url.query_pairs_mut().append_pair("orderId", order_reference);
    Ok(url.to_string())
  }
}

fn optional_env(var_name: &str) -> Option<String> {
  env::var(var_name).ok().filter(|v| !v.trim().is_empty())
}
