// duka-storefront/src/main.rs

use actix_web::{web as actix_data, App, HttpServer};
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;

use duka_storefront::config::AppConfig;
use duka_storefront::db::{InMemoryOrderStore, OrderStore, PgOrderStore};
use duka_storefront::services::mpesa::DarajaClient;
use duka_storefront::services::session::InMemorySessionStore;
use duka_storefront::state::AppState;
use duka_storefront::web::{configure_app_routes, cors_headers};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  tracing_subscriber::fmt()
    .with_max_level(Level::INFO)
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .with_span_events(FmtSpan::CLOSE)
    .init();

  tracing::info!("Starting storefront server...");

  let app_config = match AppConfig::from_env() {
    Ok(cfg) => cfg,
    Err(e) => {
      tracing::error!(error = %e, "Failed to load application configuration.");
      return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
    }
  };

  let store: Arc<dyn OrderStore> = match app_config.database_url.as_deref() {
    Some(url) => match PgOrderStore::connect(url).await {
      Ok(store) => {
        tracing::info!("Successfully connected to the database.");
        Arc::new(store)
      }
      Err(e) => {
        tracing::error!(error = %e, "Failed to connect to the database.");
        return Err(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()));
      }
    },
    None => {
      tracing::warn!("DATABASE_URL not set; orders are kept in memory and lost on restart.");
      Arc::new(InMemoryOrderStore::new())
    }
  };

  let gateway = match DarajaClient::new(app_config.mpesa.clone()) {
    Ok(client) => Arc::new(client),
    Err(e) => {
      tracing::error!(error = %e, "Failed to build the M-Pesa client.");
      return Err(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()));
    }
  };
  if gateway.config().credentials().is_err() {
    tracing::warn!("M-Pesa credentials are incomplete; payment initiation will fail until they are set.");
  }

  let server_address = format!("{}:{}", app_config.server_host, app_config.server_port);
  let app_state = AppState::new(app_config, store, gateway, Arc::new(InMemorySessionStore::new()));
  tracing::info!("Flows registered.");

  tracing::info!("Attempting to bind server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(cors_headers())
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await
}
