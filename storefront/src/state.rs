// duka-storefront/src/state.rs

use crate::config::AppConfig;
use crate::db::OrderStore;
use crate::errors::AppError;
use crate::services::mpesa::PaymentGateway;
use crate::services::session::SessionStore;
use duka_flow::FlowRegistry;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub store: Arc<dyn OrderStore>,
  pub gateway: Arc<dyn PaymentGateway>,
  pub sessions: Arc<dyn SessionStore>,
  pub flows: Arc<FlowRegistry<AppError>>,
  pub config: Arc<AppConfig>,
}

impl AppState {
  /// Builds the state and registers every flow against it.
  pub fn new(
    config: AppConfig,
    store: Arc<dyn OrderStore>,
    gateway: Arc<dyn PaymentGateway>,
    sessions: Arc<dyn SessionStore>,
  ) -> Self {
    let state = AppState {
      store,
      gateway,
      sessions,
      flows: Arc::new(FlowRegistry::new()),
      config: Arc::new(config),
    };
    crate::pipelines::register_all_flows(&state.flows);
    state
  }
}
