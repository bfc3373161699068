// duka-storefront/src/pipelines/mod.rs

//! Flows used by the storefront and their registration.

use crate::errors::AppError;
use duka_flow::FlowRegistry;

pub mod callback;
pub mod checkout_pipeline;
pub mod checkout_state;
pub mod contexts;
pub mod webhook_pipeline;

pub use checkout_pipeline::{await_confirmation, poll_confirmation, PollPolicy};
pub use checkout_state::CheckoutState;

/// Registers every flow. Called once while building `AppState`.
pub fn register_all_flows(registry: &FlowRegistry<AppError>) {
  tracing::info!("Registering flows...");

  checkout_pipeline::register_checkout_flow(registry);
  webhook_pipeline::register_webhook_flow(registry);

  tracing::info!("All application flows registered.");
}
