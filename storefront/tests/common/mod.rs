// tests/common/mod.rs
#![allow(dead_code, unused_macros)]

use async_trait::async_trait;
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::Level;

use duka_storefront::config::{AppConfig, MpesaConfig};
use duka_storefront::db::{InMemoryOrderStore, OrderStore};
use duka_storefront::models::{LineItem, NewOrder, Order, OrderStatus, PaymentMethod, ShippingAddress};
use duka_storefront::services::mpesa::{GatewayError, PaymentGateway, PushAcceptance, PushRequest};
use duka_storefront::services::session::InMemorySessionStore;
use duka_storefront::state::AppState;

pub const TEST_PHONE: &str = "254712345678";
pub const CALLBACK_BASE: &str = "https://shop.example.com";

pub static SETUP_TRACING: Lazy<()> = Lazy::new(|| {
  let _ = tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .with_test_writer()
    .try_init();
});

pub fn setup_tracing() {
  Lazy::force(&SETUP_TRACING);
}

/// Daraja settings with every credential present.
pub fn configured_mpesa(base_url: &str) -> MpesaConfig {
  MpesaConfig {
    consumer_key: Some("test-key".to_string()),
    consumer_secret: Some("test-secret".to_string()),
    shortcode: Some("174379".to_string()),
    passkey: Some("test-passkey".to_string()),
    callback_base_url: Some(CALLBACK_BASE.to_string()),
    ..MpesaConfig::unconfigured(base_url)
  }
}

pub fn app_config(mpesa: MpesaConfig) -> AppConfig {
  AppConfig {
    server_host: "127.0.0.1".to_string(),
    server_port: 0,
    database_url: None,
    mpesa,
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayBehaviour {
  Accept,
  Reject,
  Unreachable,
}

/// A push seen by [`RecordingGateway`], with the status the referenced order
/// had in the store at the moment of the call.
#[derive(Debug, Clone)]
pub struct RecordedPush {
  pub request: PushRequest,
  pub order_status_at_call: Option<OrderStatus>,
}

/// Stand-in gateway that records every push it receives.
pub struct RecordingGateway {
  store: Arc<InMemoryOrderStore>,
  behaviour: GatewayBehaviour,
  pub calls: Mutex<Vec<RecordedPush>>,
}

impl RecordingGateway {
  pub fn new(store: Arc<InMemoryOrderStore>, behaviour: GatewayBehaviour) -> Self {
    Self {
      store,
      behaviour,
      calls: Mutex::new(Vec::new()),
    }
  }

  pub async fn call_count(&self) -> usize {
    self.calls.lock().await.len()
  }
}

#[async_trait]
impl PaymentGateway for RecordingGateway {
  async fn initiate_push(&self, request: PushRequest) -> Result<PushAcceptance, GatewayError> {
    request.validate()?;
    let order_status_at_call = match request.order_reference.parse::<i64>() {
      Ok(id) => self.store.get_order(id).await.ok().map(|o| o.status),
      Err(_) => None,
    };
    self.calls.lock().await.push(RecordedPush {
      request: request.clone(),
      order_status_at_call,
    });

    match self.behaviour {
      GatewayBehaviour::Accept => Ok(PushAcceptance {
        provider_request_id: "29115-34620561-1".to_string(),
        provider_checkout_id: format!("ws_CO_{}", request.order_reference),
        response_code: "0".to_string(),
        response_message: "Success. Request accepted for processing".to_string(),
        customer_message: Some("Success. Request accepted for processing".to_string()),
      }),
      GatewayBehaviour::Reject => Err(GatewayError::Rejected {
        code: "1".to_string(),
        message: "The balance is insufficient for the transaction".to_string(),
      }),
      GatewayBehaviour::Unreachable => Err(GatewayError::Network("connection refused".to_string())),
    }
  }
}

pub struct TestHarness {
  pub state: AppState,
  pub store: Arc<InMemoryOrderStore>,
  pub sessions: Arc<InMemorySessionStore>,
  pub gateway: Arc<RecordingGateway>,
}

pub fn harness(behaviour: GatewayBehaviour) -> TestHarness {
  harness_with_config(behaviour, configured_mpesa("http://127.0.0.1:1"))
}

pub fn harness_with_config(behaviour: GatewayBehaviour, mpesa: MpesaConfig) -> TestHarness {
  setup_tracing();
  let store = Arc::new(InMemoryOrderStore::new());
  let sessions = Arc::new(InMemorySessionStore::new());
  let gateway = Arc::new(RecordingGateway::new(store.clone(), behaviour));
  let state = AppState::new(app_config(mpesa), store.clone(), gateway.clone(), sessions.clone());
  TestHarness {
    state,
    store,
    sessions,
    gateway,
  }
}

/// State wired to an arbitrary gateway, e.g. a `DarajaClient` against wiremock.
pub fn state_with_gateway(mpesa: MpesaConfig, gateway: Arc<dyn PaymentGateway>) -> (AppState, Arc<InMemoryOrderStore>) {
  setup_tracing();
  let store = Arc::new(InMemoryOrderStore::new());
  let state = AppState::new(app_config(mpesa), store.clone(), gateway, Arc::new(InMemorySessionStore::new()));
  (state, store)
}

pub fn line_item(name: &str, quantity: u32, unit_price: i64) -> LineItem {
  LineItem {
    product_ref: format!("sku-{}", name.to_lowercase()),
    name: name.to_string(),
    quantity,
    unit_price: Decimal::new(unit_price, 0),
  }
}

pub fn new_order(total: i64) -> NewOrder {
  NewOrder {
    customer_name: "Wanjiku Kamau".to_string(),
    customer_email: "wanjiku@example.com".to_string(),
    customer_phone: TEST_PHONE.to_string(),
    shipping_address: ShippingAddress {
      address1: "Moi Avenue 12".to_string(),
      city: "Nairobi".to_string(),
      country: "KE".to_string(),
      ..ShippingAddress::default()
    },
    items: vec![line_item("Kikoy", 1, total)],
    total: Decimal::new(total, 0),
    payment_method: PaymentMethod::MobileMoney,
  }
}

/// Creates orders until one with `id` exists and returns it.
pub async fn seed_order(store: &InMemoryOrderStore, id: i64) -> Order {
  loop {
    let order = store.create_order(new_order(1000)).await.unwrap();
    if order.id >= id {
      return order;
    }
  }
}

/// Builds the full route table around `$state`, the way `main` does.
macro_rules! test_app {
  ($state:expr) => {
    actix_web::test::init_service(
      actix_web::App::new()
        .app_data(actix_web::web::Data::new($state))
        .wrap(duka_storefront::web::cors_headers())
        .configure(duka_storefront::web::configure_app_routes),
    )
    .await
  };
}
