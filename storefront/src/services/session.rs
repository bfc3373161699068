// duka-storefront/src/services/session.rs

//! Per-session cart state behind a small get/set/clear contract.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::models::Cart;

#[async_trait]
pub trait SessionStore: Send + Sync {
  async fn get(&self, session_id: &str) -> Option<Cart>;
  async fn set(&self, session_id: &str, cart: Cart);
  async fn clear(&self, session_id: &str);
}

#[derive(Debug, Default)]
pub struct InMemorySessionStore {
  carts: RwLock<HashMap<String, Cart>>,
}

impl InMemorySessionStore {
  pub fn new() -> Self {
    Self::default()
  }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
  async fn get(&self, session_id: &str) -> Option<Cart> {
    self.carts.read().await.get(session_id).cloned()
  }

  async fn set(&self, session_id: &str, cart: Cart) {
    self.carts.write().await.insert(session_id.to_string(), cart);
  }

  async fn clear(&self, session_id: &str) {
    self.carts.write().await.remove(session_id);
  }
}
