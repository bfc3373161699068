// duka-storefront/src/db/mod.rs

//! Order and payment persistence. No business rules live here.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{NewOrder, NewPayment, Order, OrderId, OrderStatus, PaymentRecord};

pub use memory::InMemoryOrderStore;
pub use postgres::PgOrderStore;

#[derive(Debug, Error)]
pub enum StoreError {
  #[error("Order {0} not found")]
  NotFound(OrderId),

  #[error("Database error: {0}")]
  Database(#[from] sqlx::Error),
}

impl StoreError {
  pub fn is_not_found(&self) -> bool {
    matches!(self, StoreError::NotFound(_))
  }
}

#[async_trait]
pub trait OrderStore: Send + Sync {
  /// Persists a `pending` order and assigns its id and creation time.
  async fn create_order(&self, order: NewOrder) -> Result<Order, StoreError>;

  async fn get_order(&self, id: OrderId) -> Result<Order, StoreError>;

  async fn update_order_status(&self, id: OrderId, status: OrderStatus) -> Result<Order, StoreError>;

  /// Inserts or overwrites the payment keyed by `transaction_id`.
  /// Must be atomic: concurrent calls for one transaction leave a single row.
  async fn upsert_payment(&self, payment: NewPayment) -> Result<PaymentRecord, StoreError>;

  async fn payments_for_order(&self, id: OrderId) -> Result<Vec<PaymentRecord>, StoreError>;
}
