// duka-storefront/src/db/memory.rs

//! In-memory `OrderStore`.
//!
//! Orders and payments live in two `tokio` `RwLock`ed maps. Payments are keyed
//! by `transaction_id`, which plays the role of the `UNIQUE` constraint in
//! Postgres: the whole read-merge-write of an upsert happens under one write
//! guard, so duplicate webhook deliveries racing each other still end with a
//! single row.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use super::{OrderStore, StoreError};
use crate::models::{NewOrder, NewPayment, Order, OrderId, OrderStatus, PaymentRecord};

/// Process-local store used when no database is configured and in tests.
#[derive(Debug)]
pub struct InMemoryOrderStore {
  orders: RwLock<HashMap<OrderId, Order>>,
  payments: RwLock<HashMap<String, PaymentRecord>>,
  next_order_id: AtomicI64,
  next_payment_id: AtomicI64,
}

impl Default for InMemoryOrderStore {
  fn default() -> Self {
    Self {
      orders: RwLock::new(HashMap::new()),
      payments: RwLock::new(HashMap::new()),
      next_order_id: AtomicI64::new(1),
      next_payment_id: AtomicI64::new(1),
    }
  }
}

impl InMemoryOrderStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub async fn order_count(&self) -> usize {
    self.orders.read().await.len()
  }

  pub async fn payment_count(&self) -> usize {
    self.payments.read().await.len()
  }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
  #[instrument(name = "store::create_order", skip_all, fields(customer = %order.customer_name))]
  async fn create_order(&self, order: NewOrder) -> Result<Order, StoreError> {
    let id = self.next_order_id.fetch_add(1, Ordering::SeqCst);
    let created = Order {
      id,
      customer_name: order.customer_name,
      customer_email: order.customer_email,
      customer_phone: order.customer_phone,
      shipping_address: order.shipping_address,
      items: order.items,
      total: order.total,
      payment_method: order.payment_method,
      status: OrderStatus::Pending,
      created_at: Utc::now(),
    };
    self.orders.write().await.insert(id, created.clone());
    debug!(order_id = id, "Order stored in memory.");
    Ok(created)
  }

  async fn get_order(&self, id: OrderId) -> Result<Order, StoreError> {
    self.orders.read().await.get(&id).cloned().ok_or(StoreError::NotFound(id))
  }

  #[instrument(name = "store::update_order_status", skip(self))]
  async fn update_order_status(&self, id: OrderId, status: OrderStatus) -> Result<Order, StoreError> {
    let mut orders = self.orders.write().await;
    let order = orders.get_mut(&id).ok_or(StoreError::NotFound(id))?;
    order.status = status;
    Ok(order.clone())
  }

  #[instrument(name = "store::upsert_payment", skip_all, fields(transaction_id = %payment.transaction_id))]
  async fn upsert_payment(&self, payment: NewPayment) -> Result<PaymentRecord, StoreError> {
    // Held until the insert below; the merge must see the latest row.
    let mut payments = self.payments.write().await;
    let record = match payments.get(&payment.transaction_id) {
      // Same merge rules as the SQL upsert: first initiated_at wins, a
      // completed_at is never cleared by a later delivery.
      Some(existing) => PaymentRecord {
        id: existing.id,
        order_id: payment.order_id,
        transaction_id: payment.transaction_id,
        amount: payment.amount,
        phone_number: payment.phone_number,
        status: payment.status,
        payment_method: payment.payment_method,
        initiated_at: existing.initiated_at.or(payment.initiated_at),
        completed_at: payment.completed_at.or(existing.completed_at),
        metadata: payment.metadata,
      },
      None => PaymentRecord {
        id: self.next_payment_id.fetch_add(1, Ordering::SeqCst),
        order_id: payment.order_id,
        transaction_id: payment.transaction_id,
        amount: payment.amount,
        phone_number: payment.phone_number,
        status: payment.status,
        payment_method: payment.payment_method,
        initiated_at: payment.initiated_at,
        completed_at: payment.completed_at,
        metadata: payment.metadata,
      },
    };
    payments.insert(record.transaction_id.clone(), record.clone());
    Ok(record)
  }

  async fn payments_for_order(&self, id: OrderId) -> Result<Vec<PaymentRecord>, StoreError> {
    let payments = self.payments.read().await;
    let mut records: Vec<PaymentRecord> = payments.values().filter(|p| p.order_id == id).cloned().collect();
    records.sort_by_key(|p| p.id);
    Ok(records)
  }
}
