// duka-storefront/src/db/postgres.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use tracing::{info, instrument};

use super::{OrderStore, StoreError};
use crate::models::{
  LineItem, NewOrder, NewPayment, Order, OrderId, OrderStatus, PaymentMethod, PaymentRecord, PaymentStatus,
  ShippingAddress,
};

const ORDER_COLUMNS: &str = "id, customer_name, customer_email, customer_phone, shipping_address, items, total, \
                             payment_method, status, created_at";
const PAYMENT_COLUMNS: &str = "id, order_id, transaction_id, amount, phone_number, status, payment_method, \
                               initiated_at, completed_at, metadata";

#[derive(FromRow)]
struct OrderRow {
  id: i64,
  customer_name: String,
  customer_email: String,
  customer_phone: String,
  shipping_address: Json<ShippingAddress>,
  items: Json<Vec<LineItem>>,
  total: Decimal,
  payment_method: PaymentMethod,
  status: OrderStatus,
  created_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
  fn from(row: OrderRow) -> Self {
    Order {
      id: row.id,
      customer_name: row.customer_name,
      customer_email: row.customer_email,
      customer_phone: row.customer_phone,
      shipping_address: row.shipping_address.0,
      items: row.items.0,
      total: row.total,
      payment_method: row.payment_method,
      status: row.status,
      created_at: row.created_at,
    }
  }
}

#[derive(FromRow)]
struct PaymentRow {
  id: i64,
  order_id: i64,
  transaction_id: String,
  amount: Decimal,
  phone_number: String,
  status: PaymentStatus,
  payment_method: String,
  initiated_at: Option<DateTime<Utc>>,
  completed_at: Option<DateTime<Utc>>,
  metadata: Json<serde_json::Value>,
}

impl From<PaymentRow> for PaymentRecord {
  fn from(row: PaymentRow) -> Self {
    PaymentRecord {
      id: row.id,
      order_id: row.order_id,
      transaction_id: row.transaction_id,
      amount: row.amount,
      phone_number: row.phone_number,
      status: row.status,
      payment_method: row.payment_method,
      initiated_at: row.initiated_at,
      completed_at: row.completed_at,
      metadata: row.metadata.0,
    }
  }
}

#[derive(Clone, Debug)]
pub struct PgOrderStore {
  pool: PgPool,
}

impl PgOrderStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  /// Connects and applies the embedded migrations.
  pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
    let pool = PgPoolOptions::new().max_connections(5).connect(database_url).await?;
    info!("Database pool created successfully.");
    sqlx::migrate!("./migrations").run(&pool).await.map_err(sqlx::Error::from)?;
    info!("Database migrations applied.");
    Ok(Self::new(pool))
  }
}

#[async_trait]
impl OrderStore for PgOrderStore {
  #[instrument(name = "store::create_order", skip_all, fields(customer = %order.customer_name))]
  async fn create_order(&self, order: NewOrder) -> Result<Order, StoreError> {
    let sql = format!(
      "INSERT INTO orders (customer_name, customer_email, customer_phone, shipping_address, items, total, \
       payment_method, status) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {}",
      ORDER_COLUMNS
    );
    let row: OrderRow = sqlx::query_as(&sql)
      .bind(&order.customer_name)
      .bind(&order.customer_email)
      .bind(&order.customer_phone)
      .bind(Json(&order.shipping_address))
      .bind(Json(&order.items))
      .bind(order.total)
      .bind(order.payment_method)
      .bind(OrderStatus::Pending)
      .fetch_one(&self.pool)
      .await?;
    Ok(row.into())
  }

  async fn get_order(&self, id: OrderId) -> Result<Order, StoreError> {
    let sql = format!("SELECT {} FROM orders WHERE id = $1", ORDER_COLUMNS);
    let row: Option<OrderRow> = sqlx::query_as(&sql).bind(id).fetch_optional(&self.pool).await?;
    row.map(Order::from).ok_or(StoreError::NotFound(id))
  }

  #[instrument(name = "store::update_order_status", skip(self))]
  async fn update_order_status(&self, id: OrderId, status: OrderStatus) -> Result<Order, StoreError> {
    let sql = format!(
      "UPDATE orders SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
      ORDER_COLUMNS
    );
    let row: Option<OrderRow> = sqlx::query_as(&sql)
      .bind(id)
      .bind(status)
      .fetch_optional(&self.pool)
      .await?;
    row.map(Order::from).ok_or(StoreError::NotFound(id))
  }

  #[instrument(name = "store::upsert_payment", skip_all, fields(transaction_id = %payment.transaction_id))]
  async fn upsert_payment(&self, payment: NewPayment) -> Result<PaymentRecord, StoreError> {
    let sql = format!(
      "INSERT INTO payments (order_id, transaction_id, amount, phone_number, status, payment_method, \
       initiated_at, completed_at, metadata) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
       ON CONFLICT (transaction_id) DO UPDATE SET \
       order_id = EXCLUDED.order_id, \
       amount = EXCLUDED.amount, \
       phone_number = EXCLUDED.phone_number, \
       status = EXCLUDED.status, \
       payment_method = EXCLUDED.payment_method, \
       initiated_at = COALESCE(payments.initiated_at, EXCLUDED.initiated_at), \
       completed_at = COALESCE(EXCLUDED.completed_at, payments.completed_at), \
       metadata = EXCLUDED.metadata, \
       updated_at = NOW() \
       RETURNING {}",
      PAYMENT_COLUMNS
    );
    let row: PaymentRow = sqlx::query_as(&sql)
      .bind(payment.order_id)
      .bind(&payment.transaction_id)
      .bind(payment.amount)
      .bind(&payment.phone_number)
      .bind(payment.status)
      .bind(&payment.payment_method)
      .bind(payment.initiated_at)
      .bind(payment.completed_at)
      .bind(Json(&payment.metadata))
      .fetch_one(&self.pool)
      .await?;
    Ok(row.into())
  }

  async fn payments_for_order(&self, id: OrderId) -> Result<Vec<PaymentRecord>, StoreError> {
    let sql = format!("SELECT {} FROM payments WHERE order_id = $1 ORDER BY id", PAYMENT_COLUMNS);
    let rows: Vec<PaymentRow> = sqlx::query_as(&sql).bind(id).fetch_all(&self.pool).await?;
    Ok(rows.into_iter().map(PaymentRecord::from).collect())
  }
}
