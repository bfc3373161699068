// tests/postgres_store_tests.rs
//
// Runs against the database named by DATABASE_URL and returns early when it is
// unset, so `cargo test` stays green on machines without Postgres.

mod common;

use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::json;
use std::env;
use std::sync::Arc;

use common::{new_order, setup_tracing, TEST_PHONE};
use duka_storefront::db::{OrderStore, PgOrderStore};
use duka_storefront::models::{NewPayment, OrderId, OrderStatus, PaymentStatus};

async fn store() -> Option<PgOrderStore> {
  setup_tracing();
  let url = env::var("DATABASE_URL").ok().filter(|v| !v.trim().is_empty())?;
  Some(PgOrderStore::connect(&url).await.expect("DATABASE_URL is set but unreachable"))
}

fn unique_tx(prefix: &str) -> String {
  format!("{}-{}", prefix, Utc::now().timestamp_nanos_opt().unwrap_or_default())
}

fn payment(order_id: OrderId, tx: &str, status: PaymentStatus) -> NewPayment {
  NewPayment {
    order_id,
    transaction_id: tx.to_string(),
    amount: Decimal::new(1000, 0),
    phone_number: TEST_PHONE.to_string(),
    status,
    payment_method: "M-Pesa".to_string(),
    initiated_at: None,
    completed_at: None,
    metadata: json!({ "tracking_id": tx }),
  }
}

#[tokio::test]
async fn upsert_on_conflict_keeps_one_row_and_first_initiated_at() {
  let Some(store) = store().await else {
    eprintln!("DATABASE_URL not set; skipping Postgres store test");
    return;
  };
  let order = store.create_order(new_order(1000)).await.unwrap();
  let tx = unique_tx("PGTX");

  let mut failed = payment(order.id, &tx, PaymentStatus::Failed);
  failed.initiated_at = Some(Utc::now());
  let first = store.upsert_payment(failed).await.unwrap();

  let mut completed = payment(order.id, &tx, PaymentStatus::Completed);
  completed.completed_at = Some(Utc::now());
  let second = store.upsert_payment(completed).await.unwrap();

  assert_eq!(first.id, second.id);
  assert_eq!(second.status, PaymentStatus::Completed);
  assert_eq!(second.initiated_at, first.initiated_at);
  assert!(second.completed_at.is_some());
  assert_eq!(store.payments_for_order(order.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn concurrent_upserts_for_one_transaction_leave_one_row() {
  let Some(store) = store().await else {
    eprintln!("DATABASE_URL not set; skipping Postgres store test");
    return;
  };
  let store = Arc::new(store);
  let order = store.create_order(new_order(1000)).await.unwrap();
  let tx = unique_tx("PGRACE");

  let mut tasks = Vec::new();
  for _ in 0..8 {
    let store = store.clone();
    let tx = tx.clone();
    tasks.push(tokio::spawn(async move {
      store.upsert_payment(payment(order.id, &tx, PaymentStatus::Completed)).await
    }));
  }
  for task in tasks {
    task.await.unwrap().unwrap();
  }

  let payments = store.payments_for_order(order.id).await.unwrap();
  assert_eq!(payments.len(), 1);
  assert_eq!(payments[0].transaction_id, tx);
}

#[tokio::test]
async fn status_update_of_missing_order_is_not_found() {
  let Some(store) = store().await else {
    eprintln!("DATABASE_URL not set; skipping Postgres store test");
    return;
  };
  let order = store.create_order(new_order(1000)).await.unwrap();
  assert_eq!(order.status, OrderStatus::Pending);

  let updated = store.update_order_status(order.id, OrderStatus::Paid).await.unwrap();
  assert_eq!(updated.status, OrderStatus::Paid);

  let err = store.update_order_status(i64::MAX, OrderStatus::Paid).await.unwrap_err();
  assert!(err.is_not_found());
}
