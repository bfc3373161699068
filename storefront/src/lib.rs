// duka-storefront/src/lib.rs

//! Storefront checkout and M-Pesa payment reconciliation service.
//!
//! Checkout creates a `pending` order, asks M-Pesa to push a payment prompt to
//! the customer's phone and returns. The provider later calls the webhook,
//! which moves the order to `paid` or `payment_failed` and records the payment.

pub mod config;
pub mod db;
pub mod errors;
pub mod models;
pub mod pipelines;
pub mod services;
pub mod state;
pub mod web;
