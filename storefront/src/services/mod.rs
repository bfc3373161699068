// duka-storefront/src/services/mod.rs

pub mod mpesa;
pub mod session;
