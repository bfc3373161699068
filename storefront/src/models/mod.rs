// duka-storefront/src/models/mod.rs

//! Orders, payments and carts.

pub mod cart;
pub mod order;
pub mod order_item;
pub mod payment;

pub use cart::Cart;
pub use order::{NewOrder, Order, OrderId, OrderStatus, PaymentMethod, ShippingAddress};
pub use order_item::LineItem;
pub use payment::{NewPayment, PaymentRecord, PaymentStatus};
