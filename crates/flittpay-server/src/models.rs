//! Data models for the balance ledger and provider orders.

pub mod balance;
pub mod payment_order;

pub use balance::BalanceRecord;
pub use payment_order::{minor_to_major, OrderStatus, PaymentOrder};
