//! flittpay server: per-user balance ledger with Flitt card payments.
//!
//! This crate provides the REST API, the signed provider client and the
//! callback reconciler that credits approved payments to user balances.

pub mod config;
pub mod db;
pub mod error;
pub mod flow;
pub mod gateway;
pub mod ledger;
pub mod models;
pub mod reconcile;
pub mod routes;
pub mod state;

pub use config::Config;
pub use error::AppError;
pub use routes::create_router;
pub use state::AppState;
