//! Balance ledger: the only owner of balance mutations.
//!
//! Every mutation is a single atomic storage operation so concurrent credits
//! for the same user can never lose an update or create a second record.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use bigdecimal::BigDecimal;

use crate::models::BalanceRecord;

pub use memory::InMemoryLedger;
pub use postgres::PgLedger;

/// Errors returned by ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("no balance record for user {0}")]
    NotFound(String),

    #[error("insufficient funds for user {user_id}")]
    InsufficientFunds { user_id: String },

    #[error("ledger storage failure: {0}")]
    Storage(String),
}

impl From<sqlx::Error> for LedgerError {
    fn from(e: sqlx::Error) -> Self {
        LedgerError::Storage(e.to_string())
    }
}

/// Minimal balance store interface used by handlers and the reconciler.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Adds `amount` to the user's balance, creating the record if missing.
    async fn credit(&self, user_id: &str, amount: &BigDecimal)
        -> Result<BalanceRecord, LedgerError>;

    /// Subtracts `amount` if the balance covers it.
    ///
    /// Fails with `NotFound` when the user has no record and with
    /// `InsufficientFunds` when `amount` exceeds the balance.
    async fn withdraw(
        &self,
        user_id: &str,
        amount: &BigDecimal,
    ) -> Result<BalanceRecord, LedgerError>;

    /// Returns the user's record, if any.
    async fn balance(&self, user_id: &str) -> Result<Option<BalanceRecord>, LedgerError>;
}
