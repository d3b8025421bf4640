//! Balance record model, one row per user.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Represents the running balance of one user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct BalanceRecord {
    /// Unique identifier for this record.
    pub id: Uuid,
    /// External user identifier (unique).
    pub user_id: String,
    /// Current balance in major currency units.
    pub amount: BigDecimal,
    /// When this record was created (first credit).
    pub created_at: DateTime<Utc>,
    /// When the balance last changed.
    pub updated_at: DateTime<Utc>,
}

impl BalanceRecord {
    /// Creates a fresh record holding `amount`.
    pub fn new(user_id: impl Into<String>, amount: BigDecimal) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            amount,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns true if the balance covers the given amount.
    pub fn has_sufficient_balance(&self, amount: &BigDecimal) -> bool {
        &self.amount >= amount
    }
}
