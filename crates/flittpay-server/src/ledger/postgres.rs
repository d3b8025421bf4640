//! PostgreSQL ledger backed by the `balances` table.

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use sqlx::PgPool;
use uuid::Uuid;

use super::{LedgerError, LedgerStore};
use crate::models::BalanceRecord;

/// Ledger stored in PostgreSQL.
#[derive(Clone)]
pub struct PgLedger {
    pool: PgPool,
}

impl PgLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LedgerStore for PgLedger {
    /// Upserts the balance atomically: insert on first credit, add otherwise.
    async fn credit(
        &self,
        user_id: &str,
        amount: &BigDecimal,
    ) -> Result<BalanceRecord, LedgerError> {
        let record: BalanceRecord = sqlx::query_as(
            r#"
            INSERT INTO balances (id, user_id, amount, created_at, updated_at)
            VALUES ($1, $2, $3, NOW(), NOW())
            ON CONFLICT (user_id)
            DO UPDATE SET amount = balances.amount + EXCLUDED.amount, updated_at = NOW()
            RETURNING id, user_id, amount, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(amount)
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    async fn withdraw(
        &self,
        user_id: &str,
        amount: &BigDecimal,
    ) -> Result<BalanceRecord, LedgerError> {
        // The balance check and the decrement happen in one statement.
        let updated: Option<BalanceRecord> = sqlx::query_as(
            r#"
            UPDATE balances
            SET amount = amount - $2, updated_at = NOW()
            WHERE user_id = $1 AND amount >= $2
            RETURNING id, user_id, amount, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(amount)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(record) => Ok(record),
            None => match self.balance(user_id).await? {
                Some(_) => Err(LedgerError::InsufficientFunds {
                    user_id: user_id.to_string(),
                }),
                None => Err(LedgerError::NotFound(user_id.to_string())),
            },
        }
    }

    async fn balance(&self, user_id: &str) -> Result<Option<BalanceRecord>, LedgerError> {
        let record: Option<BalanceRecord> = sqlx::query_as(
            r#"
            SELECT id, user_id, amount, created_at, updated_at
            FROM balances
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }
}
