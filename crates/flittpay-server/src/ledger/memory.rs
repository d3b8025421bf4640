//! In-memory ledger used when no database is configured, and in tests.

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{LedgerError, LedgerStore};
use crate::models::BalanceRecord;

/// A thread-safe in-memory balance store.
///
/// Each mutation runs entirely under the write lock, which makes
/// find-or-create-then-add a single atomic step.
#[derive(Default, Clone)]
pub struct InMemoryLedger {
    records: Arc<RwLock<HashMap<String, BalanceRecord>>>,
}

impl InMemoryLedger {
    /// Creates a new, empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct users holding a record.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedger {
    async fn credit(
        &self,
        user_id: &str,
        amount: &BigDecimal,
    ) -> Result<BalanceRecord, LedgerError> {
        let mut records = self.records.write().await;
        let record = records
            .entry(user_id.to_string())
            .and_modify(|r| {
                r.amount = &r.amount + amount;
                r.updated_at = Utc::now();
            })
            .or_insert_with(|| BalanceRecord::new(user_id, amount.clone()));
        Ok(record.clone())
    }

    async fn withdraw(
        &self,
        user_id: &str,
        amount: &BigDecimal,
    ) -> Result<BalanceRecord, LedgerError> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(user_id)
            .ok_or_else(|| LedgerError::NotFound(user_id.to_string()))?;

        if !record.has_sufficient_balance(amount) {
            return Err(LedgerError::InsufficientFunds {
                user_id: user_id.to_string(),
            });
        }

        record.amount = &record.amount - amount;
        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    async fn balance(&self, user_id: &str) -> Result<Option<BalanceRecord>, LedgerError> {
        let records = self.records.read().await;
        Ok(records.get(user_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    #[tokio::test]
    async fn test_topup_scenario() {
        let ledger = InMemoryLedger::new();

        let first = ledger.credit("u1", &dec("100")).await.unwrap();
        assert_eq!(first.user_id, "u1");
        assert_eq!(first.amount, dec("100"));

        let second = ledger.credit("u1", &dec("50")).await.unwrap();
        assert_eq!(second.amount, dec("150"));
        assert_eq!(second.id, first.id);
        assert_eq!(second.created_at, first.created_at);
        assert_eq!(ledger.len().await, 1);
    }

    #[tokio::test]
    async fn test_withdraw_within_balance() {
        let ledger = InMemoryLedger::new();
        ledger.credit("u1", &dec("100")).await.unwrap();

        let record = ledger.withdraw("u1", &dec("40.50")).await.unwrap();
        assert_eq!(record.amount, dec("59.50"));

        let record = ledger.withdraw("u1", &dec("59.50")).await.unwrap();
        assert_eq!(record.amount, dec("0"));
    }

    #[tokio::test]
    async fn test_withdraw_rejects_overdraft() {
        let ledger = InMemoryLedger::new();
        ledger.credit("u1", &dec("10")).await.unwrap();

        let result = ledger.withdraw("u1", &dec("10.01")).await;
        assert!(matches!(result, Err(LedgerError::InsufficientFunds { .. })));

        // Balance untouched
        let record = ledger.balance("u1").await.unwrap().unwrap();
        assert_eq!(record.amount, dec("10"));
    }

    #[tokio::test]
    async fn test_withdraw_unknown_user() {
        let ledger = InMemoryLedger::new();
        let result = ledger.withdraw("ghost", &dec("1")).await;
        assert!(matches!(result, Err(LedgerError::NotFound(_))));
        assert!(ledger.is_empty().await);
    }

    #[tokio::test]
    async fn test_balance_missing_user() {
        let ledger = InMemoryLedger::new();
        assert!(ledger.balance("nobody").await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_credits_create_one_record() {
        let ledger = InMemoryLedger::new();

        let handles: Vec<_> = (0..50)
            .map(|_| {
                let ledger = ledger.clone();
                tokio::spawn(async move { ledger.credit("racer", &dec("1.25")).await })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(ledger.len().await, 1);
        let record = ledger.balance("racer").await.unwrap().unwrap();
        assert_eq!(record.amount, dec("62.50"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_withdrawals_never_go_negative() {
        let ledger = InMemoryLedger::new();
        ledger.credit("u1", &dec("10")).await.unwrap();

        let handles: Vec<_> = (0..25)
            .map(|_| {
                let ledger = ledger.clone();
                tokio::spawn(async move { ledger.withdraw("u1", &dec("1")).await })
            })
            .collect();

        let mut succeeded = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                succeeded += 1;
            }
        }

        assert_eq!(succeeded, 10);
        let record = ledger.balance("u1").await.unwrap().unwrap();
        assert_eq!(record.amount, dec("0"));
    }
}
