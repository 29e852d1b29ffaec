//! In-process wallet ledger.

use super::{
    WalletLedger,
    errors::{WalletError, WalletResult},
    models::{EntryDirection, WalletEntry},
};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::Mutex;

#[derive(Default)]
struct Ledger {
    balances: HashMap<String, i64>,
    entries: Vec<WalletEntry>,
}

/// Wallet ledger kept in memory. Unknown users start at a zero balance.
#[derive(Default)]
pub struct InMemoryWallet {
    ledger: Mutex<Ledger>,
}

impl InMemoryWallet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a user's starting balance without recording an entry
    pub async fn set_balance(&self, user_id: &str, balance: i64) {
        self.ledger
            .lock()
            .await
            .balances
            .insert(user_id.to_string(), balance);
    }

    /// All entries recorded for a user, oldest first
    pub async fn entries(&self, user_id: &str) -> Vec<WalletEntry> {
        self.ledger
            .lock()
            .await
            .entries
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect()
    }

    async fn apply(
        &self,
        user_id: &str,
        amount: i64,
        direction: EntryDirection,
        description: &str,
        idempotency_key: &str,
    ) -> WalletResult<i64> {
        if amount <= 0 {
            return Err(WalletError::InvalidAmount(amount));
        }

        let mut ledger = self.ledger.lock().await;

        if ledger
            .entries
            .iter()
            .any(|e| e.idempotency_key == idempotency_key)
        {
            return Err(WalletError::DuplicateTransaction(idempotency_key.to_string()));
        }

        let current = ledger.balances.get(user_id).copied().unwrap_or(0);
        let (signed, new_balance) = match direction {
            EntryDirection::Credit => (
                amount,
                current
                    .checked_add(amount)
                    .ok_or(WalletError::BalanceOverflow)?,
            ),
            EntryDirection::Debit => {
                if current < amount {
                    return Err(WalletError::InsufficientBalance {
                        available: current,
                        required: amount,
                    });
                }
                (-amount, current - amount)
            }
        };

        ledger.balances.insert(user_id.to_string(), new_balance);
        ledger.entries.push(WalletEntry {
            user_id: user_id.to_string(),
            amount: signed,
            balance_after: new_balance,
            direction,
            idempotency_key: idempotency_key.to_string(),
            description: description.to_string(),
            created_at: Utc::now(),
        });

        Ok(new_balance)
    }
}

#[async_trait]
impl WalletLedger for InMemoryWallet {
    async fn balance(&self, user_id: &str) -> WalletResult<i64> {
        Ok(self
            .ledger
            .lock()
            .await
            .balances
            .get(user_id)
            .copied()
            .unwrap_or(0))
    }

    async fn credit(
        &self,
        user_id: &str,
        amount: i64,
        description: &str,
        idempotency_key: &str,
    ) -> WalletResult<i64> {
        self.apply(
            user_id,
            amount,
            EntryDirection::Credit,
            description,
            idempotency_key,
        )
        .await
    }

    async fn debit(
        &self,
        user_id: &str,
        amount: i64,
        description: &str,
        idempotency_key: &str,
    ) -> WalletResult<i64> {
        self.apply(
            user_id,
            amount,
            EntryDirection::Debit,
            description,
            idempotency_key,
        )
        .await
    }
}
