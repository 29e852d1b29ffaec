//! PostgreSQL wallet ledger.
#![allow(clippy::needless_raw_string_hashes)]

use super::{
    WalletLedger,
    errors::{WalletError, WalletResult},
    models::{EntryDirection, Wallet},
};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Row, Transaction};
use std::sync::Arc;

/// Wallet manager
#[derive(Clone)]
pub struct WalletManager {
    pool: Arc<PgPool>,
}

impl WalletManager {
    /// Create a new wallet manager
    ///
    /// # Arguments
    ///
    /// * `pool` - Database connection pool
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Get wallet for a user
    pub async fn get_wallet(&self, user_id: &str) -> WalletResult<Wallet> {
        let row = sqlx::query(
            r#"
            SELECT user_id, balance, updated_at
            FROM wallets
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(self.pool.as_ref())
        .await?
        .ok_or_else(|| WalletError::WalletNotFound(user_id.to_string()))?;

        Ok(Wallet {
            user_id: row.get("user_id"),
            balance: row.get("balance"),
            updated_at: row.get::<chrono::NaiveDateTime, _>("updated_at").and_utc(),
        })
    }

    /// Reject a reused idempotency key inside the transaction
    async fn check_idempotency(
        tx: &mut Transaction<'_, Postgres>,
        idempotency_key: &str,
    ) -> WalletResult<()> {
        let existing = sqlx::query("SELECT id FROM wallet_entries WHERE idempotency_key = $1")
            .bind(idempotency_key)
            .fetch_optional(&mut **tx)
            .await?;

        if existing.is_some() {
            return Err(WalletError::DuplicateTransaction(idempotency_key.to_string()));
        }
        Ok(())
    }

    /// Create a ledger entry
    async fn create_entry(
        tx: &mut Transaction<'_, Postgres>,
        user_id: &str,
        amount: i64,
        balance_after: i64,
        direction: EntryDirection,
        idempotency_key: &str,
        description: &str,
    ) -> WalletResult<i64> {
        let row = sqlx::query(
            r#"
            INSERT INTO wallet_entries (user_id, amount, balance_after, direction, idempotency_key, description)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(amount)
        .bind(balance_after)
        .bind(direction.to_string())
        .bind(idempotency_key)
        .bind(description)
        .fetch_one(&mut **tx)
        .await?;

        Ok(row.get("id"))
    }
}

#[async_trait]
impl WalletLedger for WalletManager {
    async fn balance(&self, user_id: &str) -> WalletResult<i64> {
        match self.get_wallet(user_id).await {
            Ok(wallet) => Ok(wallet.balance),
            Err(WalletError::WalletNotFound(_)) => Ok(0),
            Err(e) => Err(e),
        }
    }

    async fn credit(
        &self,
        user_id: &str,
        amount: i64,
        description: &str,
        idempotency_key: &str,
    ) -> WalletResult<i64> {
        if amount <= 0 {
            return Err(WalletError::InvalidAmount(amount));
        }

        let mut tx = self.pool.begin().await?;
        Self::check_idempotency(&mut tx, idempotency_key).await?;

        // Credits open the wallet on first use, as the in-memory ledger does
        sqlx::query("INSERT INTO wallets (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let current = sqlx::query("SELECT balance FROM wallets WHERE user_id = $1 FOR UPDATE")
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await?;

        let new_balance = current
            .get::<i64, _>("balance")
            .checked_add(amount)
            .ok_or(WalletError::BalanceOverflow)?;

        sqlx::query("UPDATE wallets SET balance = $1, updated_at = NOW() WHERE user_id = $2")
            .bind(new_balance)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        Self::create_entry(
            &mut tx,
            user_id,
            amount,
            new_balance,
            EntryDirection::Credit,
            idempotency_key,
            description,
        )
        .await?;

        tx.commit().await?;

        Ok(new_balance)
    }

    async fn debit(
        &self,
        user_id: &str,
        amount: i64,
        description: &str,
        idempotency_key: &str,
    ) -> WalletResult<i64> {
        if amount <= 0 {
            return Err(WalletError::InvalidAmount(amount));
        }

        let mut tx = self.pool.begin().await?;
        Self::check_idempotency(&mut tx, idempotency_key).await?;

        // Check and update in one statement so concurrent debits cannot overdraw
        let debited = sqlx::query(
            "UPDATE wallets
             SET balance = balance - $1, updated_at = NOW()
             WHERE user_id = $2 AND balance >= $1
             RETURNING balance",
        )
        .bind(amount)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let new_balance: i64 = match debited {
            Some(row) => row.get("balance"),
            None => {
                let wallet = sqlx::query("SELECT balance FROM wallets WHERE user_id = $1")
                    .bind(user_id)
                    .fetch_optional(&mut *tx)
                    .await?;

                // A user without a wallet row has nothing to spend
                return Err(WalletError::InsufficientBalance {
                    available: wallet.map(|row| row.get("balance")).unwrap_or(0),
                    required: amount,
                });
            }
        };

        Self::create_entry(
            &mut tx,
            user_id,
            -amount,
            new_balance,
            EntryDirection::Debit,
            idempotency_key,
            description,
        )
        .await?;

        tx.commit().await?;

        Ok(new_balance)
    }
}
