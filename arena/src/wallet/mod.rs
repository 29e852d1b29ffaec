//! Wallet collaborator used by events for entry fees, refunds and prizes.
//!
//! Events never own money semantics. They call a [`WalletLedger`], which
//! provides:
//! - Credits and debits against a user's credit balance
//! - Idempotency keys to prevent duplicate transactions
//! - A ledger entry for every balance change
//!
//! Two implementations ship with the crate: [`WalletManager`] on PostgreSQL
//! and [`InMemoryWallet`] for tests and single-process deployments.
//!
//! ## Example
//!
//! ```no_run
//! use arena::wallet::{WalletLedger, WalletManager};
//! use arena::db::Database;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::new(&Default::default()).await?;
//!     let wallet = WalletManager::new(Arc::new(db.pool().clone()));
//!
//!     let balance = wallet
//!         .credit("user-1", 500, "Prize - Spring Cup", "prize:evt-1:user-1")
//!         .await?;
//!     println!("New balance: {}", balance);
//!
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod manager;
pub mod memory;
pub mod models;

use async_trait::async_trait;

pub use errors::{WalletError, WalletResult};
pub use manager::WalletManager;
pub use memory::InMemoryWallet;
pub use models::{EntryDirection, Wallet, WalletEntry};

/// Credit/debit collaborator.
///
/// A user who has never been seen has a balance of 0. Crediting such a user
/// opens their wallet; debiting them fails with `InsufficientBalance`.
#[async_trait]
pub trait WalletLedger: Send + Sync {
    /// Current balance of a user, 0 for unknown users
    async fn balance(&self, user_id: &str) -> WalletResult<i64>;

    /// Add `amount` to a user's balance, returning the new balance
    ///
    /// # Errors
    ///
    /// * `WalletError::DuplicateTransaction` - `idempotency_key` was already applied
    async fn credit(
        &self,
        user_id: &str,
        amount: i64,
        description: &str,
        idempotency_key: &str,
    ) -> WalletResult<i64>;

    /// Remove `amount` from a user's balance, returning the new balance
    ///
    /// # Errors
    ///
    /// * `WalletError::InsufficientBalance` - Not enough credits
    async fn debit(
        &self,
        user_id: &str,
        amount: i64,
        description: &str,
        idempotency_key: &str,
    ) -> WalletResult<i64>;
}
