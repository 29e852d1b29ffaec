//! Wallet data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Wallet model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wallet {
    pub user_id: String,
    pub balance: i64,
    pub updated_at: DateTime<Utc>,
}

/// Ledger entry recorded for every balance change
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletEntry {
    pub user_id: String,
    /// Signed amount: negative for debits
    pub amount: i64,
    pub balance_after: i64,
    pub direction: EntryDirection,
    pub idempotency_key: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// Entry direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryDirection {
    Debit,
    Credit,
}

impl std::fmt::Display for EntryDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryDirection::Debit => write!(f, "debit"),
            EntryDirection::Credit => write!(f, "credit"),
        }
    }
}
