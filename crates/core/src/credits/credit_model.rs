//! Credit ledger domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Why a credit ledger entry was appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditReason {
    RevenueConversion,
    Purchase,
    Adjustment,
}

/// One append-only credit ledger entry. The user's balance is an aggregate
/// row updated in the same transaction as the append.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditLedgerEntry {
    pub id: String,
    pub user_id: String,
    pub amount: i64,
    pub reason: CreditReason,
    pub reference_id: Option<String>,
    pub created_at: DateTime<Utc>,
}
