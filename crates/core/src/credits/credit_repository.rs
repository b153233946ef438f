//! Repository contract for the credit ledger.

use async_trait::async_trait;

use crate::errors::Result;

use super::{CreditLedgerEntry, CreditReason};

#[async_trait]
pub trait CreditRepositoryTrait: Send + Sync {
    /// Current balance aggregate for the user; zero when no row exists.
    async fn get_balance(&self, user_id: &str) -> Result<i64>;

    /// Append a ledger entry and update the balance aggregate in one
    /// transaction. Returns the new balance.
    async fn add_credits(
        &self,
        user_id: &str,
        amount: i64,
        reason: CreditReason,
        reference_id: Option<String>,
    ) -> Result<i64>;

    /// The user's ledger entries, newest first.
    async fn list_entries(&self, user_id: &str) -> Result<Vec<CreditLedgerEntry>>;
}
