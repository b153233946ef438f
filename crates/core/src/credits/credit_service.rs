//! Credit balance and ledger service.

use std::sync::Arc;

use async_trait::async_trait;
use log::debug;

use crate::errors::{Result, ValidationError};

use super::{CreditLedgerEntry, CreditReason, CreditRepositoryTrait};

#[async_trait]
pub trait CreditServiceTrait: Send + Sync {
    /// Current credit balance for the user.
    async fn get_balance(&self, user_id: &str) -> Result<i64>;

    /// Grant credits to the user. Rejects non-positive amounts; the grant
    /// itself is atomic at the store level.
    async fn add_credits(
        &self,
        user_id: &str,
        amount: i64,
        reason: CreditReason,
        reference_id: Option<String>,
    ) -> Result<i64>;

    /// The user's ledger entries, newest first.
    async fn get_ledger(&self, user_id: &str) -> Result<Vec<CreditLedgerEntry>>;
}

pub struct CreditService {
    credit_repository: Arc<dyn CreditRepositoryTrait>,
}

impl CreditService {
    pub fn new(credit_repository: Arc<dyn CreditRepositoryTrait>) -> Self {
        Self { credit_repository }
    }
}

#[async_trait]
impl CreditServiceTrait for CreditService {
    async fn get_balance(&self, user_id: &str) -> Result<i64> {
        self.credit_repository.get_balance(user_id).await
    }

    async fn add_credits(
        &self,
        user_id: &str,
        amount: i64,
        reason: CreditReason,
        reference_id: Option<String>,
    ) -> Result<i64> {
        if amount <= 0 {
            return Err(ValidationError::NonPositiveCreditAmount(amount).into());
        }
        debug!(
            "Granting {} credits to user '{}' ({:?})",
            amount, user_id, reason
        );
        self.credit_repository
            .add_credits(user_id, amount, reason, reference_id)
            .await
    }

    async fn get_ledger(&self, user_id: &str) -> Result<Vec<CreditLedgerEntry>> {
        self.credit_repository.list_entries(user_id).await
    }
}
