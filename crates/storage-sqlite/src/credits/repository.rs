//! Repository for the credit ledger and balance aggregate.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::SqliteConnection;
use uuid::Uuid;

use cardmint_core::credits::{CreditLedgerEntry, CreditReason, CreditRepositoryTrait};
use cardmint_core::errors::Result;

use crate::db::{enum_to_db, run_read, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::{credit_balances, credit_ledger};

use super::model::{CreditBalanceDB, CreditLedgerDB};

/// Append a ledger entry and bump the balance aggregate inside the caller's
/// transaction. Returns the new balance. The revenue conversion commit
/// reuses this for its credit grant.
pub fn grant_credits_tx(
    conn: &mut SqliteConnection,
    user_id: &str,
    amount: i64,
    reason: CreditReason,
    reference_id: Option<String>,
    now: &str,
) -> Result<i64> {
    let entry = CreditLedgerDB {
        id: Uuid::now_v7().to_string(),
        user_id: user_id.to_string(),
        amount,
        reason: enum_to_db(&reason)?,
        reference_id,
        created_at: now.to_string(),
    };
    diesel::insert_into(credit_ledger::table)
        .values(&entry)
        .execute(conn)
        .map_err(StorageError::from)?;

    diesel::insert_into(credit_balances::table)
        .values(CreditBalanceDB {
            user_id: user_id.to_string(),
            balance: amount,
            updated_at: now.to_string(),
        })
        .on_conflict(credit_balances::user_id)
        .do_update()
        .set((
            credit_balances::balance.eq(credit_balances::balance + amount),
            credit_balances::updated_at.eq(now.to_string()),
        ))
        .execute(conn)
        .map_err(StorageError::from)?;

    let balance = credit_balances::table
        .find(user_id)
        .select(credit_balances::balance)
        .first::<i64>(conn)
        .map_err(StorageError::from)?;
    Ok(balance)
}

pub struct CreditRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl CreditRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl CreditRepositoryTrait for CreditRepository {
    async fn get_balance(&self, user_id: &str) -> Result<i64> {
        let user = user_id.to_string();
        run_read(&self.pool, move |conn| {
            let balance = credit_balances::table
                .find(&user)
                .select(credit_balances::balance)
                .first::<i64>(conn)
                .optional()
                .map_err(StorageError::from)?;
            Ok(balance.unwrap_or(0))
        })
        .await
    }

    async fn add_credits(
        &self,
        user_id: &str,
        amount: i64,
        reason: CreditReason,
        reference_id: Option<String>,
    ) -> Result<i64> {
        let user = user_id.to_string();
        self.writer
            .exec(move |conn| {
                let now = Utc::now().to_rfc3339();
                grant_credits_tx(conn, &user, amount, reason, reference_id, &now)
            })
            .await
    }

    async fn list_entries(&self, user_id: &str) -> Result<Vec<CreditLedgerEntry>> {
        let user = user_id.to_string();
        run_read(&self.pool, move |conn| {
            let rows = credit_ledger::table
                .filter(credit_ledger::user_id.eq(&user))
                .order(credit_ledger::created_at.desc())
                .load::<CreditLedgerDB>(conn)
                .map_err(StorageError::from)?;
            rows.into_iter().map(CreditLedgerDB::into_domain).collect()
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    use crate::db::{create_pool, init, run_migrations, spawn_writer};

    fn setup_repo() -> CreditRepository {
        let app_data = tempdir()
            .expect("tempdir")
            .keep()
            .to_string_lossy()
            .to_string();
        let db_path = init(&app_data).expect("init db");
        run_migrations(&db_path).expect("migrate db");
        let pool = create_pool(&db_path).expect("create pool");
        let writer = spawn_writer(pool.as_ref().clone());
        CreditRepository::new(pool, writer)
    }

    #[tokio::test]
    async fn balance_defaults_to_zero() {
        let repo = setup_repo();
        assert_eq!(repo.get_balance("user-absent").await.expect("balance"), 0);
    }

    #[tokio::test]
    async fn grants_accumulate_and_append_ledger_entries() {
        let repo = setup_repo();

        let balance = repo
            .add_credits("user-1", 2400, CreditReason::RevenueConversion, None)
            .await
            .expect("grant");
        assert_eq!(balance, 2400);

        let balance = repo
            .add_credits(
                "user-1",
                100,
                CreditReason::Adjustment,
                Some("support-ticket-9".to_string()),
            )
            .await
            .expect("grant");
        assert_eq!(balance, 2500);

        let entries = repo.list_entries("user-1").await.expect("entries");
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().any(|e| e.amount == 2400
            && e.reason == CreditReason::RevenueConversion));
        assert!(entries.iter().any(|e| e.amount == 100
            && e.reference_id.as_deref() == Some("support-ticket-9")));
    }

    #[tokio::test]
    async fn balances_are_tracked_per_user() {
        let repo = setup_repo();

        repo.add_credits("user-1", 400, CreditReason::Purchase, None)
            .await
            .expect("grant");
        repo.add_credits("user-2", 800, CreditReason::Purchase, None)
            .await
            .expect("grant");

        assert_eq!(repo.get_balance("user-1").await.expect("balance"), 400);
        assert_eq!(repo.get_balance("user-2").await.expect("balance"), 800);
    }
}
