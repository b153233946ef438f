//! Database models for the credit tables.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use cardmint_core::credits::CreditLedgerEntry;
use cardmint_core::errors::Result;

use crate::db::{enum_from_db, parse_timestamp};

#[derive(
    Queryable,
    Identifiable,
    Insertable,
    AsChangeset,
    Selectable,
    Debug,
    Clone,
    Serialize,
    Deserialize,
)]
#[diesel(table_name = crate::schema::credit_ledger)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CreditLedgerDB {
    pub id: String,
    pub user_id: String,
    pub amount: i64,
    pub reason: String,
    pub reference_id: Option<String>,
    pub created_at: String,
}

impl CreditLedgerDB {
    pub fn into_domain(self) -> Result<CreditLedgerEntry> {
        Ok(CreditLedgerEntry {
            reason: enum_from_db(&self.reason)?,
            created_at: parse_timestamp(&self.created_at)?,
            id: self.id,
            user_id: self.user_id,
            amount: self.amount,
            reference_id: self.reference_id,
        })
    }
}

#[derive(
    Queryable,
    Identifiable,
    Insertable,
    AsChangeset,
    Selectable,
    Debug,
    Clone,
    Serialize,
    Deserialize,
)]
#[diesel(primary_key(user_id))]
#[diesel(table_name = crate::schema::credit_balances)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CreditBalanceDB {
    pub user_id: String,
    pub balance: i64,
    pub updated_at: String,
}
