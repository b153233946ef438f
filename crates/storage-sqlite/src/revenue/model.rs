//! Database models for the revenue tables.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use cardmint_core::errors::Result;
use cardmint_core::revenue::{RevenueRequest, SaleRecord, SaleSource};

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
#[diesel(table_name = crate::schema::asset_sales)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AssetSaleDB {
    pub id: String,
    pub seller_id: String,
    pub buyer_id: Option<String>,
    pub asset_id: Option<String>,
    pub purchase_amount_cents: i64,
    pub revenue_status: String,
    pub revenue_request_id: Option<String>,
    pub created_at: String,
}

impl AssetSaleDB {
    pub fn into_domain(self) -> Result<SaleRecord> {
        Ok(SaleRecord {
            revenue_status: enum_from_db(&self.revenue_status)?,
            created_at: parse_timestamp(&self.created_at)?,
            id: self.id,
            seller_id: self.seller_id,
            buyer_id: self.buyer_id,
            asset_id: self.asset_id,
            purchase_amount_cents: self.purchase_amount_cents,
            revenue_request_id: self.revenue_request_id,
            source: SaleSource::AssetSales,
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
#[diesel(table_name = crate::schema::revenue_history)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct RevenueHistoryDB {
    pub id: String,
    pub seller_id: String,
    pub buyer_id: Option<String>,
    pub asset_id: Option<String>,
    pub purchase_amount_cents: i64,
    pub revenue_status: String,
    pub revenue_request_id: Option<String>,
    pub created_at: String,
}

impl RevenueHistoryDB {
    pub fn into_domain(self) -> Result<SaleRecord> {
        Ok(SaleRecord {
            revenue_status: enum_from_db(&self.revenue_status)?,
            created_at: parse_timestamp(&self.created_at)?,
            id: self.id,
            seller_id: self.seller_id,
            buyer_id: self.buyer_id,
            asset_id: self.asset_id,
            purchase_amount_cents: self.purchase_amount_cents,
            revenue_request_id: self.revenue_request_id,
            source: SaleSource::RevenueHistory,
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
#[diesel(table_name = crate::schema::revenue_requests)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct RevenueRequestDB {
    pub id: String,
    pub user_id: String,
    pub amount_cents: i64,
    pub request_type: String,
    pub status: String,
    pub metadata: String,
    pub created_at: String,
}

impl RevenueRequestDB {
    pub fn into_domain(self) -> Result<RevenueRequest> {
        Ok(RevenueRequest {
            request_type: enum_from_db(&self.request_type)?,
            status: enum_from_db(&self.status)?,
            metadata: serde_json::from_str(&self.metadata)?,
            created_at: parse_timestamp(&self.created_at)?,
            id: self.id,
            user_id: self.user_id,
            amount_cents: self.amount_cents,
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
#[diesel(primary_key(sale_id))]
#[diesel(table_name = crate::schema::revenue_tracking)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct RevenueTrackingDB {
    pub sale_id: String,
    pub source: String,
    pub seller_id: String,
    pub revenue_request_id: String,
    pub revenue_status: String,
    pub updated_at: String,
}
