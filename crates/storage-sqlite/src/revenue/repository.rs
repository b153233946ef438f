//! Repository for sale records, revenue requests, and the workflow commits.
//!
//! The conversion and payout commits run as single write-actor jobs, so the
//! request insert, sale-record transitions, tracking upserts, and (for
//! conversions) the credit grant all land in one transaction.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::SqliteConnection;
use uuid::Uuid;

use cardmint_core::credits::CreditReason;
use cardmint_core::errors::Result;
use cardmint_core::revenue::{
    ConversionReceipt, NewRevenueRequest, NewSaleRecord, PayoutReceipt, RequestStatus, RequestType,
    RevenueRepositoryTrait, RevenueRequest, RevenueStatus, SaleRecord, SaleSource,
};

use crate::credits::grant_credits_tx;
use crate::db::{enum_to_db, run_read, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::{asset_sales, revenue_history, revenue_requests, revenue_tracking};

use super::model::{AssetSaleDB, RevenueHistoryDB, RevenueRequestDB, RevenueTrackingDB};

fn insert_request_tx(
    conn: &mut SqliteConnection,
    new_request: &NewRevenueRequest,
    request_id: &str,
    now: &str,
) -> Result<()> {
    let row = RevenueRequestDB {
        id: request_id.to_string(),
        user_id: new_request.user_id.clone(),
        amount_cents: new_request.amount_cents,
        request_type: enum_to_db(&new_request.request_type)?,
        status: enum_to_db(&new_request.status)?,
        metadata: serde_json::to_string(&new_request.metadata)?,
        created_at: now.to_string(),
    };
    diesel::insert_into(revenue_requests::table)
        .values(&row)
        .execute(conn)
        .map_err(StorageError::from)?;
    Ok(())
}

/// Transition up to `limit` (all when `None`) of the seller's `Available`
/// asset sales to `new_status`, oldest first. Returns the affected ids.
fn take_available_asset_sales_tx(
    conn: &mut SqliteConnection,
    seller_id: &str,
    request_id: &str,
    new_status: RevenueStatus,
    limit: Option<i64>,
) -> Result<Vec<String>> {
    let mut query = asset_sales::table
        .filter(asset_sales::seller_id.eq(seller_id))
        .filter(asset_sales::revenue_status.eq(enum_to_db(&RevenueStatus::Available)?))
        .order(asset_sales::created_at.asc())
        .select(asset_sales::id)
        .into_boxed();
    if let Some(limit) = limit {
        query = query.limit(limit);
    }
    let ids = query.load::<String>(conn).map_err(StorageError::from)?;

    if !ids.is_empty() {
        diesel::update(asset_sales::table.filter(asset_sales::id.eq_any(&ids)))
            .set((
                asset_sales::revenue_status.eq(enum_to_db(&new_status)?),
                asset_sales::revenue_request_id.eq(Some(request_id.to_string())),
            ))
            .execute(conn)
            .map_err(StorageError::from)?;
    }
    Ok(ids)
}

/// Same as [`take_available_asset_sales_tx`], for the history table.
fn take_available_history_sales_tx(
    conn: &mut SqliteConnection,
    seller_id: &str,
    request_id: &str,
    new_status: RevenueStatus,
    limit: Option<i64>,
) -> Result<Vec<String>> {
    let mut query = revenue_history::table
        .filter(revenue_history::seller_id.eq(seller_id))
        .filter(revenue_history::revenue_status.eq(enum_to_db(&RevenueStatus::Available)?))
        .order(revenue_history::created_at.asc())
        .select(revenue_history::id)
        .into_boxed();
    if let Some(limit) = limit {
        query = query.limit(limit);
    }
    let ids = query.load::<String>(conn).map_err(StorageError::from)?;

    if !ids.is_empty() {
        diesel::update(revenue_history::table.filter(revenue_history::id.eq_any(&ids)))
            .set((
                revenue_history::revenue_status.eq(enum_to_db(&new_status)?),
                revenue_history::revenue_request_id.eq(Some(request_id.to_string())),
            ))
            .execute(conn)
            .map_err(StorageError::from)?;
    }
    Ok(ids)
}

/// Upsert one audit tracking row per transitioned sale.
fn upsert_tracking_rows_tx(
    conn: &mut SqliteConnection,
    sale_ids: &[String],
    source: SaleSource,
    seller_id: &str,
    request_id: &str,
    new_status: RevenueStatus,
    now: &str,
) -> Result<()> {
    for sale_id in sale_ids {
        let row = RevenueTrackingDB {
            sale_id: sale_id.clone(),
            source: enum_to_db(&source)?,
            seller_id: seller_id.to_string(),
            revenue_request_id: request_id.to_string(),
            revenue_status: enum_to_db(&new_status)?,
            updated_at: now.to_string(),
        };
        diesel::insert_into(revenue_tracking::table)
            .values(&row)
            .on_conflict(revenue_tracking::sale_id)
            .do_update()
            .set(&row)
            .execute(conn)
            .map_err(StorageError::from)?;
    }
    Ok(())
}

pub struct RevenueRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl RevenueRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl RevenueRepositoryTrait for RevenueRepository {
    async fn count_sales(
        &self,
        seller_id: &str,
        source: SaleSource,
        status: Option<RevenueStatus>,
    ) -> Result<i64> {
        let seller = seller_id.to_string();
        run_read(&self.pool, move |conn| {
            let status_db = status.map(|s| enum_to_db(&s)).transpose()?;
            let count = match source {
                SaleSource::AssetSales => {
                    let mut query = asset_sales::table
                        .filter(asset_sales::seller_id.eq(&seller))
                        .into_boxed();
                    if let Some(status_db) = &status_db {
                        query = query.filter(asset_sales::revenue_status.eq(status_db.clone()));
                    }
                    query
                        .count()
                        .get_result::<i64>(conn)
                        .map_err(StorageError::from)?
                }
                SaleSource::RevenueHistory => {
                    let mut query = revenue_history::table
                        .filter(revenue_history::seller_id.eq(&seller))
                        .into_boxed();
                    if let Some(status_db) = &status_db {
                        query =
                            query.filter(revenue_history::revenue_status.eq(status_db.clone()));
                    }
                    query
                        .count()
                        .get_result::<i64>(conn)
                        .map_err(StorageError::from)?
                }
            };
            Ok(count)
        })
        .await
    }

    async fn list_sales(&self, seller_id: &str) -> Result<Vec<SaleRecord>> {
        let seller = seller_id.to_string();
        run_read(&self.pool, move |conn| {
            let asset_rows = asset_sales::table
                .filter(asset_sales::seller_id.eq(&seller))
                .load::<AssetSaleDB>(conn)
                .map_err(StorageError::from)?;
            let history_rows = revenue_history::table
                .filter(revenue_history::seller_id.eq(&seller))
                .load::<RevenueHistoryDB>(conn)
                .map_err(StorageError::from)?;

            let mut records = Vec::with_capacity(asset_rows.len() + history_rows.len());
            for row in asset_rows {
                records.push(row.into_domain()?);
            }
            for row in history_rows {
                records.push(row.into_domain()?);
            }
            records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(records)
        })
        .await
    }

    async fn insert_sale(&self, new_sale: NewSaleRecord) -> Result<SaleRecord> {
        self.writer
            .exec(move |conn| {
                let now = Utc::now().to_rfc3339();
                let id = Uuid::new_v4().to_string();
                let available = enum_to_db(&RevenueStatus::Available)?;
                match new_sale.source {
                    SaleSource::AssetSales => {
                        let row = AssetSaleDB {
                            id,
                            seller_id: new_sale.seller_id,
                            buyer_id: new_sale.buyer_id,
                            asset_id: new_sale.asset_id,
                            purchase_amount_cents: new_sale.purchase_amount_cents,
                            revenue_status: available,
                            revenue_request_id: None,
                            created_at: now,
                        };
                        let inserted = diesel::insert_into(asset_sales::table)
                            .values(&row)
                            .returning(AssetSaleDB::as_returning())
                            .get_result::<AssetSaleDB>(conn)
                            .map_err(StorageError::from)?;
                        inserted.into_domain()
                    }
                    SaleSource::RevenueHistory => {
                        let row = RevenueHistoryDB {
                            id,
                            seller_id: new_sale.seller_id,
                            buyer_id: new_sale.buyer_id,
                            asset_id: new_sale.asset_id,
                            purchase_amount_cents: new_sale.purchase_amount_cents,
                            revenue_status: available,
                            revenue_request_id: None,
                            created_at: now,
                        };
                        let inserted = diesel::insert_into(revenue_history::table)
                            .values(&row)
                            .returning(RevenueHistoryDB::as_returning())
                            .get_result::<RevenueHistoryDB>(conn)
                            .map_err(StorageError::from)?;
                        inserted.into_domain()
                    }
                }
            })
            .await
    }

    async fn list_requests(&self, user_id: &str) -> Result<Vec<RevenueRequest>> {
        let user = user_id.to_string();
        run_read(&self.pool, move |conn| {
            let rows = revenue_requests::table
                .filter(revenue_requests::user_id.eq(&user))
                .order(revenue_requests::created_at.desc())
                .load::<RevenueRequestDB>(conn)
                .map_err(StorageError::from)?;
            rows.into_iter().map(RevenueRequestDB::into_domain).collect()
        })
        .await
    }

    async fn sum_pending_payout_requests(&self, user_id: &str) -> Result<i64> {
        let user = user_id.to_string();
        run_read(&self.pool, move |conn| {
            let total = revenue_requests::table
                .filter(revenue_requests::user_id.eq(&user))
                .filter(revenue_requests::request_type.eq(enum_to_db(&RequestType::StripePayment)?))
                .filter(revenue_requests::status.eq(enum_to_db(&RequestStatus::Pending)?))
                .select(diesel::dsl::sql::<
                    diesel::sql_types::Nullable<diesel::sql_types::BigInt>,
                >("SUM(amount_cents)"))
                .first::<Option<i64>>(conn)
                .map_err(StorageError::from)?;
            Ok(total.unwrap_or(0))
        })
        .await
    }

    async fn find_recent_completed_conversion(
        &self,
        user_id: &str,
        amount_cents: i64,
        since: DateTime<Utc>,
    ) -> Result<Option<RevenueRequest>> {
        let user = user_id.to_string();
        run_read(&self.pool, move |conn| {
            // RFC3339 UTC strings in a uniform format compare
            // chronologically as text.
            let cutoff = since.to_rfc3339();
            let row = revenue_requests::table
                .filter(revenue_requests::user_id.eq(&user))
                .filter(revenue_requests::amount_cents.eq(amount_cents))
                .filter(
                    revenue_requests::request_type
                        .eq(enum_to_db(&RequestType::RevenueConversion)?),
                )
                .filter(revenue_requests::status.eq(enum_to_db(&RequestStatus::Completed)?))
                .filter(revenue_requests::created_at.ge(cutoff))
                .order(revenue_requests::created_at.desc())
                .first::<RevenueRequestDB>(conn)
                .optional()
                .map_err(StorageError::from)?;
            row.map(RevenueRequestDB::into_domain).transpose()
        })
        .await
    }

    async fn convert_available_revenue(
        &self,
        new_request: NewRevenueRequest,
        credits: i64,
    ) -> Result<ConversionReceipt> {
        self.writer
            .exec(move |conn| {
                let now = Utc::now().to_rfc3339();
                let request_id = Uuid::new_v4().to_string();
                let seller_id = new_request.user_id.clone();

                let new_balance = grant_credits_tx(
                    conn,
                    &seller_id,
                    credits,
                    CreditReason::RevenueConversion,
                    Some(request_id.clone()),
                    &now,
                )?;
                insert_request_tx(conn, &new_request, &request_id, &now)?;

                let asset_ids = take_available_asset_sales_tx(
                    conn,
                    &seller_id,
                    &request_id,
                    RevenueStatus::Credited,
                    None,
                )?;
                let history_ids = take_available_history_sales_tx(
                    conn,
                    &seller_id,
                    &request_id,
                    RevenueStatus::Credited,
                    None,
                )?;
                upsert_tracking_rows_tx(
                    conn,
                    &asset_ids,
                    SaleSource::AssetSales,
                    &seller_id,
                    &request_id,
                    RevenueStatus::Credited,
                    &now,
                )?;
                upsert_tracking_rows_tx(
                    conn,
                    &history_ids,
                    SaleSource::RevenueHistory,
                    &seller_id,
                    &request_id,
                    RevenueStatus::Credited,
                    &now,
                )?;

                Ok(ConversionReceipt {
                    request_id,
                    sales_credited: (asset_ids.len() + history_ids.len()) as i64,
                    new_credit_balance: new_balance,
                })
            })
            .await
    }

    async fn reserve_sales_for_payout(
        &self,
        new_request: NewRevenueRequest,
        sales_needed: i64,
    ) -> Result<PayoutReceipt> {
        self.writer
            .exec(move |conn| {
                let now = Utc::now().to_rfc3339();
                let request_id = Uuid::new_v4().to_string();
                let seller_id = new_request.user_id.clone();

                insert_request_tx(conn, &new_request, &request_id, &now)?;

                // The cap applies jointly: take the oldest storefront sales
                // first, then fill the remainder from the history table.
                let asset_ids = take_available_asset_sales_tx(
                    conn,
                    &seller_id,
                    &request_id,
                    RevenueStatus::PaymentRequested,
                    Some(sales_needed),
                )?;
                let remaining = sales_needed - asset_ids.len() as i64;
                let history_ids = if remaining > 0 {
                    take_available_history_sales_tx(
                        conn,
                        &seller_id,
                        &request_id,
                        RevenueStatus::PaymentRequested,
                        Some(remaining),
                    )?
                } else {
                    Vec::new()
                };

                upsert_tracking_rows_tx(
                    conn,
                    &asset_ids,
                    SaleSource::AssetSales,
                    &seller_id,
                    &request_id,
                    RevenueStatus::PaymentRequested,
                    &now,
                )?;
                upsert_tracking_rows_tx(
                    conn,
                    &history_ids,
                    SaleSource::RevenueHistory,
                    &seller_id,
                    &request_id,
                    RevenueStatus::PaymentRequested,
                    &now,
                )?;

                Ok(PayoutReceipt {
                    request_id,
                    sales_reserved: (asset_ids.len() + history_ids.len()) as i64,
                })
            })
            .await
    }
}
