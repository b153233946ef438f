//! Repository contract for the revenue store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::Result;

use super::{
    NewRevenueRequest, NewSaleRecord, RevenueRequest, RevenueStatus, SaleRecord, SaleSource,
};

/// Rows written by a successful conversion commit.
#[derive(Debug, Clone)]
pub struct ConversionReceipt {
    pub request_id: String,
    pub sales_credited: i64,
    pub new_credit_balance: i64,
}

/// Rows written by a successful payout reservation commit.
#[derive(Debug, Clone)]
pub struct PayoutReceipt {
    pub request_id: String,
    pub sales_reserved: i64,
}

#[async_trait]
pub trait RevenueRepositoryTrait: Send + Sync {
    /// Count of the seller's sale records in one source table, optionally
    /// filtered by status.
    async fn count_sales(
        &self,
        seller_id: &str,
        source: SaleSource,
        status: Option<RevenueStatus>,
    ) -> Result<i64>;

    /// The seller's sale records across both source tables, newest first.
    async fn list_sales(&self, seller_id: &str) -> Result<Vec<SaleRecord>>;

    /// Insert a new `Available` sale record into its source table.
    async fn insert_sale(&self, new_sale: NewSaleRecord) -> Result<SaleRecord>;

    /// The user's revenue requests, newest first.
    async fn list_requests(&self, user_id: &str) -> Result<Vec<RevenueRequest>>;

    /// Sum of the user's pending fiat payout request amounts, in cents.
    async fn sum_pending_payout_requests(&self, user_id: &str) -> Result<i64>;

    /// A completed conversion request for the same user and amount created
    /// at or after `since`, if any.
    async fn find_recent_completed_conversion(
        &self,
        user_id: &str,
        amount_cents: i64,
        since: DateTime<Utc>,
    ) -> Result<Option<RevenueRequest>>;

    /// Commit a conversion in a single transaction: grant `credits` to the
    /// seller, insert the completed request, transition every `Available`
    /// sale record of the seller (both source tables) to `Credited`, and
    /// upsert an audit tracking row per consumed sale.
    async fn convert_available_revenue(
        &self,
        new_request: NewRevenueRequest,
        credits: i64,
    ) -> Result<ConversionReceipt>;

    /// Commit a payout reservation in a single transaction: insert the
    /// pending request and transition up to `sales_needed` `Available` sale
    /// records, capped jointly across both source tables, to
    /// `PaymentRequested`.
    async fn reserve_sales_for_payout(
        &self,
        new_request: NewRevenueRequest,
        sales_needed: i64,
    ) -> Result<PayoutReceipt>;
}
