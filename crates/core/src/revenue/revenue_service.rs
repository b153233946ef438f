//! Revenue aggregation and the conversion / payout workflows.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use log::{debug, info, warn};

use crate::errors::{Result, ValidationError};

use super::{
    credits_for_revenue, sales_needed_for_amount, ConversionOutcome, NewRevenueRequest,
    NewSaleRecord, PayoutContact, PayoutOutcome, RequestMetadata, RequestStatus, RequestType,
    RevenueRepositoryTrait, RevenueRequest, RevenueStatus, RevenueSummary, SaleRecord, SaleSource,
    DUPLICATE_CONVERSION_WINDOW_SECONDS, SELLER_SHARE_CENTS,
};

#[async_trait]
pub trait RevenueServiceTrait: Send + Sync {
    /// Aggregated totals for the seller. Pure read; a failed source-table
    /// fetch degrades that table's contribution to zero instead of failing
    /// the call.
    async fn get_revenue_summary(&self, seller_id: &str) -> Result<RevenueSummary>;

    /// Convert the seller's available revenue into platform credits.
    /// Grants credits, records the completed request, and transitions every
    /// `Available` sale record to `Credited` in one commit.
    async fn convert_revenue_to_credits(&self, seller_id: &str) -> Result<ConversionOutcome>;

    /// Reserve the seller's available revenue for a fiat payout. Records a
    /// pending request and transitions the needed sale records to
    /// `PaymentRequested` in one commit.
    async fn request_payout(
        &self,
        seller_id: &str,
        contact: PayoutContact,
    ) -> Result<PayoutOutcome>;

    /// Record a completed sale as an `Available` revenue claim.
    async fn record_sale(&self, new_sale: NewSaleRecord) -> Result<SaleRecord>;

    /// The seller's sale records across both source tables, newest first.
    async fn get_sales(&self, seller_id: &str) -> Result<Vec<SaleRecord>>;

    /// The seller's conversion and payout requests, newest first.
    async fn get_requests(&self, user_id: &str) -> Result<Vec<RevenueRequest>>;
}

pub struct RevenueService {
    revenue_repository: Arc<dyn RevenueRepositoryTrait>,
    in_flight: Mutex<HashSet<String>>,
}

impl RevenueService {
    pub fn new(revenue_repository: Arc<dyn RevenueRepositoryTrait>) -> Self {
        Self {
            revenue_repository,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Claim the seller's single-flight slot. One revenue workflow at a
    /// time per seller; the slot is released when the returned guard drops.
    fn begin_workflow(&self, seller_id: &str) -> Result<WorkflowSlot<'_>> {
        let mut slots = self.in_flight.lock().unwrap();
        if !slots.insert(seller_id.to_string()) {
            return Err(ValidationError::WorkflowInProgress(seller_id.to_string()).into());
        }
        Ok(WorkflowSlot {
            seller_id: seller_id.to_string(),
            slots: &self.in_flight,
        })
    }

    async fn count_or_zero(
        &self,
        seller_id: &str,
        source: SaleSource,
        status: Option<RevenueStatus>,
    ) -> i64 {
        match self
            .revenue_repository
            .count_sales(seller_id, source, status)
            .await
        {
            Ok(count) => count,
            Err(e) => {
                warn!(
                    "Failed to count {:?} sales for seller '{}': {}. Treating as zero.",
                    source, seller_id, e
                );
                0
            }
        }
    }
}

struct WorkflowSlot<'a> {
    seller_id: String,
    slots: &'a Mutex<HashSet<String>>,
}

impl Drop for WorkflowSlot<'_> {
    fn drop(&mut self) {
        if let Ok(mut slots) = self.slots.lock() {
            slots.remove(&self.seller_id);
        }
    }
}

#[async_trait]
impl RevenueServiceTrait for RevenueService {
    async fn get_revenue_summary(&self, seller_id: &str) -> Result<RevenueSummary> {
        debug!("Aggregating revenue for seller '{}'", seller_id);

        let (asset_total, history_total) = tokio::join!(
            self.count_or_zero(seller_id, SaleSource::AssetSales, None),
            self.count_or_zero(seller_id, SaleSource::RevenueHistory, None),
        );
        let (asset_available, history_available) = tokio::join!(
            self.count_or_zero(
                seller_id,
                SaleSource::AssetSales,
                Some(RevenueStatus::Available)
            ),
            self.count_or_zero(
                seller_id,
                SaleSource::RevenueHistory,
                Some(RevenueStatus::Available)
            ),
        );

        let requested_amount_cents = self
            .revenue_repository
            .sum_pending_payout_requests(seller_id)
            .await?;

        Ok(RevenueSummary {
            total_sales_count: asset_total + history_total,
            total_revenue_cents: (asset_available + history_available) * SELLER_SHARE_CENTS,
            requested_amount_cents,
        })
    }

    async fn convert_revenue_to_credits(&self, seller_id: &str) -> Result<ConversionOutcome> {
        let _slot = self.begin_workflow(seller_id)?;

        let summary = self.get_revenue_summary(seller_id).await?;
        if summary.total_revenue_cents <= 0 {
            return Err(ValidationError::NoRevenueAvailable.into());
        }
        let amount_cents = summary.total_revenue_cents;

        let window_start = Utc::now() - Duration::seconds(DUPLICATE_CONVERSION_WINDOW_SECONDS);
        if let Some(previous) = self
            .revenue_repository
            .find_recent_completed_conversion(seller_id, amount_cents, window_start)
            .await?
        {
            warn!(
                "Conversion of {} cents for seller '{}' matches request '{}' completed within the last {}s",
                amount_cents, seller_id, previous.id, DUPLICATE_CONVERSION_WINDOW_SECONDS
            );
            return Err(ValidationError::DuplicateConversion.into());
        }

        let credits = credits_for_revenue(amount_cents);
        if credits <= 0 {
            return Err(ValidationError::ZeroCredits.into());
        }

        let new_request = NewRevenueRequest {
            user_id: seller_id.to_string(),
            amount_cents,
            request_type: RequestType::RevenueConversion,
            status: RequestStatus::Completed,
            metadata: RequestMetadata::RevenueConversion {
                credits_added: credits,
            },
        };
        let receipt = self
            .revenue_repository
            .convert_available_revenue(new_request, credits)
            .await?;

        info!(
            "Converted {} cents into {} credits for seller '{}' ({} sales credited)",
            amount_cents, credits, seller_id, receipt.sales_credited
        );

        Ok(ConversionOutcome {
            request_id: receipt.request_id,
            amount_cents,
            credits_granted: credits,
            sales_credited: receipt.sales_credited,
            new_credit_balance: receipt.new_credit_balance,
        })
    }

    async fn request_payout(
        &self,
        seller_id: &str,
        contact: PayoutContact,
    ) -> Result<PayoutOutcome> {
        let _slot = self.begin_workflow(seller_id)?;

        contact.validate()?;

        let summary = self.get_revenue_summary(seller_id).await?;
        if summary.total_revenue_cents <= 0 {
            return Err(ValidationError::NoRevenueAvailable.into());
        }
        let amount_cents = summary.total_revenue_cents;
        let sales_needed = sales_needed_for_amount(amount_cents);

        let new_request = NewRevenueRequest {
            user_id: seller_id.to_string(),
            amount_cents,
            request_type: RequestType::StripePayment,
            status: RequestStatus::Pending,
            metadata: RequestMetadata::StripePayment { contact },
        };
        let receipt = self
            .revenue_repository
            .reserve_sales_for_payout(new_request, sales_needed)
            .await?;

        info!(
            "Reserved {} of {} sale records for payout request '{}' ({} cents) by seller '{}'",
            receipt.sales_reserved, sales_needed, receipt.request_id, amount_cents, seller_id
        );

        Ok(PayoutOutcome {
            request_id: receipt.request_id,
            amount_cents,
            sales_reserved: receipt.sales_reserved,
        })
    }

    async fn record_sale(&self, new_sale: NewSaleRecord) -> Result<SaleRecord> {
        debug!(
            "Recording {:?} sale for seller '{}'",
            new_sale.source, new_sale.seller_id
        );
        self.revenue_repository.insert_sale(new_sale).await
    }

    async fn get_sales(&self, seller_id: &str) -> Result<Vec<SaleRecord>> {
        self.revenue_repository.list_sales(seller_id).await
    }

    async fn get_requests(&self, user_id: &str) -> Result<Vec<RevenueRequest>> {
        self.revenue_repository.list_requests(user_id).await
    }
}
