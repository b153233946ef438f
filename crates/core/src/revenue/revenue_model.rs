//! Revenue domain models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, ValidationError};

/// Fixed seller share per completed sale, in cents. Every sale credits the
/// seller the same share, independent of the listing price.
pub const SELLER_SHARE_CENTS: i64 = 200;

/// Credits granted per dollar of converted revenue.
pub const CREDITS_PER_REVENUE_DOLLAR: i64 = 400;

/// Window within which a completed conversion for the same amount is
/// treated as a duplicate submission.
pub const DUPLICATE_CONVERSION_WINDOW_SECONDS: i64 = 60;

/// Lifecycle states of a sale's revenue claim. A record only moves forward
/// from `Available`; it is never reverted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevenueStatus {
    Available,
    PaymentRequested,
    Credited,
}

/// Physical source table a sale record lives in. Storefront purchases land
/// in `AssetSales`; migrated rows live in `RevenueHistory`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaleSource {
    AssetSales,
    RevenueHistory,
}

/// One revenue claim per completed marketplace sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleRecord {
    pub id: String,
    pub seller_id: String,
    pub buyer_id: Option<String>,
    pub asset_id: Option<String>,
    pub purchase_amount_cents: i64,
    pub revenue_status: RevenueStatus,
    pub revenue_request_id: Option<String>,
    pub source: SaleSource,
    pub created_at: DateTime<Utc>,
}

/// Input for recording a completed sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSaleRecord {
    pub seller_id: String,
    pub buyer_id: Option<String>,
    pub asset_id: Option<String>,
    pub purchase_amount_cents: i64,
    pub source: SaleSource,
}

/// Kind of revenue request a workflow creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestType {
    RevenueConversion,
    StripePayment,
}

/// Fulfillment state of a revenue request. Conversions complete
/// synchronously; payout requests stay pending until back-office
/// processing finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Completed,
}

/// Contact details collected for a fiat payout request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutContact {
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub payout_account: String,
}

impl PayoutContact {
    /// Field checks performed before any store call.
    pub fn validate(&self) -> Result<()> {
        if self.full_name.trim().is_empty() {
            return Err(ValidationError::InvalidContact("full name is required".to_string()).into());
        }
        let email = self.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(
                ValidationError::InvalidContact("a valid email address is required".to_string())
                    .into(),
            );
        }
        if self.payout_account.trim().is_empty() {
            return Err(
                ValidationError::InvalidContact("payout account is required".to_string()).into(),
            );
        }
        Ok(())
    }
}

/// Typed request metadata, one variant per request type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RequestMetadata {
    RevenueConversion { credits_added: i64 },
    StripePayment { contact: PayoutContact },
}

/// A conversion or payout request created by one of the workflows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueRequest {
    pub id: String,
    pub user_id: String,
    pub amount_cents: i64,
    pub request_type: RequestType,
    pub status: RequestStatus,
    pub metadata: RequestMetadata,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a revenue request inside a workflow commit.
#[derive(Debug, Clone)]
pub struct NewRevenueRequest {
    pub user_id: String,
    pub amount_cents: i64,
    pub request_type: RequestType,
    pub status: RequestStatus,
    pub metadata: RequestMetadata,
}

/// Aggregated revenue totals for a seller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueSummary {
    /// Count of the seller's sale records across both source tables,
    /// regardless of status.
    pub total_sales_count: i64,
    /// Count of `Available` sale records times [`SELLER_SHARE_CENTS`].
    pub total_revenue_cents: i64,
    /// Sum of pending fiat payout request amounts.
    pub requested_amount_cents: i64,
}

/// Result of a successful conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionOutcome {
    pub request_id: String,
    pub amount_cents: i64,
    pub credits_granted: i64,
    pub sales_credited: i64,
    pub new_credit_balance: i64,
}

impl ConversionOutcome {
    pub fn amount_dollars(&self) -> Decimal {
        Decimal::new(self.amount_cents, 2)
    }
}

/// Result of a successful payout request. Fulfillment is manual and takes
/// two to three weeks; the request stays pending until then.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutOutcome {
    pub request_id: String,
    pub amount_cents: i64,
    pub sales_reserved: i64,
}

impl PayoutOutcome {
    pub fn amount_dollars(&self) -> Decimal {
        Decimal::new(self.amount_cents, 2)
    }
}

/// Credits granted for a converted revenue amount: $1 of revenue yields
/// [`CREDITS_PER_REVENUE_DOLLAR`] credits, floored.
pub fn credits_for_revenue(amount_cents: i64) -> i64 {
    amount_cents * CREDITS_PER_REVENUE_DOLLAR / 100
}

/// Number of sale records a payout of `amount_cents` must reserve.
pub fn sales_needed_for_amount(amount_cents: i64) -> i64 {
    if amount_cents <= 0 {
        return 0;
    }
    (amount_cents + SELLER_SHARE_CENTS - 1) / SELLER_SHARE_CENTS
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn credits_are_four_per_cent_of_revenue() {
        assert_eq!(credits_for_revenue(600), 2400);
        assert_eq!(credits_for_revenue(1000), 4000);
        assert_eq!(credits_for_revenue(150), 600);
        assert_eq!(credits_for_revenue(0), 0);
    }

    #[test]
    fn sales_needed_rounds_up_to_whole_records() {
        assert_eq!(sales_needed_for_amount(1000), 5);
        assert_eq!(sales_needed_for_amount(600), 3);
        assert_eq!(sales_needed_for_amount(601), 4);
        assert_eq!(sales_needed_for_amount(199), 1);
        assert_eq!(sales_needed_for_amount(0), 0);
    }

    #[test]
    fn outcome_reports_amount_in_dollars() {
        let outcome = ConversionOutcome {
            request_id: "req".to_string(),
            amount_cents: 600,
            credits_granted: 2400,
            sales_credited: 3,
            new_credit_balance: 2400,
        };
        assert_eq!(outcome.amount_dollars(), dec!(6.00));
    }

    #[test]
    fn request_metadata_serialization_is_tagged_by_type() {
        let conversion = RequestMetadata::RevenueConversion { credits_added: 2400 };
        assert_eq!(
            serde_json::to_string(&conversion).expect("serialize metadata"),
            "{\"type\":\"revenue_conversion\",\"credits_added\":2400}"
        );

        let payout = RequestMetadata::StripePayment {
            contact: PayoutContact {
                full_name: "Jamie Seller".to_string(),
                email: "jamie@example.com".to_string(),
                phone: None,
                payout_account: "acct_123".to_string(),
            },
        };
        let json = serde_json::to_string(&payout).expect("serialize metadata");
        assert!(json.starts_with("{\"type\":\"stripe_payment\""));
    }

    #[test]
    fn revenue_status_serialization_matches_store_contract() {
        let actual = [
            RevenueStatus::Available,
            RevenueStatus::PaymentRequested,
            RevenueStatus::Credited,
        ]
        .iter()
        .map(|status| serde_json::to_string(status).expect("serialize status"))
        .collect::<Vec<_>>();

        assert_eq!(
            actual,
            vec!["\"available\"", "\"payment_requested\"", "\"credited\""]
        );
    }

    #[test]
    fn payout_contact_validation_rejects_missing_fields() {
        let valid = PayoutContact {
            full_name: "Jamie Seller".to_string(),
            email: "jamie@example.com".to_string(),
            phone: None,
            payout_account: "acct_123".to_string(),
        };
        assert!(valid.validate().is_ok());

        let mut missing_name = valid.clone();
        missing_name.full_name = "  ".to_string();
        assert!(missing_name.validate().is_err());

        let mut bad_email = valid.clone();
        bad_email.email = "not-an-email".to_string();
        assert!(bad_email.validate().is_err());

        let mut missing_account = valid;
        missing_account.payout_account = String::new();
        assert!(missing_account.validate().is_err());
    }
}
