//! End-to-end workflow tests: core services running against the real
//! SQLite repositories.

use std::sync::Arc;

use tempfile::tempdir;

use cardmint_core::credits::{CreditReason, CreditService, CreditServiceTrait};
use cardmint_core::errors::{Error, ValidationError};
use cardmint_core::revenue::{
    NewSaleRecord, PayoutContact, RequestStatus, RequestType, RevenueService, RevenueServiceTrait,
    RevenueStatus, SaleSource, SELLER_SHARE_CENTS,
};
use cardmint_storage_sqlite::credits::CreditRepository;
use cardmint_storage_sqlite::db::{create_pool, init, run_migrations, spawn_writer};
use cardmint_storage_sqlite::revenue::RevenueRepository;

fn setup_services() -> (RevenueService, CreditService) {
    let app_data = tempdir()
        .expect("tempdir")
        .keep()
        .to_string_lossy()
        .to_string();
    let db_path = init(&app_data).expect("init db");
    run_migrations(&db_path).expect("migrate db");
    let pool = create_pool(&db_path).expect("create pool");
    let writer = spawn_writer(pool.as_ref().clone());

    let revenue_repository = Arc::new(RevenueRepository::new(pool.clone(), writer.clone()));
    let credit_repository = Arc::new(CreditRepository::new(pool, writer));
    (
        RevenueService::new(revenue_repository),
        CreditService::new(credit_repository),
    )
}

async fn seed_sales(service: &RevenueService, seller: &str, count: usize, source: SaleSource) {
    for i in 0..count {
        service
            .record_sale(NewSaleRecord {
                seller_id: seller.to_string(),
                buyer_id: Some(format!("buyer-{i}")),
                asset_id: Some(format!("card-{i}")),
                // Listing prices vary; the seller share does not.
                purchase_amount_cents: 999 + i as i64 * 1_750,
                source,
            })
            .await
            .expect("record sale");
    }
}

fn contact() -> PayoutContact {
    PayoutContact {
        full_name: "Jamie Seller".to_string(),
        email: "jamie@example.com".to_string(),
        phone: Some("+1 555 0100".to_string()),
        payout_account: "acct_1A2B3C".to_string(),
    }
}

#[tokio::test]
async fn summary_uses_fixed_share_regardless_of_listing_prices() {
    let (revenue, _credits) = setup_services();
    seed_sales(&revenue, "seller-1", 3, SaleSource::AssetSales).await;
    seed_sales(&revenue, "seller-1", 1, SaleSource::RevenueHistory).await;

    let summary = revenue
        .get_revenue_summary("seller-1")
        .await
        .expect("summary");
    assert_eq!(summary.total_sales_count, 4);
    assert_eq!(summary.total_revenue_cents, 4 * SELLER_SHARE_CENTS);
    assert_eq!(summary.requested_amount_cents, 0);
}

#[tokio::test]
async fn conversion_grants_credits_and_consumes_every_available_sale() {
    let (revenue, credits) = setup_services();
    seed_sales(&revenue, "seller-1", 3, SaleSource::AssetSales).await;

    let outcome = revenue
        .convert_revenue_to_credits("seller-1")
        .await
        .expect("conversion");
    assert_eq!(outcome.amount_cents, 600);
    assert_eq!(outcome.credits_granted, 2400);
    assert_eq!(outcome.sales_credited, 3);
    assert_eq!(outcome.new_credit_balance, 2400);

    assert_eq!(credits.get_balance("seller-1").await.expect("balance"), 2400);
    let ledger = credits.get_ledger("seller-1").await.expect("ledger");
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0].reason, CreditReason::RevenueConversion);
    assert_eq!(ledger[0].reference_id.as_deref(), Some(outcome.request_id.as_str()));

    let sales = revenue.get_sales("seller-1").await.expect("sales");
    assert!(sales
        .iter()
        .all(|s| s.revenue_status == RevenueStatus::Credited));

    // The aggregate reflects the consumed claims immediately.
    let summary = revenue
        .get_revenue_summary("seller-1")
        .await
        .expect("summary");
    assert_eq!(summary.total_revenue_cents, 0);
    assert_eq!(summary.total_sales_count, 3);
}

#[tokio::test]
async fn conversion_covers_both_source_tables_in_one_commit() {
    let (revenue, credits) = setup_services();
    seed_sales(&revenue, "seller-1", 2, SaleSource::AssetSales).await;
    seed_sales(&revenue, "seller-1", 3, SaleSource::RevenueHistory).await;

    let outcome = revenue
        .convert_revenue_to_credits("seller-1")
        .await
        .expect("conversion");
    assert_eq!(outcome.amount_cents, 1000);
    assert_eq!(outcome.credits_granted, 4000);
    assert_eq!(outcome.sales_credited, 5);
    assert_eq!(credits.get_balance("seller-1").await.expect("balance"), 4000);
}

#[tokio::test]
async fn conversion_without_available_revenue_is_rejected() {
    let (revenue, _credits) = setup_services();

    let err = revenue
        .convert_revenue_to_credits("seller-empty")
        .await
        .expect_err("no revenue");
    assert!(matches!(
        err,
        Error::Validation(ValidationError::NoRevenueAvailable)
    ));
}

#[tokio::test]
async fn immediate_repeat_conversion_for_same_amount_is_rejected() {
    let (revenue, credits) = setup_services();
    seed_sales(&revenue, "seller-1", 3, SaleSource::AssetSales).await;
    revenue
        .convert_revenue_to_credits("seller-1")
        .await
        .expect("first conversion");

    // New sales bring the available amount back to the converted figure;
    // inside the window the submission is treated as a duplicate.
    seed_sales(&revenue, "seller-1", 3, SaleSource::AssetSales).await;
    let err = revenue
        .convert_revenue_to_credits("seller-1")
        .await
        .expect_err("duplicate");
    assert!(matches!(
        err,
        Error::Validation(ValidationError::DuplicateConversion)
    ));

    // Nothing was mutated by the rejected attempt.
    let summary = revenue
        .get_revenue_summary("seller-1")
        .await
        .expect("summary");
    assert_eq!(summary.total_revenue_cents, 600);
    assert_eq!(credits.get_balance("seller-1").await.expect("balance"), 2400);
    assert_eq!(
        revenue.get_requests("seller-1").await.expect("requests").len(),
        1
    );
}

#[tokio::test]
async fn payout_reserves_one_record_per_share_of_revenue() {
    let (revenue, _credits) = setup_services();
    seed_sales(&revenue, "seller-1", 5, SaleSource::AssetSales).await;

    let outcome = revenue
        .request_payout("seller-1", contact())
        .await
        .expect("payout");
    assert_eq!(outcome.amount_cents, 1000);
    assert_eq!(outcome.sales_reserved, 5);

    let sales = revenue.get_sales("seller-1").await.expect("sales");
    assert!(sales
        .iter()
        .all(|s| s.revenue_status == RevenueStatus::PaymentRequested));

    let requests = revenue.get_requests("seller-1").await.expect("requests");
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].request_type, RequestType::StripePayment);
    assert_eq!(requests[0].status, RequestStatus::Pending);

    let summary = revenue
        .get_revenue_summary("seller-1")
        .await
        .expect("summary");
    assert_eq!(summary.total_revenue_cents, 0);
    assert_eq!(summary.requested_amount_cents, 1000);
}

#[tokio::test]
async fn payout_with_invalid_contact_writes_nothing() {
    let (revenue, _credits) = setup_services();
    seed_sales(&revenue, "seller-1", 2, SaleSource::AssetSales).await;

    let mut bad_contact = contact();
    bad_contact.payout_account = String::new();
    let err = revenue
        .request_payout("seller-1", bad_contact)
        .await
        .expect_err("invalid contact");
    assert!(matches!(
        err,
        Error::Validation(ValidationError::InvalidContact(_))
    ));

    assert!(revenue
        .get_requests("seller-1")
        .await
        .expect("requests")
        .is_empty());
    let summary = revenue
        .get_revenue_summary("seller-1")
        .await
        .expect("summary");
    assert_eq!(summary.total_revenue_cents, 400);
}

#[tokio::test]
async fn converted_and_reserved_claims_never_return_to_available() {
    let (revenue, _credits) = setup_services();
    seed_sales(&revenue, "seller-1", 2, SaleSource::AssetSales).await;
    revenue
        .convert_revenue_to_credits("seller-1")
        .await
        .expect("conversion");

    seed_sales(&revenue, "seller-1", 3, SaleSource::RevenueHistory).await;
    revenue
        .request_payout("seller-1", contact())
        .await
        .expect("payout");

    let sales = revenue.get_sales("seller-1").await.expect("sales");
    assert_eq!(sales.len(), 5);
    assert_eq!(
        sales
            .iter()
            .filter(|s| s.revenue_status == RevenueStatus::Credited)
            .count(),
        2
    );
    assert_eq!(
        sales
            .iter()
            .filter(|s| s.revenue_status == RevenueStatus::PaymentRequested)
            .count(),
        3
    );
    assert!(sales
        .iter()
        .all(|s| s.revenue_request_id.is_some()));
}
