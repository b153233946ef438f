//! Seller revenue domain: sale records, revenue requests, aggregation, and
//! the conversion / payout workflows.

mod revenue_model;
mod revenue_repository;
mod revenue_service;

pub use revenue_model::*;
pub use revenue_repository::*;
pub use revenue_service::*;
