//! Platform credit ledger and balance services.

mod credit_model;
mod credit_repository;
mod credit_service;

pub use credit_model::*;
pub use credit_repository::*;
pub use credit_service::*;
