//! SQLite storage for the Cardmint revenue subsystem.
//!
//! Implements the repository traits from `cardmint-core` on top of diesel,
//! with reads served from an r2d2 pool and all writes funneled through a
//! serialized write actor so multi-statement workflow commits stay atomic.

pub mod credits;
pub mod db;
pub mod errors;
pub mod revenue;
pub mod schema;
