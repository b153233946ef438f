//! Revenue tables: models and repository.

mod model;
mod repository;

pub use model::*;
pub use repository::*;
