pub mod calculations;
pub mod catalog;
pub mod db;
pub mod models;
pub mod persistence;
pub mod selection;

#[cfg(test)]
mod test_support;

pub use catalog::{Catalog, CatalogLoader};
pub use db::repository::{EstimatorRepository, RepositoryError};
pub use models::*;
pub use persistence::{ProjectSaver, SaveError, ValidationError};
pub use selection::{Selection, SelectionError};
