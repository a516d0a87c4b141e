//! SQLite storage backend for the construction estimator.

mod decimal;
pub mod factory;
pub mod repository;

pub use factory::{SqliteRepositoryFactory, seeds_dir};
pub use repository::SqliteRepository;
