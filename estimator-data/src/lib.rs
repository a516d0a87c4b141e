//! CSV import for the material catalog.

pub mod loader;

pub use loader::{CatalogImportError, CategoryRecord, MaterialCatalogLoader, MaterialRecord};
