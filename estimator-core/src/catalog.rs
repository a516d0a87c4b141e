//! Session-scoped material catalog.

use std::time::Duration;

use tokio::time::timeout;
use tracing::{error, info};

use crate::db::EstimatorRepository;
use crate::models::{Locale, Material};

/// Immutable list of active materials for one session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    materials: Vec<Material>,
}

impl Catalog {
    /// Builds a catalog, dropping inactive entries.
    pub fn new(materials: Vec<Material>) -> Self {
        Self {
            materials: materials.into_iter().filter(|m| m.is_active).collect(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(
        &self,
        id: i64,
    ) -> Option<&Material> {
        self.materials.iter().find(|m| m.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Material> {
        self.materials.iter()
    }

    pub fn by_category(
        &self,
        category_id: i64,
    ) -> impl Iterator<Item = &Material> {
        self.materials
            .iter()
            .filter(move |m| m.category_id == category_id)
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    /// Current-locale name of a catalog material.
    pub fn display_name(
        &self,
        id: i64,
        locale: Locale,
    ) -> Option<&str> {
        self.get(id).map(|m| m.name.resolve(locale))
    }
}

/// Fetches the active catalog once per session.
#[derive(Debug, Clone, Copy)]
pub struct CatalogLoader {
    timeout: Duration,
}

impl Default for CatalogLoader {
    fn default() -> Self {
        Self {
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }
}

impl CatalogLoader {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Loads all active materials.
    ///
    /// Never fails: a store error or timeout is logged and an empty catalog
    /// is returned, so estimating keeps working without materials.
    pub async fn load_active_catalog<R>(
        &self,
        repo: &R,
    ) -> Catalog
    where
        R: EstimatorRepository + ?Sized,
    {
        match timeout(self.timeout, repo.list_active_materials()).await {
            Ok(Ok(materials)) => {
                let catalog = Catalog::new(materials);
                info!(materials = catalog.len(), "catalog loaded");
                catalog
            }
            Ok(Err(error)) => {
                error!(%error, "failed to load material catalog");
                Catalog::empty()
            }
            Err(_) => {
                error!(timeout = ?self.timeout, "material catalog query timed out");
                Catalog::empty()
            }
        }
    }
}
