//! Repository double with switchable failures for adapter tests.

use std::future::pending;
use std::sync::Mutex;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::db::{EstimatorRepository, MemoryRepository, RepositoryError};
use crate::models::{
    AnalyticsEvent, Category, LocalizedName, Material, NewAnalyticsEvent, NewProject, OwnerId,
    Project,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Behaviour {
    #[default]
    Succeed,
    Fail,
    Hang,
}

/// Wraps a [`MemoryRepository`], logs every write attempt and can be told
/// to fail or never answer per operation family.
#[derive(Debug, Default)]
pub struct FlakyRepository {
    pub inner: MemoryRepository,
    pub catalog: Behaviour,
    pub projects: Behaviour,
    pub analytics: Behaviour,
    pub writes: Mutex<Vec<&'static str>>,
}

impl FlakyRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writes(&self) -> Vec<&'static str> {
        self.writes.lock().unwrap().clone()
    }

    async fn gate(
        &self,
        behaviour: Behaviour,
        what: &str,
    ) -> Result<(), RepositoryError> {
        match behaviour {
            Behaviour::Succeed => Ok(()),
            Behaviour::Fail => Err(RepositoryError::Database(format!("{what} rejected"))),
            Behaviour::Hang => pending().await,
        }
    }
}

pub fn material(
    id: i64,
    price: Decimal,
) -> Material {
    Material {
        id,
        name: LocalizedName::new(format!("Material {id}"), format!("Item {id}")),
        category_id: 1,
        price,
        unit: "unidad".to_string(),
        image_url: None,
        is_active: true,
    }
}

#[async_trait]
impl EstimatorRepository for FlakyRepository {
    async fn list_active_materials(&self) -> Result<Vec<Material>, RepositoryError> {
        self.gate(self.catalog, "catalog query").await?;
        self.inner.list_active_materials().await
    }

    async fn get_material(
        &self,
        id: i64,
    ) -> Result<Material, RepositoryError> {
        self.inner.get_material(id).await
    }

    async fn upsert_material(
        &self,
        material: &Material,
    ) -> Result<(), RepositoryError> {
        self.inner.upsert_material(material).await
    }

    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        self.inner.list_categories().await
    }

    async fn upsert_category(
        &self,
        category: &Category,
    ) -> Result<(), RepositoryError> {
        self.inner.upsert_category(category).await
    }

    async fn create_project(
        &self,
        project: NewProject,
    ) -> Result<Project, RepositoryError> {
        self.writes.lock().unwrap().push("project");
        self.gate(self.projects, "project insert").await?;
        self.inner.create_project(project).await
    }

    async fn get_project(
        &self,
        id: i64,
    ) -> Result<Project, RepositoryError> {
        self.inner.get_project(id).await
    }

    async fn list_projects(
        &self,
        owner_id: &OwnerId,
    ) -> Result<Vec<Project>, RepositoryError> {
        self.inner.list_projects(owner_id).await
    }

    async fn create_analytics_event(
        &self,
        event: NewAnalyticsEvent,
    ) -> Result<AnalyticsEvent, RepositoryError> {
        self.writes.lock().unwrap().push("analytics");
        self.gate(self.analytics, "analytics insert").await?;
        self.inner.create_analytics_event(event).await
    }

    async fn list_analytics_events(
        &self,
        owner_id: &OwnerId,
    ) -> Result<Vec<AnalyticsEvent>, RepositoryError> {
        self.inner.list_analytics_events(owner_id).await
    }
}
