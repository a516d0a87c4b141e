use async_trait::async_trait;
use thiserror::Error;

use crate::models::{
    AnalyticsEvent, Category, Material, NewAnalyticsEvent, NewProject, OwnerId, Project,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("Record not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

#[async_trait]
pub trait EstimatorRepository: Send + Sync {
    // Catalog
    async fn list_active_materials(&self) -> Result<Vec<Material>, RepositoryError>;
    async fn get_material(
        &self,
        id: i64,
    ) -> Result<Material, RepositoryError>;
    async fn upsert_material(
        &self,
        material: &Material,
    ) -> Result<(), RepositoryError>;
    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError>;
    async fn upsert_category(
        &self,
        category: &Category,
    ) -> Result<(), RepositoryError>;

    // Projects
    async fn create_project(
        &self,
        project: NewProject,
    ) -> Result<Project, RepositoryError>;
    async fn get_project(
        &self,
        id: i64,
    ) -> Result<Project, RepositoryError>;
    async fn list_projects(
        &self,
        owner_id: &OwnerId,
    ) -> Result<Vec<Project>, RepositoryError>;

    // Analytics
    async fn create_analytics_event(
        &self,
        event: NewAnalyticsEvent,
    ) -> Result<AnalyticsEvent, RepositoryError>;
    async fn list_analytics_events(
        &self,
        owner_id: &OwnerId,
    ) -> Result<Vec<AnalyticsEvent>, RepositoryError>;
}
