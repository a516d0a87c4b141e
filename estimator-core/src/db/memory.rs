//! Process-local repository backend.
//!
//! Keeps everything in a mutex-guarded struct. Useful for demos and tests;
//! nothing survives the process.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use super::factory::{DbConfig, RepositoryFactory};
use super::repository::{EstimatorRepository, RepositoryError};
use crate::models::{
    AnalyticsEvent, Category, Material, NewAnalyticsEvent, NewProject, OwnerId, Project,
};

#[derive(Debug, Default)]
struct MemoryState {
    categories: Vec<Category>,
    materials: Vec<Material>,
    projects: Vec<Project>,
    events: Vec<AnalyticsEvent>,
}

#[derive(Debug, Default)]
pub struct MemoryRepository {
    state: Mutex<MemoryState>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository pre-populated with a catalog.
    pub fn with_catalog(
        categories: Vec<Category>,
        materials: Vec<Material>,
    ) -> Self {
        Self {
            state: Mutex::new(MemoryState {
                categories,
                materials,
                ..Default::default()
            }),
        }
    }

    fn state(&self) -> Result<MutexGuard<'_, MemoryState>, RepositoryError> {
        self.state
            .lock()
            .map_err(|e| RepositoryError::Database(format!("memory store poisoned: {e}")))
    }
}

#[async_trait]
impl EstimatorRepository for MemoryRepository {
    async fn list_active_materials(&self) -> Result<Vec<Material>, RepositoryError> {
        let state = self.state()?;
        let mut materials: Vec<_> = state
            .materials
            .iter()
            .filter(|m| m.is_active)
            .cloned()
            .collect();
        materials.sort_by_key(|m| (m.category_id, m.id));
        Ok(materials)
    }

    async fn get_material(
        &self,
        id: i64,
    ) -> Result<Material, RepositoryError> {
        self.state()?
            .materials
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn upsert_material(
        &self,
        material: &Material,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state()?;
        match state.materials.iter_mut().find(|m| m.id == material.id) {
            Some(existing) => *existing = material.clone(),
            None => state.materials.push(material.clone()),
        }
        Ok(())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let mut categories = self.state()?.categories.clone();
        categories.sort_by_key(|c| c.id);
        Ok(categories)
    }

    async fn upsert_category(
        &self,
        category: &Category,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state()?;
        match state.categories.iter_mut().find(|c| c.id == category.id) {
            Some(existing) => *existing = category.clone(),
            None => state.categories.push(category.clone()),
        }
        Ok(())
    }

    async fn create_project(
        &self,
        project: NewProject,
    ) -> Result<Project, RepositoryError> {
        let mut state = self.state()?;
        let id = state.projects.len() as i64 + 1;
        let created = Project {
            id,
            owner_id: project.owner_id,
            name: project.name,
            area: project.area,
            project_type: project.project_type,
            base_cost: project.base_cost,
            materials_cost: project.materials_cost,
            total_cost: project.total_cost,
            materials: project.materials,
            created_at: Utc::now(),
        };
        state.projects.push(created.clone());
        Ok(created)
    }

    async fn get_project(
        &self,
        id: i64,
    ) -> Result<Project, RepositoryError> {
        self.state()?
            .projects
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn list_projects(
        &self,
        owner_id: &OwnerId,
    ) -> Result<Vec<Project>, RepositoryError> {
        Ok(self
            .state()?
            .projects
            .iter()
            .rev()
            .filter(|p| &p.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn create_analytics_event(
        &self,
        event: NewAnalyticsEvent,
    ) -> Result<AnalyticsEvent, RepositoryError> {
        let mut state = self.state()?;
        let created = AnalyticsEvent {
            id: state.events.len() as i64 + 1,
            event_type: event.event_type,
            owner_id: event.owner_id,
            metadata: event.metadata,
            created_at: Utc::now(),
        };
        state.events.push(created.clone());
        Ok(created)
    }

    async fn list_analytics_events(
        &self,
        owner_id: &OwnerId,
    ) -> Result<Vec<AnalyticsEvent>, RepositoryError> {
        Ok(self
            .state()?
            .events
            .iter()
            .filter(|e| &e.owner_id == owner_id)
            .cloned()
            .collect())
    }
}

/// [`RepositoryFactory`] for the `"memory"` backend. Each `create` call
/// returns a fresh, empty store.
pub struct MemoryRepositoryFactory;

#[async_trait]
impl RepositoryFactory for MemoryRepositoryFactory {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn create(
        &self,
        _config: &DbConfig,
    ) -> Result<Box<dyn EstimatorRepository>, RepositoryError> {
        Ok(Box::new(MemoryRepository::new()))
    }
}
