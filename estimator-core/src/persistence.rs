//! Saving a calculated estimate as a project.
//!
//! A save is two sequential writes: the project record, which is
//! authoritative, and a `project_created` analytics event, which is
//! best-effort telemetry. The event is only attempted after the project
//! write succeeded, and its failure never fails the save.

use std::time::Duration;

use serde_json::{Map, Value};
use thiserror::Error;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::calculations::EstimateSnapshot;
use crate::db::{EstimatorRepository, RepositoryError};
use crate::models::{NewAnalyticsEvent, NewProject, OwnerId, PROJECT_CREATED, Project};

/// Rejected save input. No write is attempted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("sign in to save projects")]
    MissingOwner,

    #[error("project name must not be empty")]
    EmptyName,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SaveError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("failed to save project: {0}")]
    Store(#[from] RepositoryError),

    /// The project write did not finish in time. The write is abandoned, not
    /// rolled back, so the project may still have been stored; check the
    /// project list before saving again.
    #[error(
        "project store did not respond within {0:?}; the project may have been saved anyway, check your projects before retrying"
    )]
    Timeout(Duration),
}

/// Persists estimates through an [`EstimatorRepository`].
pub struct ProjectSaver<'a, R: ?Sized> {
    repo: &'a R,
    timeout: Duration,
}

impl<'a, R> ProjectSaver<'a, R>
where
    R: EstimatorRepository + ?Sized,
{
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    pub fn new(repo: &'a R) -> Self {
        Self {
            repo,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(
        mut self,
        timeout: Duration,
    ) -> Self {
        self.timeout = timeout;
        self
    }

    /// Saves `snapshot` as a project named `name` owned by `owner`.
    ///
    /// # Errors
    /// * [`SaveError::Validation`] when the owner is missing or the trimmed
    ///   name is empty; nothing is written.
    /// * [`SaveError::Store`] / [`SaveError::Timeout`] when the project write
    ///   fails; the analytics event is not written either. After a timeout
    ///   the project row may exist anyway.
    pub async fn save_project(
        &self,
        owner: Option<&OwnerId>,
        name: &str,
        snapshot: &EstimateSnapshot,
    ) -> Result<Project, SaveError> {
        let (owner, name) = validate(owner, name)?;

        let new_project = NewProject {
            owner_id: owner.clone(),
            name: name.to_string(),
            area: snapshot.area,
            project_type: snapshot.project_type,
            base_cost: snapshot.base_cost,
            materials_cost: snapshot.materials_cost,
            total_cost: snapshot.total_cost,
            materials: snapshot.materials.clone(),
        };

        let project = timeout(self.timeout, self.repo.create_project(new_project))
            .await
            .map_err(|_| {
                warn!(timeout = ?self.timeout, "project write timed out, outcome unknown");
                SaveError::Timeout(self.timeout)
            })??;

        info!(
            project_id = project.id,
            owner = %project.owner_id,
            total = %project.total_cost,
            "project saved"
        );

        self.record_created_event(&project).await;

        Ok(project)
    }

    async fn record_created_event(
        &self,
        project: &Project,
    ) {
        let event = project_created_event(project);
        match timeout(self.timeout, self.repo.create_analytics_event(event)).await {
            Ok(Ok(_)) => {}
            Ok(Err(error)) => {
                warn!(project_id = project.id, %error, "failed to record project_created event");
            }
            Err(_) => {
                warn!(project_id = project.id, timeout = ?self.timeout, "project_created event timed out");
            }
        }
    }
}

/// Checks save preconditions and returns the owner and trimmed name.
pub fn validate<'o, 'n>(
    owner: Option<&'o OwnerId>,
    name: &'n str,
) -> Result<(&'o OwnerId, &'n str), ValidationError> {
    let owner = owner.ok_or(ValidationError::MissingOwner)?;
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    Ok((owner, name))
}

fn project_created_event(project: &Project) -> NewAnalyticsEvent {
    let mut metadata = Map::new();
    metadata.insert("project_name".to_string(), Value::String(project.name.clone()));
    metadata.insert(
        "total_cost".to_string(),
        Value::String(project.total_cost.to_string()),
    );
    NewAnalyticsEvent {
        event_type: PROJECT_CREATED.to_string(),
        owner_id: project.owner_id.clone(),
        metadata,
    }
}
