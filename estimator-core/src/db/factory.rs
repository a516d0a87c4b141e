use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;

use super::repository::{EstimatorRepository, RepositoryError};

/// Where the estimator keeps its catalog, projects and analytics events.
///
/// `backend` selects a registered [`RepositoryFactory`]; the connection
/// string is handed to it untouched.
///
/// | backend  | connection_string examples                          |
/// |----------|-----------------------------------------------------|
/// | `sqlite` | `sqlite:estimator.db?mode=rwc`, `:memory:`          |
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    pub backend: String,
    pub connection_string: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            backend: "sqlite".to_string(),
            connection_string: ":memory:".to_string(),
        }
    }
}

/// Opens repositories for one storage backend.
#[async_trait]
pub trait RepositoryFactory: Send + Sync {
    /// Lowercase identifier matched against [`DbConfig::backend`].
    fn backend_name(&self) -> &'static str;

    /// Connect and prepare the store (migrations, seed catalog) so the
    /// returned repository is usable immediately.
    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn EstimatorRepository>, RepositoryError>;
}

/// Backend factories known to the binary, keyed by backend name.
#[derive(Default)]
pub struct RepositoryRegistry {
    factories: HashMap<&'static str, Box<dyn RepositoryFactory>>,
}

impl RepositoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a factory, replacing any previous one with the same name.
    pub fn register(
        &mut self,
        factory: Box<dyn RepositoryFactory>,
    ) {
        self.factories.insert(factory.backend_name(), factory);
    }

    pub fn is_registered(
        &self,
        backend: &str,
    ) -> bool {
        self.factories
            .contains_key(backend.trim().to_ascii_lowercase().as_str())
    }

    /// Registered backend names, sorted.
    pub fn available_backends(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Opens a repository through the factory named by `config.backend`.
    ///
    /// # Errors
    /// * [`RepositoryError::Configuration`] when no such backend is registered.
    /// * Whatever the factory itself reports.
    pub async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn EstimatorRepository>, RepositoryError> {
        let backend = config.backend.trim().to_ascii_lowercase();
        let factory = self.factories.get(backend.as_str()).ok_or_else(|| {
            RepositoryError::Configuration(format!(
                "unknown backend '{}'; available: {:?}",
                config.backend,
                self.available_backends()
            ))
        })?;

        factory.create(config).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::models::{
        AnalyticsEvent, Category, Material, NewAnalyticsEvent, NewProject, OwnerId, Project,
    };

    // Registry tests never touch the repository itself.
    struct UnusedRepository;

    #[async_trait]
    impl EstimatorRepository for UnusedRepository {
        async fn list_active_materials(&self) -> Result<Vec<Material>, RepositoryError> {
            unimplemented!()
        }
        async fn get_material(
            &self,
            _id: i64,
        ) -> Result<Material, RepositoryError> {
            unimplemented!()
        }
        async fn upsert_material(
            &self,
            _material: &Material,
        ) -> Result<(), RepositoryError> {
            unimplemented!()
        }
        async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
            unimplemented!()
        }
        async fn upsert_category(
            &self,
            _category: &Category,
        ) -> Result<(), RepositoryError> {
            unimplemented!()
        }
        async fn create_project(
            &self,
            _project: NewProject,
        ) -> Result<Project, RepositoryError> {
            unimplemented!()
        }
        async fn get_project(
            &self,
            _id: i64,
        ) -> Result<Project, RepositoryError> {
            unimplemented!()
        }
        async fn list_projects(
            &self,
            _owner_id: &OwnerId,
        ) -> Result<Vec<Project>, RepositoryError> {
            unimplemented!()
        }
        async fn create_analytics_event(
            &self,
            _event: NewAnalyticsEvent,
        ) -> Result<AnalyticsEvent, RepositoryError> {
            unimplemented!()
        }
        async fn list_analytics_events(
            &self,
            _owner_id: &OwnerId,
        ) -> Result<Vec<AnalyticsEvent>, RepositoryError> {
            unimplemented!()
        }
    }

    /// Counts how often `create` was reached.
    struct CountingFactory {
        name: &'static str,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl RepositoryFactory for CountingFactory {
        fn backend_name(&self) -> &'static str {
            self.name
        }
        async fn create(
            &self,
            _config: &DbConfig,
        ) -> Result<Box<dyn EstimatorRepository>, RepositoryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(UnusedRepository))
        }
    }

    struct UnreachableStoreFactory;

    #[async_trait]
    impl RepositoryFactory for UnreachableStoreFactory {
        fn backend_name(&self) -> &'static str {
            "unreachable"
        }
        async fn create(
            &self,
            _config: &DbConfig,
        ) -> Result<Box<dyn EstimatorRepository>, RepositoryError> {
            Err(RepositoryError::Connection("store did not answer".to_string()))
        }
    }

    fn counting(name: &'static str) -> (Box<dyn RepositoryFactory>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Box::new(CountingFactory {
                name,
                calls: calls.clone(),
            }),
            calls,
        )
    }

    fn config(backend: &str) -> DbConfig {
        DbConfig {
            backend: backend.to_string(),
            connection_string: ":memory:".to_string(),
        }
    }

    #[test]
    fn default_config_is_in_memory_sqlite() {
        let cfg = DbConfig::default();

        assert_eq!(cfg.backend, "sqlite");
        assert_eq!(cfg.connection_string, ":memory:");
    }

    #[test]
    fn empty_registry_lists_nothing() {
        assert!(RepositoryRegistry::new().available_backends().is_empty());
    }

    #[test]
    fn backends_are_listed_sorted_and_deduplicated() {
        let mut reg = RepositoryRegistry::new();
        reg.register(counting("sqlite").0);
        reg.register(counting("postgres").0);
        reg.register(counting("sqlite").0);

        assert_eq!(reg.available_backends(), vec!["postgres", "sqlite"]);
        assert!(reg.is_registered(" SQLite "));
        assert!(!reg.is_registered("mysql"));
    }

    #[tokio::test]
    async fn create_dispatches_only_to_matching_factory() {
        let mut reg = RepositoryRegistry::new();
        let (sqlite, sqlite_calls) = counting("sqlite");
        let (postgres, postgres_calls) = counting("postgres");
        reg.register(sqlite);
        reg.register(postgres);

        let result = reg.create(&config("SQLITE")).await;

        assert!(result.is_ok(), "expected Ok, got {:#?}", result.err());
        assert_eq!(sqlite_calls.load(Ordering::SeqCst), 1);
        assert_eq!(postgres_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unknown_backend_names_requested_and_available() {
        let mut reg = RepositoryRegistry::new();
        reg.register(counting("sqlite").0);

        match reg.create(&config("postgres")).await {
            Err(RepositoryError::Configuration(msg)) => {
                assert!(msg.contains("postgres"), "missing requested backend: {msg}");
                assert!(msg.contains("sqlite"), "missing available backends: {msg}");
            }
            Err(other) => panic!("expected Configuration error, got {other:#?}"),
            Ok(_) => panic!("expected Configuration error, got a repository"),
        }
    }

    #[tokio::test]
    async fn factory_errors_propagate() {
        let mut reg = RepositoryRegistry::new();
        reg.register(Box::new(UnreachableStoreFactory));

        let result = reg.create(&config("unreachable")).await;

        assert_eq!(
            result.err(),
            Some(RepositoryError::Connection("store did not answer".to_string()))
        );
    }
}
