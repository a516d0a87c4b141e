//! Command implementations behind the `estimator` binary.
//!
//! Each command returns its report as a `String` so it can be tested
//! without capturing stdout.

use std::fmt::Write;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use estimator_core::db::{MemoryRepositoryFactory, RepositoryRegistry};
use estimator_core::{
    CatalogLoader, EstimatorRepository, Locale, OwnerId, Project, ProjectSaver,
    ProjectType,
};
use estimator_db_sqlite::SqliteRepositoryFactory;
use tracing::debug;

use crate::session::CalculatorSession;
use crate::utils::{MaterialArg, format_currency};

/// Builds a [`RepositoryRegistry`] with every backend compiled into this binary.
pub fn build_registry() -> RepositoryRegistry {
    let mut registry = RepositoryRegistry::new();
    registry.register(Box::new(SqliteRepositoryFactory));
    registry.register(Box::new(MemoryRepositoryFactory));
    registry
}

/// Input of one `estimate` run.
#[derive(Debug, Clone, Default)]
pub struct EstimateCommand {
    pub area: String,
    pub project_type: ProjectType,
    pub materials: Vec<MaterialArg>,
    pub save_as: Option<String>,
    pub owner: Option<OwnerId>,
}

/// Loads the active catalog and opens a session on it.
pub async fn open_session<R>(
    repo: &R,
    locale: Locale,
    timeout: Duration,
) -> CalculatorSession
where
    R: EstimatorRepository + ?Sized,
{
    let catalog = CatalogLoader::new(timeout).load_active_catalog(repo).await;
    CalculatorSession::new(catalog, locale)
}

/// `catalog`: active materials grouped by category.
pub async fn run_catalog<R>(
    repo: &R,
    locale: Locale,
    timeout: Duration,
) -> Result<String>
where
    R: EstimatorRepository + ?Sized,
{
    let catalog = CatalogLoader::new(timeout).load_active_catalog(repo).await;
    let categories = repo
        .list_categories()
        .await
        .context("Failed to list categories")?;

    let mut out = String::new();
    if catalog.is_empty() {
        writeln!(out, "No materials available.")?;
        return Ok(out);
    }

    for category in &categories {
        let mut materials = catalog.by_category(category.id).peekable();
        if materials.peek().is_none() {
            continue;
        }
        writeln!(out, "{}", category.name.resolve(locale))?;
        for material in materials {
            writeln!(
                out,
                "  {:>4}  {:<40} {:>16} / {}",
                material.id,
                material.name.resolve(locale),
                format_currency(material.price, locale),
                material.unit
            )?;
        }
    }

    let uncategorized: Vec<_> = catalog
        .iter()
        .filter(|m| !categories.iter().any(|c| c.id == m.category_id))
        .collect();
    if !uncategorized.is_empty() {
        writeln!(out, "Other")?;
        for material in uncategorized {
            writeln!(
                out,
                "  {:>4}  {:<40} {:>16} / {}",
                material.id,
                material.name.resolve(locale),
                format_currency(material.price, locale),
                material.unit
            )?;
        }
    }

    Ok(out)
}

/// `estimate`: runs the calculator flow once and optionally saves the result.
pub async fn run_estimate<R>(
    repo: &R,
    command: EstimateCommand,
    locale: Locale,
    timeout: Duration,
) -> Result<String>
where
    R: EstimatorRepository + ?Sized,
{
    let mut session = open_session(repo, locale, timeout).await;

    session.set_area(&command.area);
    session.set_project_type(command.project_type);
    session.calculate()?;

    for pick in &command.materials {
        session.select_material(pick.id)?;
        if let Some(quantity) = pick.quantity {
            session.set_quantity(pick.id, quantity)?;
        }
    }
    debug!(items = session.selection().len(), "materials selected");

    let mut out = render_breakdown(&session)?;

    if let Some(name) = &command.save_as {
        let saver = ProjectSaver::new(repo).with_timeout(timeout);
        session.open_save_dialog()?;
        let project = session
            .save(name, command.owner.as_ref(), &saver)
            .await?;
        writeln!(out, "\nSaved project #{} '{}'", project.id, project.name)?;
    }

    Ok(out)
}

/// `projects`: the owner's saved projects, newest first.
pub async fn run_projects<R>(
    repo: &R,
    owner: &OwnerId,
    locale: Locale,
    timeout: Duration,
) -> Result<String>
where
    R: EstimatorRepository + ?Sized,
{
    let projects = tokio::time::timeout(timeout, repo.list_projects(owner))
        .await
        .map_err(|_| anyhow!("Project store did not respond within {timeout:?}"))?
        .with_context(|| format!("Failed to list projects for {owner}"))?;

    render_projects(&projects, locale)
}

/// Cost breakdown of the current session.
pub fn render_breakdown(session: &CalculatorSession) -> Result<String> {
    let locale = session.locale();
    let money = |amount| format_currency(amount, locale);
    let total = session
        .total_cost()
        .context("Total cost is out of range")?;
    let mut out = String::new();

    writeln!(
        out,
        "Area: {} m² ({})",
        session.area_input().trim(),
        session.project_type()
    )?;
    writeln!(out, "Base cost:      {:>18}", money(session.base_cost()))?;

    let items = session.selection_view();
    if !items.is_empty() {
        writeln!(out, "Materials:")?;
        for item in &items {
            writeln!(
                out,
                "  {:<36} {:>4} x {:>14} = {:>16}",
                item.name,
                item.quantity,
                money(item.unit_price),
                money(item.line_total)
            )?;
        }
    }

    writeln!(out, "Materials cost: {:>18}", money(session.materials_cost()))?;
    writeln!(out, "Total cost:     {:>18}", money(total))?;
    Ok(out)
}

pub fn render_projects(
    projects: &[Project],
    locale: Locale,
) -> Result<String> {
    if projects.is_empty() {
        return Ok("No saved projects.\n".to_string());
    }

    let mut out = String::new();
    for project in projects {
        writeln!(
            out,
            "#{:<5} {:<30} {:>8} m² {:<12} {:>18}  {}",
            project.id,
            project.name,
            project.area,
            project.project_type.as_str(),
            format_currency(project.total_cost, locale),
            project.created_at.format("%Y-%m-%d %H:%M")
        )?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use estimator_core::db::MemoryRepository;
    use estimator_core::{
        AnalyticsEvent, Category, LocalizedName, Material, NewAnalyticsEvent, NewProject,
        RepositoryError,
    };
    use rust_decimal_macros::dec;

    use super::*;

    /// Memory store whose project listing never answers.
    struct StalledListing(MemoryRepository);

    #[async_trait]
    impl EstimatorRepository for StalledListing {
        async fn list_active_materials(&self) -> Result<Vec<Material>, RepositoryError> {
            self.0.list_active_materials().await
        }

        async fn get_material(
            &self,
            id: i64,
        ) -> Result<Material, RepositoryError> {
            self.0.get_material(id).await
        }

        async fn upsert_material(
            &self,
            material: &Material,
        ) -> Result<(), RepositoryError> {
            self.0.upsert_material(material).await
        }

        async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
            self.0.list_categories().await
        }

        async fn upsert_category(
            &self,
            category: &Category,
        ) -> Result<(), RepositoryError> {
            self.0.upsert_category(category).await
        }

        async fn create_project(
            &self,
            project: NewProject,
        ) -> Result<Project, RepositoryError> {
            self.0.create_project(project).await
        }

        async fn get_project(
            &self,
            id: i64,
        ) -> Result<Project, RepositoryError> {
            self.0.get_project(id).await
        }

        async fn list_projects(
            &self,
            _owner_id: &OwnerId,
        ) -> Result<Vec<Project>, RepositoryError> {
            std::future::pending().await
        }

        async fn create_analytics_event(
            &self,
            event: NewAnalyticsEvent,
        ) -> Result<AnalyticsEvent, RepositoryError> {
            self.0.create_analytics_event(event).await
        }

        async fn list_analytics_events(
            &self,
            owner_id: &OwnerId,
        ) -> Result<Vec<AnalyticsEvent>, RepositoryError> {
            self.0.list_analytics_events(owner_id).await
        }
    }

    fn repo() -> MemoryRepository {
        MemoryRepository::with_catalog(
            vec![Category {
                id: 1,
                name: LocalizedName::new("Cemento", "Cement"),
            }],
            vec![Material {
                id: 1,
                name: LocalizedName::new("Cemento gris", "Grey cement"),
                category_id: 1,
                price: dec!(500),
                unit: "funda".to_string(),
                image_url: None,
                is_active: true,
            }],
        )
    }

    #[test]
    fn registry_knows_both_backends() {
        assert_eq!(build_registry().available_backends(), vec!["memory", "sqlite"]);
    }

    #[tokio::test]
    async fn catalog_lists_localized_names() {
        let out = run_catalog(&repo(), Locale::En, Duration::from_secs(1))
            .await
            .unwrap();

        assert!(out.contains("Cement\n"));
        assert!(out.contains("Grey cement"));
        assert!(out.contains("DOP 500.00"));
    }

    #[tokio::test]
    async fn estimate_prints_breakdown() {
        let command = EstimateCommand {
            area: "100".to_string(),
            materials: vec![MaterialArg {
                id: 1,
                quantity: Some(2),
            }],
            ..Default::default()
        };

        let out = run_estimate(&repo(), command, Locale::Es, Duration::from_secs(1))
            .await
            .unwrap();

        assert!(out.contains("RD$120,000.00"));
        assert!(out.contains("RD$1,000.00"));
        assert!(out.contains("RD$121,000.00"));
        assert!(!out.contains("Saved project"));
    }

    #[tokio::test]
    async fn estimate_rejects_bad_area() {
        let command = EstimateCommand {
            area: "0".to_string(),
            ..Default::default()
        };

        let result = run_estimate(&repo(), command, Locale::Es, Duration::from_secs(1)).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn estimate_save_requires_owner() {
        let repo = repo();
        let command = EstimateCommand {
            area: "100".to_string(),
            save_as: Some("Casa".to_string()),
            ..Default::default()
        };

        let result = run_estimate(&repo, command, Locale::Es, Duration::from_secs(1)).await;

        let err = result.expect_err("save without owner must fail");
        assert!(err.to_string().contains("sign in"), "got: {err}");
    }

    #[tokio::test]
    async fn saved_estimate_shows_up_in_projects() {
        let repo = repo();
        let owner = OwnerId::new("ana").unwrap();
        let command = EstimateCommand {
            area: "100".to_string(),
            project_type: ProjectType::Commercial,
            save_as: Some("Local comercial".to_string()),
            owner: Some(owner.clone()),
            ..Default::default()
        };

        let out = run_estimate(&repo, command, Locale::Es, Duration::from_secs(1))
            .await
            .unwrap();
        let listing = run_projects(&repo, &owner, Locale::Es, Duration::from_secs(1))
            .await
            .unwrap();

        assert!(out.contains("Saved project #1 'Local comercial'"));
        assert!(listing.contains("Local comercial"));
        assert!(listing.contains("RD$180,000.00"));
    }

    #[tokio::test]
    async fn projects_listing_times_out() {
        let repo = StalledListing(MemoryRepository::new());
        let owner = OwnerId::new("ana").unwrap();

        let result = run_projects(&repo, &owner, Locale::Es, Duration::from_millis(20)).await;

        let err = result.expect_err("stalled listing must time out");
        assert!(err.to_string().contains("did not respond"), "got: {err}");
    }

    #[tokio::test]
    async fn estimate_rejects_oversized_quantity() {
        let command = EstimateCommand {
            area: "100".to_string(),
            materials: vec![MaterialArg {
                id: 1,
                quantity: Some(5_000_000_000),
            }],
            ..Default::default()
        };

        let result = run_estimate(&repo(), command, Locale::Es, Duration::from_secs(1)).await;

        let err = result.expect_err("quantity above u32 must be rejected");
        assert!(err.to_string().contains("out of range"), "got: {err}");
    }

    #[tokio::test]
    async fn estimate_rejects_huge_area_without_panicking() {
        let command = EstimateCommand {
            area: "1000000000000000000000000000".to_string(),
            ..Default::default()
        };

        let result = run_estimate(&repo(), command, Locale::Es, Duration::from_secs(1)).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn breakdown_lists_selected_lines() {
        let mut session = open_session(&repo(), Locale::En, Duration::from_secs(1)).await;
        session.set_area("10");
        session.calculate().unwrap();
        session.select_material(1).unwrap();

        let out = render_breakdown(&session).unwrap();

        assert!(out.contains("Grey cement"), "got:\n{out}");
        assert!(out.contains("DOP 12,500.00"), "got:\n{out}");
    }

    #[test]
    fn empty_projects_message() {
        assert_eq!(render_projects(&[], Locale::En).unwrap(), "No saved projects.\n");
    }
}
