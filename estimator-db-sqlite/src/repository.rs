use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use estimator_core::{
    AnalyticsEvent, Category, EstimatorRepository, LocalizedName, Material, NewAnalyticsEvent,
    NewProject, OwnerId, Project, ProjectType, RepositoryError, SelectedMaterial,
};
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use tracing::debug;

use crate::decimal::get_decimal;

pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Connects to `database_url`, creating the database file if needed.
    ///
    /// Accepts sqlx URLs (`sqlite:estimator.db?mode=rwc`), bare paths and
    /// `:memory:`. An in-memory database is limited to one connection so
    /// every query sees the same data.
    pub async fn new(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("Invalid database URL: {}", database_url))?
            .create_if_missing(true);

        let in_memory = database_url.contains(":memory:");
        let pool = SqlitePoolOptions::new()
            .max_connections(if in_memory { 1 } else { 5 })
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to connect to database: {}", database_url))?;
        Ok(Self { pool })
    }

    pub async fn new_with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    /// Load and execute all SQL seed files from the specified directory.
    /// Files are executed in alphabetical order by filename.
    pub async fn run_seeds(
        &self,
        seeds_dir: &Path,
    ) -> Result<()> {
        let mut entries: Vec<_> = std::fs::read_dir(seeds_dir)
            .with_context(|| format!("Failed to read seeds directory '{}'", seeds_dir.display()))?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "sql"))
            .collect();

        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries {
            let path = entry.path();
            let sql = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read seed file '{}'", path.display()))?;

            sqlx::raw_sql(&sql)
                .execute(&self.pool)
                .await
                .with_context(|| format!("Failed to execute seed file '{}'", path.display()))?;
            debug!(file = %path.display(), "applied seed file");
        }

        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn db_error(e: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::Database(e.to_string())
}

fn row_to_material(row: &SqliteRow) -> Result<Material, RepositoryError> {
    Ok(Material {
        id: row.try_get("id").map_err(db_error)?,
        name: LocalizedName {
            es: row.try_get("name_es").map_err(db_error)?,
            en: row.try_get("name_en").map_err(db_error)?,
        },
        category_id: row.try_get("category_id").map_err(db_error)?,
        price: get_decimal(row, "price")?,
        unit: row.try_get("unit").map_err(db_error)?,
        image_url: row.try_get("image_url").map_err(db_error)?,
        is_active: row.try_get("is_active").map_err(db_error)?,
    })
}

fn row_to_owner(row: &SqliteRow) -> Result<OwnerId, RepositoryError> {
    let owner: String = row.try_get("owner_id").map_err(db_error)?;
    OwnerId::new(owner).ok_or_else(|| RepositoryError::Database("Empty owner_id".to_string()))
}

fn row_to_project(row: &SqliteRow) -> Result<Project, RepositoryError> {
    let project_type: String = row.try_get("project_type").map_err(db_error)?;
    let project_type = ProjectType::parse(&project_type).ok_or_else(|| {
        RepositoryError::Database(format!("Invalid project type: {}", project_type))
    })?;

    let materials: String = row.try_get("materials").map_err(db_error)?;
    let materials: Vec<SelectedMaterial> = serde_json::from_str(&materials)
        .map_err(|e| RepositoryError::Database(format!("Invalid line items JSON: {}", e)))?;

    Ok(Project {
        id: row.try_get("id").map_err(db_error)?,
        owner_id: row_to_owner(row)?,
        name: row.try_get("name").map_err(db_error)?,
        area: get_decimal(row, "area")?,
        project_type,
        base_cost: get_decimal(row, "base_cost")?,
        materials_cost: get_decimal(row, "materials_cost")?,
        total_cost: get_decimal(row, "total_cost")?,
        materials,
        created_at: row
            .try_get::<DateTime<Utc>, _>("created_at")
            .map_err(|e| RepositoryError::Database(format!("Failed to get created_at: {}", e)))?,
    })
}

fn row_to_event(row: &SqliteRow) -> Result<AnalyticsEvent, RepositoryError> {
    let metadata: String = row.try_get("metadata").map_err(db_error)?;
    let metadata = serde_json::from_str(&metadata)
        .map_err(|e| RepositoryError::Database(format!("Invalid metadata JSON: {}", e)))?;

    Ok(AnalyticsEvent {
        id: row.try_get("id").map_err(db_error)?,
        event_type: row.try_get("event_type").map_err(db_error)?,
        owner_id: row_to_owner(row)?,
        metadata,
        created_at: row
            .try_get::<DateTime<Utc>, _>("created_at")
            .map_err(|e| RepositoryError::Database(format!("Failed to get created_at: {}", e)))?,
    })
}

const MATERIAL_COLUMNS: &str =
    "id, category_id, name_es, name_en, price, unit, image_url, is_active";

const PROJECT_COLUMNS: &str = "id, owner_id, name, area, project_type, base_cost, \
     materials_cost, total_cost, materials, created_at";

#[async_trait]
impl EstimatorRepository for SqliteRepository {
    async fn list_active_materials(&self) -> Result<Vec<Material>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {MATERIAL_COLUMNS} FROM materials WHERE is_active = 1 ORDER BY category_id, id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.iter().map(row_to_material).collect()
    }

    async fn get_material(
        &self,
        id: i64,
    ) -> Result<Material, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {MATERIAL_COLUMNS} FROM materials WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .ok_or(RepositoryError::NotFound)?;

        row_to_material(&row)
    }

    async fn upsert_material(
        &self,
        material: &Material,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO materials (id, category_id, name_es, name_en, price, unit, image_url, is_active)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                category_id = excluded.category_id,
                name_es = excluded.name_es,
                name_en = excluded.name_en,
                price = excluded.price,
                unit = excluded.unit,
                image_url = excluded.image_url,
                is_active = excluded.is_active",
        )
        .bind(material.id)
        .bind(material.category_id)
        .bind(&material.name.es)
        .bind(&material.name.en)
        .bind(material.price.to_string())
        .bind(&material.unit)
        .bind(material.image_url.as_deref())
        .bind(material.is_active)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query("SELECT id, name_es, name_en FROM categories ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;

        rows.iter()
            .map(|row| -> Result<Category, RepositoryError> {
                Ok(Category {
                    id: row.try_get("id").map_err(db_error)?,
                    name: LocalizedName {
                        es: row.try_get("name_es").map_err(db_error)?,
                        en: row.try_get("name_en").map_err(db_error)?,
                    },
                })
            })
            .collect()
    }

    async fn upsert_category(
        &self,
        category: &Category,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO categories (id, name_es, name_en) VALUES (?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET name_es = excluded.name_es, name_en = excluded.name_en",
        )
        .bind(category.id)
        .bind(&category.name.es)
        .bind(&category.name.en)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(())
    }

    async fn create_project(
        &self,
        project: NewProject,
    ) -> Result<Project, RepositoryError> {
        let materials = serde_json::to_string(&project.materials)
            .map_err(|e| RepositoryError::Database(format!("Failed to encode line items: {}", e)))?;
        let created_at = Utc::now();

        let result = sqlx::query(
            "INSERT INTO projects (
                owner_id, name, area, project_type, base_cost, materials_cost,
                total_cost, materials, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(project.owner_id.as_str())
        .bind(&project.name)
        .bind(project.area.to_string())
        .bind(project.project_type.as_str())
        .bind(project.base_cost.to_string())
        .bind(project.materials_cost.to_string())
        .bind(project.total_cost.to_string())
        .bind(&materials)
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        let id = result.last_insert_rowid();
        debug!(project_id = id, "inserted project");

        Ok(Project {
            id,
            owner_id: project.owner_id,
            name: project.name,
            area: project.area,
            project_type: project.project_type,
            base_cost: project.base_cost,
            materials_cost: project.materials_cost,
            total_cost: project.total_cost,
            materials: project.materials,
            created_at,
        })
    }

    async fn get_project(
        &self,
        id: i64,
    ) -> Result<Project, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .ok_or(RepositoryError::NotFound)?;

        row_to_project(&row)
    }

    async fn list_projects(
        &self,
        owner_id: &OwnerId,
    ) -> Result<Vec<Project>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE owner_id = ? ORDER BY id DESC"
        ))
        .bind(owner_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.iter().map(row_to_project).collect()
    }

    async fn create_analytics_event(
        &self,
        event: NewAnalyticsEvent,
    ) -> Result<AnalyticsEvent, RepositoryError> {
        let metadata = serde_json::to_string(&event.metadata)
            .map_err(|e| RepositoryError::Database(format!("Failed to encode metadata: {}", e)))?;
        let created_at = Utc::now();

        let result = sqlx::query(
            "INSERT INTO analytics_events (event_type, owner_id, metadata, created_at)
             VALUES (?, ?, ?, ?)",
        )
        .bind(&event.event_type)
        .bind(event.owner_id.as_str())
        .bind(&metadata)
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(AnalyticsEvent {
            id: result.last_insert_rowid(),
            event_type: event.event_type,
            owner_id: event.owner_id,
            metadata: event.metadata,
            created_at,
        })
    }

    async fn list_analytics_events(
        &self,
        owner_id: &OwnerId,
    ) -> Result<Vec<AnalyticsEvent>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, event_type, owner_id, metadata, created_at
             FROM analytics_events WHERE owner_id = ? ORDER BY id",
        )
        .bind(owner_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.iter().map(row_to_event).collect()
    }
}
