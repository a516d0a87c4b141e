use std::collections::HashSet;
use std::io::Read;

use estimator_core::{Category, EstimatorRepository, LocalizedName, Material, RepositoryError};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when importing catalog data.
#[derive(Debug, Error)]
pub enum CatalogImportError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("Invalid record for id {id}: {reason}")]
    InvalidRecord { id: i64, reason: String },

    #[error("Category {category_id} for material {material_id} not found in database (have you run the seeds?)")]
    CategoryNotFound { material_id: i64, category_id: i64 },

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<csv::Error> for CatalogImportError {
    fn from(err: csv::Error) -> Self {
        CatalogImportError::CsvParse(err.to_string())
    }
}

/// A single row of the materials CSV file.
///
/// - `id`: stable material id; re-importing the same id updates the row
/// - `category_id`: an existing category id
/// - `name_es` / `name_en`: display names per locale
/// - `unit`: unit-of-measure label (e.g. `funda`, `m³`)
/// - `price`: final unit price in DOP
/// - `image_url`: optional, may be left empty
/// - `is_active`: optional, defaults to true; accepts true/false, 1/0, yes/no
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct MaterialRecord {
    pub id: i64,
    pub category_id: i64,
    pub name_es: String,
    pub name_en: String,
    pub unit: String,
    pub price: Decimal,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub image_url: Option<String>,
    #[serde(default = "default_active", deserialize_with = "deserialize_flag")]
    pub is_active: bool,
}

impl MaterialRecord {
    fn to_material(&self) -> Material {
        Material {
            id: self.id,
            name: LocalizedName::new(self.name_es.trim(), self.name_en.trim()),
            category_id: self.category_id,
            price: self.price,
            unit: self.unit.trim().to_string(),
            image_url: self.image_url.clone(),
            is_active: self.is_active,
        }
    }
}

/// A single row of the categories CSV file: `id,name_es,name_en`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CategoryRecord {
    pub id: i64,
    pub name_es: String,
    pub name_en: String,
}

fn default_active() -> bool {
    true
}

fn deserialize_optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    Ok(s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()))
}

fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s.as_deref().map(|s| s.trim().to_ascii_lowercase()) {
        None => Ok(true),
        Some(s) => match s.as_str() {
            "" | "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            other => Err(serde::de::Error::custom(format!("invalid flag '{other}'"))),
        },
    }
}

/// Loader for the material catalog from CSV files.
///
/// Records are written through the `EstimatorRepository` trait, so any
/// backend works. Loading upserts by id and is therefore idempotent.
pub struct MaterialCatalogLoader;

impl MaterialCatalogLoader {
    /// Parse material records from a CSV reader.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<MaterialRecord>, CatalogImportError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: MaterialRecord = result?;
            records.push(record);
        }

        Ok(records)
    }

    /// Parse category records from a CSV reader.
    pub fn parse_categories<R: Read>(
        reader: R
    ) -> Result<Vec<CategoryRecord>, CatalogImportError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: CategoryRecord = result?;
            records.push(record);
        }

        Ok(records)
    }

    /// Reject records that would put an unusable material in the catalog.
    pub fn validate(records: &[MaterialRecord]) -> Result<(), CatalogImportError> {
        let mut seen = HashSet::new();

        for record in records {
            let invalid = |reason: &str| CatalogImportError::InvalidRecord {
                id: record.id,
                reason: reason.to_string(),
            };

            if !seen.insert(record.id) {
                return Err(invalid("duplicate id"));
            }
            if record.price <= Decimal::ZERO {
                return Err(invalid("price must be greater than zero"));
            }
            if record.name_es.trim().is_empty() || record.name_en.trim().is_empty() {
                return Err(invalid("names must not be empty"));
            }
            if record.unit.trim().is_empty() {
                return Err(invalid("unit must not be empty"));
            }
        }

        Ok(())
    }

    /// Upsert categories. Returns the number of rows written.
    pub async fn load_categories<R: EstimatorRepository + ?Sized>(
        repo: &R,
        records: &[CategoryRecord],
    ) -> Result<usize, CatalogImportError> {
        for record in records {
            let category = Category {
                id: record.id,
                name: LocalizedName::new(record.name_es.trim(), record.name_en.trim()),
            };
            repo.upsert_category(&category).await?;
        }

        Ok(records.len())
    }

    /// Validate and upsert materials. Returns the number of rows written.
    ///
    /// Validation runs over the whole file first, so a bad row means
    /// nothing is written.
    pub async fn load<R: EstimatorRepository + ?Sized>(
        repo: &R,
        records: &[MaterialRecord],
    ) -> Result<usize, CatalogImportError> {
        Self::validate(records)?;

        let known: HashSet<i64> = repo
            .list_categories()
            .await?
            .into_iter()
            .map(|c| c.id)
            .collect();

        if let Some(orphan) = records.iter().find(|r| !known.contains(&r.category_id)) {
            return Err(CatalogImportError::CategoryNotFound {
                material_id: orphan.id,
                category_id: orphan.category_id,
            });
        }

        for record in records {
            repo.upsert_material(&record.to_material()).await?;
        }

        Ok(records.len())
    }
}

#[cfg(test)]
mod tests {
    use estimator_core::db::MemoryRepository;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    const HEADER: &str = "id,category_id,name_es,name_en,unit,price,image_url,is_active";

    fn csv(rows: &[&str]) -> String {
        let mut text = HEADER.to_string();
        for row in rows {
            text.push('\n');
            text.push_str(row);
        }
        text
    }

    fn category(id: i64) -> Category {
        Category {
            id,
            name: LocalizedName::new("Acero", "Steel"),
        }
    }

    #[test]
    fn test_parse_full_record() {
        let text = csv(&["3,2,Varilla 3/8,Rebar 3/8,unidad,310.75,https://cdn.example.com/v.png,true"]);

        let records = MaterialCatalogLoader::parse(text.as_bytes()).expect("Failed to parse CSV");

        assert_eq!(
            records,
            vec![MaterialRecord {
                id: 3,
                category_id: 2,
                name_es: "Varilla 3/8".to_string(),
                name_en: "Rebar 3/8".to_string(),
                unit: "unidad".to_string(),
                price: dec!(310.75),
                image_url: Some("https://cdn.example.com/v.png".to_string()),
                is_active: true,
            }]
        );
    }

    #[test]
    fn test_parse_optional_columns_default() {
        let text = csv(&["3,2,Varilla,Rebar,unidad,310.75,,"]);

        let records = MaterialCatalogLoader::parse(text.as_bytes()).expect("Failed to parse CSV");

        assert_eq!(records[0].image_url, None);
        assert!(records[0].is_active);
    }

    #[test]
    fn test_parse_inactive_flags() {
        let text = csv(&["1,2,A,A,u,1,,0", "2,2,B,B,u,1,,no", "3,2,C,C,u,1,,FALSE"]);

        let records = MaterialCatalogLoader::parse(text.as_bytes()).expect("Failed to parse CSV");

        assert!(records.iter().all(|r| !r.is_active));
    }

    #[test]
    fn test_parse_invalid_flag() {
        let text = csv(&["1,2,A,A,u,1,,maybe"]);

        let err = MaterialCatalogLoader::parse(text.as_bytes()).expect_err("Should reject flag");

        let CatalogImportError::CsvParse(msg) = err else {
            panic!("Expected CsvParse error, got: {:?}", err);
        };
        assert!(msg.contains("invalid flag"), "got: {}", msg);
    }

    #[test]
    fn test_parse_bad_price() {
        let text = csv(&["1,2,A,A,u,mucho,,"]);

        let result = MaterialCatalogLoader::parse(text.as_bytes());

        assert!(matches!(result, Err(CatalogImportError::CsvParse(_))));
    }

    #[test]
    fn test_parse_missing_column() {
        let text = "id,category_id,name_es\n1,2,A";

        let err = MaterialCatalogLoader::parse(text.as_bytes()).expect_err("Should fail");

        let CatalogImportError::CsvParse(msg) = err else {
            panic!("Expected CsvParse error, got: {:?}", err);
        };
        assert!(msg.contains("missing field"), "got: {}", msg);
    }

    #[test]
    fn test_parse_empty_csv() {
        let records = MaterialCatalogLoader::parse(csv(&[]).as_bytes()).expect("Failed to parse CSV");

        assert!(records.is_empty());
    }

    #[test]
    fn test_parse_categories() {
        let text = "id,name_es,name_en\n1,Cemento,Cement\n2,Acero,Steel";

        let records =
            MaterialCatalogLoader::parse_categories(text.as_bytes()).expect("Failed to parse CSV");

        assert_eq!(records.len(), 2);
        assert_eq!(records[1].name_en, "Steel");
    }

    #[test]
    fn test_validate_rejects_duplicate_ids() {
        let text = csv(&["1,2,A,A,u,1,,", "1,2,B,B,u,2,,"]);
        let records = MaterialCatalogLoader::parse(text.as_bytes()).unwrap();

        let result = MaterialCatalogLoader::validate(&records);

        assert!(matches!(
            result,
            Err(CatalogImportError::InvalidRecord { id: 1, ref reason }) if reason == "duplicate id"
        ));
    }

    #[test]
    fn test_validate_rejects_non_positive_price() {
        let text = csv(&["4,2,A,A,u,0,,"]);
        let records = MaterialCatalogLoader::parse(text.as_bytes()).unwrap();

        let result = MaterialCatalogLoader::validate(&records);

        assert!(matches!(result, Err(CatalogImportError::InvalidRecord { id: 4, .. })));
    }

    #[test]
    fn test_validate_rejects_blank_names() {
        let text = csv(&["4,2,  ,A,u,1,,"]);
        let records = MaterialCatalogLoader::parse(text.as_bytes()).unwrap();

        assert!(MaterialCatalogLoader::validate(&records).is_err());
    }

    #[tokio::test]
    async fn test_load_into_memory_repository() {
        let repo = MemoryRepository::with_catalog(vec![category(2)], vec![]);
        let text = csv(&["1,2,Varilla,Rebar,unidad,310.75,,", "2,2,Alambre,Wire,libra,95,,0"]);
        let records = MaterialCatalogLoader::parse(text.as_bytes()).unwrap();

        let written = MaterialCatalogLoader::load(&repo, &records).await.unwrap();

        assert_eq!(written, 2);
        let active = repo.list_active_materials().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].name.en, "Rebar");
    }

    #[tokio::test]
    async fn test_load_unknown_category_writes_nothing() {
        let repo = MemoryRepository::with_catalog(vec![category(2)], vec![]);
        let text = csv(&["1,2,A,A,u,1,,", "2,9,B,B,u,1,,"]);
        let records = MaterialCatalogLoader::parse(text.as_bytes()).unwrap();

        let result = MaterialCatalogLoader::load(&repo, &records).await;

        assert!(matches!(
            result,
            Err(CatalogImportError::CategoryNotFound { material_id: 2, category_id: 9 })
        ));
        assert!(repo.list_active_materials().await.unwrap().is_empty());
    }
}
