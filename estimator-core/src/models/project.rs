use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{ProjectType, SelectedMaterial};

/// Identity of the authenticated operator that owns saved projects.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    /// Returns `None` for blank identities.
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            None
        } else {
            Some(Self(id.trim().to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OwnerId {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub owner_id: OwnerId,
    pub name: String,
    pub area: Decimal,
    pub project_type: ProjectType,
    pub base_cost: Decimal,
    pub materials_cost: Decimal,
    pub total_cost: Decimal,
    pub materials: Vec<SelectedMaterial>,
    pub created_at: DateTime<Utc>,
}

/// For creating new projects (no id or timestamp)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProject {
    pub owner_id: OwnerId,
    pub name: String,
    pub area: Decimal,
    pub project_type: ProjectType,
    pub base_cost: Decimal,
    pub materials_cost: Decimal,
    pub total_cost: Decimal,
    pub materials: Vec<SelectedMaterial>,
}
