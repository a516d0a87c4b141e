use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::LocalizedName;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: LocalizedName,
}

/// Catalog entry available for selection into an estimate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Material {
    pub id: i64,
    pub name: LocalizedName,
    pub category_id: i64,
    /// Final unit price in DOP.
    pub price: Decimal,
    /// Unit-of-measure label (e.g. "saco", "m³").
    pub unit: String,
    pub image_url: Option<String>,
    pub is_active: bool,
}
