use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::line_total;

/// One line item of an estimate.
///
/// `unit_price` is captured when the material is first selected and never
/// re-read from the catalog afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedMaterial {
    pub material_id: i64,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

impl SelectedMaterial {
    pub fn new(
        material_id: i64,
        name: impl Into<String>,
        unit_price: Decimal,
    ) -> Self {
        Self {
            material_id,
            name: name.into(),
            quantity: 1,
            unit_price,
            line_total: unit_price,
        }
    }

    /// The same line item with another quantity, or `None` when the line
    /// total would not fit in a `Decimal`.
    pub fn with_quantity(
        &self,
        quantity: u32,
    ) -> Option<Self> {
        Some(Self {
            quantity,
            line_total: line_total(quantity, self.unit_price)?,
            ..self.clone()
        })
    }
}
