//! Working state of one calculation session.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::cost::{compute_base_cost, total_cost};
use crate::models::{ProjectType, SelectedMaterial};
use crate::selection::Selection;

/// The in-session estimate.
///
/// The base cost only exists after an explicit [`Estimate::calculate`];
/// changing the area or project type afterwards clears it again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Estimate {
    area: Option<Decimal>,
    project_type: ProjectType,
    base_cost: Option<Decimal>,
}

/// Immutable copy of a calculated estimate, ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimateSnapshot {
    pub area: Decimal,
    pub project_type: ProjectType,
    pub base_cost: Decimal,
    pub materials_cost: Decimal,
    pub total_cost: Decimal,
    pub materials: Vec<SelectedMaterial>,
}

impl Estimate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn area(&self) -> Option<Decimal> {
        self.area
    }

    pub fn project_type(&self) -> ProjectType {
        self.project_type
    }

    pub fn is_calculated(&self) -> bool {
        self.base_cost.is_some()
    }

    /// Updates the area input, resetting the estimate if it changed.
    pub fn set_area(
        &mut self,
        area: Option<Decimal>,
    ) {
        if self.area != area {
            self.area = area;
            self.reset();
        }
    }

    /// Updates the project type, resetting the estimate if it changed.
    pub fn set_project_type(
        &mut self,
        project_type: ProjectType,
    ) {
        if self.project_type != project_type {
            self.project_type = project_type;
            self.reset();
        }
    }

    /// Computes the base cost for `area` and `project_type`.
    ///
    /// An invalid area, or one whose cost does not fit in a `Decimal`,
    /// leaves the estimate exactly as it was and returns `None`.
    pub fn calculate(
        &mut self,
        area: Decimal,
        project_type: ProjectType,
    ) -> Option<Decimal> {
        let base = compute_base_cost(area, project_type)?;
        self.area = Some(area);
        self.project_type = project_type;
        self.base_cost = Some(base);
        Some(base)
    }

    pub fn reset(&mut self) {
        self.base_cost = None;
    }

    /// Base cost, zero until calculated.
    pub fn base_cost(&self) -> Decimal {
        self.base_cost.unwrap_or(Decimal::ZERO)
    }

    pub fn materials_cost(
        &self,
        selection: &Selection,
    ) -> Decimal {
        selection.materials_cost()
    }

    /// Base plus materials; `None` when the sum does not fit.
    pub fn total_cost(
        &self,
        selection: &Selection,
    ) -> Option<Decimal> {
        total_cost(self.base_cost(), selection.materials_cost())
    }

    /// Snapshot for persistence; `None` until the estimate has been
    /// calculated or when the total does not fit.
    pub fn snapshot(
        &self,
        selection: &Selection,
    ) -> Option<EstimateSnapshot> {
        let base_cost = self.base_cost?;
        let area = self.area?;
        let materials_cost = selection.materials_cost();
        Some(EstimateSnapshot {
            area,
            project_type: self.project_type,
            base_cost,
            materials_cost,
            total_cost: total_cost(base_cost, materials_cost)?,
            materials: selection.to_line_items(),
        })
    }
}
