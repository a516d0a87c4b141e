//! The set of materials picked into the current estimate.
//!
//! Entries are keyed by material id, so a material appears at most once;
//! selecting it again bumps its quantity. Iteration follows first-selection
//! order so sums and listings are stable.

use std::collections::HashMap;

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::debug;

use crate::models::{Locale, Material, SelectedMaterial};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("quantity {quantity} for material {material_id} is out of range")]
    QuantityOutOfRange { material_id: i64, quantity: i64 },

    #[error("cost of material {0} is too large")]
    CostOverflow(i64),
}

/// Selected line items plus their running total.
///
/// A change that would make a line total or the materials cost overflow is
/// rejected and leaves the selection as it was.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    entries: HashMap<i64, SelectedMaterial>,
    order: Vec<i64>,
    total: Decimal,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one unit of `material`.
    ///
    /// The first selection copies the catalog price and the name in
    /// `locale`; later selections only increment the quantity, keeping the
    /// original unit price.
    pub fn add(
        &mut self,
        material: &Material,
        locale: Locale,
    ) -> Result<&SelectedMaterial, SelectionError> {
        let id = material.id;
        let entry = match self.entries.get(&id) {
            Some(existing) => {
                let quantity = existing.quantity.checked_add(1).ok_or(
                    SelectionError::QuantityOutOfRange {
                        material_id: id,
                        quantity: i64::from(existing.quantity) + 1,
                    },
                )?;
                existing
                    .with_quantity(quantity)
                    .ok_or(SelectionError::CostOverflow(id))?
            }
            None => SelectedMaterial::new(id, material.name.resolve(locale), material.price),
        };
        self.commit(entry)?;
        debug!(material_id = id, quantity = self.entries[&id].quantity, "selected material");
        Ok(&self.entries[&id])
    }

    /// Overwrites the quantity of an existing line item.
    ///
    /// A quantity of zero or less removes the item. Unknown ids are ignored.
    /// Quantities above `u32::MAX` are rejected, never clamped.
    pub fn set_quantity(
        &mut self,
        material_id: i64,
        quantity: i64,
    ) -> Result<(), SelectionError> {
        if quantity <= 0 {
            self.remove(material_id);
            return Ok(());
        }
        let Some(existing) = self.entries.get(&material_id) else {
            return Ok(());
        };
        let count = u32::try_from(quantity).map_err(|_| SelectionError::QuantityOutOfRange {
            material_id,
            quantity,
        })?;
        let entry = existing
            .with_quantity(count)
            .ok_or(SelectionError::CostOverflow(material_id))?;
        self.commit(entry)?;
        debug!(material_id, quantity, "updated selected quantity");
        Ok(())
    }

    /// Removes a line item. Absent ids are a no-op.
    pub fn remove(
        &mut self,
        material_id: i64,
    ) {
        if let Some(entry) = self.entries.remove(&material_id) {
            self.order.retain(|id| *id != material_id);
            self.total = self.total.saturating_sub(entry.line_total);
            debug!(material_id, "removed selected material");
        }
    }

    fn commit(
        &mut self,
        entry: SelectedMaterial,
    ) -> Result<(), SelectionError> {
        let id = entry.material_id;
        let replaced = self
            .entries
            .get(&id)
            .map_or(Decimal::ZERO, |old| old.line_total);
        self.total = self
            .total
            .saturating_sub(replaced)
            .checked_add(entry.line_total)
            .ok_or(SelectionError::CostOverflow(id))?;
        if self.entries.insert(id, entry).is_none() {
            self.order.push(id);
        }
        Ok(())
    }

    pub fn get(
        &self,
        material_id: i64,
    ) -> Option<&SelectedMaterial> {
        self.entries.get(&material_id)
    }

    pub fn contains(
        &self,
        material_id: i64,
    ) -> bool {
        self.entries.contains_key(&material_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
        self.total = Decimal::ZERO;
    }

    /// Line items in first-selection order.
    pub fn items(&self) -> impl Iterator<Item = &SelectedMaterial> {
        self.order.iter().filter_map(|id| self.entries.get(id))
    }

    pub fn materials_cost(&self) -> Decimal {
        self.total
    }

    /// Ordered list of line items as stored with a project.
    pub fn to_line_items(&self) -> Vec<SelectedMaterial> {
        self.items().cloned().collect()
    }
}
