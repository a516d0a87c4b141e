//! Pure cost functions of the estimation engine.
//!
//! | Quantity        | Formula                               |
//! |-----------------|---------------------------------------|
//! | Base cost       | area (m²) × rate for the project type |
//! | Line total      | quantity × unit price                 |
//! | Materials cost  | Σ line totals                         |
//! | Total cost      | base cost + materials cost            |
//!
//! Rates are fixed: residential DOP 1,200/m², commercial DOP 1,800/m².
//!
//! Every function returns `None` when its result does not fit in a
//! [`Decimal`] instead of panicking.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use estimator_core::ProjectType;
//! use estimator_core::calculations::{compute_base_cost, total_cost};
//!
//! let base = compute_base_cost(dec!(100), ProjectType::Residential).unwrap();
//! assert_eq!(base, dec!(120000));
//! assert_eq!(total_cost(base, dec!(1000)), Some(dec!(121000)));
//! ```

use rust_decimal::Decimal;

use super::common::normalize_decimal_input;
use crate::models::{ProjectType, SelectedMaterial};

/// DOP per square meter for residential work.
pub const RESIDENTIAL_RATE: Decimal = Decimal::from_parts(1200, 0, 0, false, 0);

/// DOP per square meter for commercial work.
pub const COMMERCIAL_RATE: Decimal = Decimal::from_parts(1800, 0, 0, false, 0);

pub fn rate_per_square_meter(project_type: ProjectType) -> Decimal {
    match project_type {
        ProjectType::Residential => RESIDENTIAL_RATE,
        ProjectType::Commercial => COMMERCIAL_RATE,
    }
}

/// Parses operator-entered area text.
///
/// Returns `None` for empty, non-numeric, zero, or negative input. Commas
/// are accepted as thousands separators.
pub fn parse_area(input: &str) -> Option<Decimal> {
    let normalized = normalize_decimal_input(input);
    let area: Decimal = normalized.parse().ok()?;
    (area > Decimal::ZERO).then_some(area)
}

/// Base cost of a project before any materials are added.
///
/// Returns `None` when `area` is not strictly positive or the cost does not
/// fit; callers treat that as "leave the previous estimate untouched".
pub fn compute_base_cost(
    area: Decimal,
    project_type: ProjectType,
) -> Option<Decimal> {
    if area <= Decimal::ZERO {
        return None;
    }
    area.checked_mul(rate_per_square_meter(project_type))
}

pub fn line_total(
    quantity: u32,
    unit_price: Decimal,
) -> Option<Decimal> {
    Decimal::from(quantity).checked_mul(unit_price)
}

/// Sum of line totals. Empty input yields zero.
pub fn materials_cost<'a, I>(items: I) -> Option<Decimal>
where
    I: IntoIterator<Item = &'a SelectedMaterial>,
{
    items
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, item| acc.checked_add(item.line_total))
}

pub fn total_cost(
    base_cost: Decimal,
    materials_cost: Decimal,
) -> Option<Decimal> {
    base_cost.checked_add(materials_cost)
}
