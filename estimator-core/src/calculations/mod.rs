//! Cost calculations for construction estimates.
//!
//! This module provides the arithmetic of the estimator: base cost from
//! area and project type, line totals, and the aggregate costs of a
//! material selection.

pub mod common;
pub mod cost;
pub mod estimate;

pub use cost::{
    COMMERCIAL_RATE, RESIDENTIAL_RATE, compute_base_cost, line_total, materials_cost, parse_area,
    rate_per_square_meter, total_cost,
};
pub use estimate::{Estimate, EstimateSnapshot};
