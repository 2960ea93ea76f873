//! Health calculations
//!
//! Pure formulas, the calculated-metric engine, and activity energy
//! accounting.

pub mod activity;
pub mod engine;
pub mod formulas;

/// Round to one decimal place (engine output boundary)
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Round to two decimal places (activity multipliers)
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
