//! Fixed health formulas
//!
//! Pure functions with no storage dependency. The calculator tool and the
//! daily activity summary both go through these.

use serde::{Deserialize, Serialize};

use crate::models::calculator::ActivityLevel;
use crate::models::profile::Gender;

/// BMI category with the standard WHO boundaries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

impl BmiCategory {
    pub fn display_name(&self) -> &'static str {
        match self {
            BmiCategory::Underweight => "Underweight",
            BmiCategory::Normal => "Normal",
            BmiCategory::Overweight => "Overweight",
            BmiCategory::Obese => "Obese",
        }
    }

    /// Classify a BMI value. Boundaries are 18.5, 25, and 30; each
    /// boundary value belongs to the higher category.
    pub fn classify(bmi: f64) -> Self {
        if bmi < 18.5 {
            BmiCategory::Underweight
        } else if bmi < 25.0 {
            BmiCategory::Normal
        } else if bmi < 30.0 {
            BmiCategory::Overweight
        } else {
            BmiCategory::Obese
        }
    }
}

/// Body Mass Index: weight / (height in meters)²
pub fn bmi(weight_kg: f64, height_cm: f64) -> Option<f64> {
    if weight_kg <= 0.0 || height_cm <= 0.0 {
        return None;
    }
    let height_m = height_cm / 100.0;
    Some(weight_kg / (height_m * height_m))
}

/// Lean Body Mass: weight × (1 − bf%/100). None unless body fat is known
/// and positive.
pub fn lean_body_mass(weight_kg: f64, body_fat_pct: f64) -> Option<f64> {
    if weight_kg <= 0.0 || body_fat_pct <= 0.0 || body_fat_pct > 100.0 {
        return None;
    }
    Some(weight_kg * (1.0 - body_fat_pct / 100.0))
}

/// Body fat mass: weight × bf%/100
pub fn body_fat_mass(weight_kg: f64, body_fat_pct: f64) -> Option<f64> {
    if weight_kg <= 0.0 || !(0.0..=100.0).contains(&body_fat_pct) {
        return None;
    }
    Some(weight_kg * (body_fat_pct / 100.0))
}

/// Basal Metabolic Rate, Mifflin-St Jeor equation
pub fn bmr(weight_kg: f64, height_cm: f64, age_years: u32, gender: Gender) -> f64 {
    let base = 10.0 * weight_kg + 6.25 * height_cm - 5.0 * age_years as f64;
    match gender {
        Gender::Male => base + 5.0,
        Gender::Female => base - 161.0,
    }
}

/// Total Daily Energy Expenditure: BMR scaled by the activity level
pub fn tdee(bmr: f64, level: ActivityLevel) -> f64 {
    bmr * level.multiplier()
}

/// TDEE from a free-form activity level string; unrecognized levels fall
/// back to moderately active (1.55).
pub fn tdee_from_str(bmr: f64, level: &str) -> f64 {
    let level = ActivityLevel::from_str(level).unwrap_or(ActivityLevel::ModeratelyActive);
    tdee(bmr, level)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bmi() {
        let value = bmi(70.0, 170.0).unwrap();
        assert!((value - 24.221453287197235).abs() < 1e-9);

        assert!(bmi(0.0, 170.0).is_none());
        assert!(bmi(70.0, 0.0).is_none());
    }

    #[test]
    fn test_bmi_category_boundaries() {
        assert_eq!(BmiCategory::classify(18.4), BmiCategory::Underweight);
        assert_eq!(BmiCategory::classify(18.5), BmiCategory::Normal);
        assert_eq!(BmiCategory::classify(24.9), BmiCategory::Normal);
        assert_eq!(BmiCategory::classify(25.0), BmiCategory::Overweight);
        assert_eq!(BmiCategory::classify(29.9), BmiCategory::Overweight);
        assert_eq!(BmiCategory::classify(30.0), BmiCategory::Obese);
    }

    #[test]
    fn test_lbm_requires_positive_body_fat() {
        assert!(lean_body_mass(80.0, 0.0).is_none());
        let value = lean_body_mass(80.0, 25.0).unwrap();
        assert!((value - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_lbm_plus_fat_mass_equals_weight() {
        for bf in [5.0, 22.0, 50.0, 100.0] {
            let lbm = lean_body_mass(80.0, bf).unwrap();
            let fat = body_fat_mass(80.0, bf).unwrap();
            assert!((lbm + fat - 80.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_bmr_mifflin_st_jeor() {
        // 10*70 + 6.25*170 - 5*30 + 5 = 1617.5
        let male = bmr(70.0, 170.0, 30, Gender::Male);
        assert!((male - 1617.5).abs() < 1e-9);

        let female = bmr(70.0, 170.0, 30, Gender::Female);
        assert!((female - 1451.5).abs() < 1e-9);
    }

    #[test]
    fn test_tdee() {
        let value = tdee(1980.0, ActivityLevel::ModeratelyActive);
        assert!((value - 3069.0).abs() < 1e-9);

        let value = tdee(1980.0, ActivityLevel::Sedentary);
        assert!((value - 2376.0).abs() < 1e-9);
    }

    #[test]
    fn test_tdee_unknown_level_defaults_to_moderate() {
        let value = tdee_from_str(1980.0, "couch_potato");
        assert!((value - 3069.0).abs() < 1e-9);
    }
}
