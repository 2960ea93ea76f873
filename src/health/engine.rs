//! Calculated-metric engine
//!
//! Evaluates a calculated metric's formula against the latest recorded
//! observations. Variables resolve in this order:
//!
//! 1. the latest observation for the metric with that symbolic id
//!    (log / current / baseline rows only, newest timestamp wins)
//! 2. synthesized values: AGE and GENDER from the profile,
//!    ACTIVITY_MULTIPLIER from today's logged activities
//! 3. another calculated metric's formula, evaluated recursively with a
//!    visited-set cycle guard and a depth limit
//!
//! Anything still unresolved makes the whole result unavailable (None),
//! never an error or a panic.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::Utc;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::db::DbResult;
use crate::formula::Formula;
use crate::health::{activity, round1, round2};
use crate::models::metric::Metric;
use crate::models::metric_value::MetricValue;
use crate::models::profile::Profile;

/// Recursion limit for calculated metrics referencing calculated metrics
const MAX_DEPTH: usize = 8;

/// Output of one engine evaluation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculatedResult {
    pub metric_id: i64,
    pub symbol: Option<String>,
    pub name: String,
    pub unit: String,
    pub value: f64,
    pub formula: String,
    /// Variable bindings the formula was evaluated against
    pub inputs: BTreeMap<String, f64>,
}

/// Evaluate a calculated metric. Returns None when the metric isn't
/// calculated or any input is unavailable.
pub fn evaluate(conn: &Connection, metric: &Metric) -> DbResult<Option<CalculatedResult>> {
    if !metric.is_calculated || metric.calculation_formula.is_empty() {
        return Ok(None);
    }

    let formula = match Formula::parse(&metric.calculation_formula) {
        Ok(f) => f,
        Err(e) => {
            debug!(metric = %metric.name, error = %e, "formula does not parse");
            return Ok(None);
        }
    };

    let mut vars = base_variables(conn)?;
    let mut visited = HashSet::new();
    if let Some(symbol) = &metric.metric_id {
        visited.insert(symbol.clone());
    }

    let value = match evaluate_parsed(conn, &formula, &mut vars, &mut visited, 0)? {
        Some(v) => v,
        None => return Ok(None),
    };

    let mut inputs = BTreeMap::new();
    for name in formula.variables() {
        if let Some(v) = vars.get(&name) {
            inputs.insert(name, *v);
        }
    }

    Ok(Some(CalculatedResult {
        metric_id: metric.id,
        symbol: metric.metric_id.clone(),
        name: metric.name.clone(),
        unit: metric.unit.clone(),
        value: round1(value),
        formula: metric.calculation_formula.clone(),
        inputs,
    }))
}

/// Evaluate the calculated metric with the given symbolic id
pub fn evaluate_symbol(conn: &Connection, symbol: &str) -> DbResult<Option<CalculatedResult>> {
    match Metric::get_by_symbol(conn, symbol)? {
        Some(metric) => evaluate(conn, &metric),
        None => Ok(None),
    }
}

/// Latest observations keyed by symbolic id, plus profile-derived AGE and
/// GENDER when available.
fn base_variables(conn: &Connection) -> DbResult<HashMap<String, f64>> {
    let mut vars = HashMap::new();

    for obs in MetricValue::latest_observations(conn)? {
        if let Some(symbol) = obs.symbol {
            vars.insert(symbol, obs.value);
        }
    }

    if let Some(profile) = Profile::get(conn)? {
        if let Some(age) = profile.age() {
            vars.entry("AGE".to_string()).or_insert(age as f64);
        }
        if let Some(gender) = profile.gender {
            vars.entry("GENDER".to_string())
                .or_insert(gender.as_formula_value());
        }
    }

    Ok(vars)
}

fn evaluate_parsed(
    conn: &Connection,
    formula: &Formula,
    vars: &mut HashMap<String, f64>,
    visited: &mut HashSet<String>,
    depth: usize,
) -> DbResult<Option<f64>> {
    if depth > MAX_DEPTH {
        debug!("formula recursion limit reached");
        return Ok(None);
    }

    for name in formula.variables() {
        if vars.contains_key(&name) {
            continue;
        }
        match resolve_variable(conn, &name, vars, visited, depth)? {
            Some(value) => {
                vars.insert(name, value);
            }
            None => {
                debug!(variable = %name, "formula variable unavailable");
                return Ok(None);
            }
        }
    }

    match formula.evaluate(vars) {
        Ok(v) if v.is_finite() => Ok(Some(v)),
        Ok(_) => Ok(None),
        Err(e) => {
            debug!(error = %e, "formula evaluation failed");
            Ok(None)
        }
    }
}

fn resolve_variable(
    conn: &Connection,
    name: &str,
    vars: &mut HashMap<String, f64>,
    visited: &mut HashSet<String>,
    depth: usize,
) -> DbResult<Option<f64>> {
    if name == "ACTIVITY_MULTIPLIER" {
        return activity_multiplier_today(conn, vars, visited, depth);
    }

    if visited.contains(name) {
        debug!(variable = %name, "formula cycle detected");
        return Ok(None);
    }

    let metric = match Metric::get_by_symbol(conn, name)? {
        Some(m) => m,
        None => return Ok(None),
    };
    if !metric.is_calculated || metric.calculation_formula.is_empty() {
        return Ok(None);
    }

    let formula = match Formula::parse(&metric.calculation_formula) {
        Ok(f) => f,
        Err(_) => return Ok(None),
    };

    visited.insert(name.to_string());
    evaluate_parsed(conn, &formula, vars, visited, depth + 1)
}

/// Multiplier from today's logged activities: (BMR + calories) / BMR,
/// two decimals; sedentary 1.2 when nothing is logged or BMR is
/// unavailable.
fn activity_multiplier_today(
    conn: &Connection,
    vars: &mut HashMap<String, f64>,
    visited: &mut HashSet<String>,
    depth: usize,
) -> DbResult<Option<f64>> {
    let today = Utc::now().format("%Y-%m-%d").to_string();
    let (calories, has_activities) = activity::logged_calories_total(conn, &today)?;
    if !has_activities {
        return Ok(Some(activity::SEDENTARY_MULTIPLIER));
    }

    let bmr = match vars.get("BMR").copied() {
        Some(v) => Some(v),
        None => {
            let resolved = resolve_variable(conn, "BMR", vars, visited, depth)?;
            if let Some(v) = resolved {
                vars.insert("BMR".to_string(), v);
            }
            resolved
        }
    };

    match bmr {
        Some(b) if b > 0.0 => Ok(Some(round2((b + calories) / b))),
        _ => Ok(Some(activity::SEDENTARY_MULTIPLIER)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use crate::health::formulas;
    use crate::models::activity::{ActivityRecordCreate, ActivityType};
    use crate::models::metric::{MetricCreate, MetricType};
    use crate::models::metric_value::{MeasurementType, MetricValueCreate};
    use crate::models::profile::Gender;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    fn log(conn: &Connection, symbol: &str, value: f64) {
        let metric = Metric::get_by_symbol(conn, symbol).unwrap().unwrap();
        MetricValue::create(
            conn,
            &MetricValueCreate {
                metric_id: metric.id,
                value,
                measurement_type: MeasurementType::Log,
                status: None,
                notes: None,
                source: None,
                calculation_inputs: None,
                timestamp: None,
            },
        )
        .unwrap();
    }

    #[test]
    fn test_bmi_from_observations() {
        let conn = test_conn();
        log(&conn, "WEIGHT", 70.0);
        log(&conn, "HEIGHT", 170.0);

        let result = evaluate_symbol(&conn, "BMI").unwrap().unwrap();
        assert_eq!(result.value, 24.2);
        assert_eq!(result.inputs.get("WEIGHT"), Some(&70.0));
        assert_eq!(result.inputs.get("HEIGHT"), Some(&170.0));
    }

    #[test]
    fn test_missing_observation_yields_none() {
        let conn = test_conn();
        log(&conn, "WEIGHT", 70.0);
        // No HEIGHT recorded
        assert!(evaluate_symbol(&conn, "BMI").unwrap().is_none());
    }

    #[test]
    fn test_bmr_uses_profile_age_and_gender() {
        let conn = test_conn();
        log(&conn, "WEIGHT", 70.0);
        log(&conn, "HEIGHT", 170.0);
        let profile = Profile::set(&conn, "Alex", Some("1990-06-15"), Some(Gender::Male)).unwrap();
        let age = profile.age().unwrap();

        let result = evaluate_symbol(&conn, "BMR").unwrap().unwrap();
        let expected = round1(formulas::bmr(70.0, 170.0, age, Gender::Male));
        assert_eq!(result.value, expected);
    }

    #[test]
    fn test_bmr_unavailable_without_profile() {
        let conn = test_conn();
        log(&conn, "WEIGHT", 70.0);
        log(&conn, "HEIGHT", 170.0);
        assert!(evaluate_symbol(&conn, "BMR").unwrap().is_none());
    }

    #[test]
    fn test_tdee_resolves_bmr_recursively() {
        let conn = test_conn();
        log(&conn, "WEIGHT", 70.0);
        log(&conn, "HEIGHT", 170.0);
        let profile = Profile::set(&conn, "Alex", Some("1990-06-15"), Some(Gender::Male)).unwrap();
        let age = profile.age().unwrap();

        // No activities logged today: multiplier is the sedentary 1.2
        let result = evaluate_symbol(&conn, "TDEE").unwrap().unwrap();
        let bmr = formulas::bmr(70.0, 170.0, age, Gender::Male);
        assert_eq!(result.value, round1(bmr * 1.2));
    }

    #[test]
    fn test_tdee_with_logged_activity() {
        let conn = test_conn();
        log(&conn, "WEIGHT", 80.0);
        log(&conn, "HEIGHT", 178.0);
        let profile =
            Profile::set(&conn, "Alex", Some("1990-06-15"), Some(Gender::Male)).unwrap();
        let age = profile.age().unwrap();

        let running = ActivityType::get_by_name(&conn, "running").unwrap().unwrap();
        let today = Utc::now().format("%Y-%m-%d").to_string();
        crate::models::activity::ActivityRecord::create(
            &conn,
            &ActivityRecordCreate {
                activity_type_id: running.id,
                duration_hours: 1.0,
                date: today,
                notes: None,
            },
        )
        .unwrap();

        let bmr = formulas::bmr(80.0, 178.0, age, Gender::Male);
        let calories = 8.0 * 80.0 * 1.0;
        let multiplier = round2((bmr + calories) / bmr);

        let result = evaluate_symbol(&conn, "TDEE").unwrap().unwrap();
        assert_eq!(result.value, round1(bmr * multiplier));
    }

    #[test]
    fn test_unknown_identifier_yields_none() {
        let conn = test_conn();
        log(&conn, "WEIGHT", 70.0);

        let metric = Metric::create(
            &conn,
            &MetricCreate {
                metric_id: Some("MYSTERY".to_string()),
                name: "Mystery".to_string(),
                metric_type: MetricType::Calculated,
                unit: None,
                description: None,
                min_value: None,
                max_value: None,
                reference_range: None,
                calculation_formula: Some("WEIGHT * NO_SUCH_THING".to_string()),
            },
        )
        .unwrap();

        assert!(evaluate(&conn, &metric).unwrap().is_none());
    }

    #[test]
    fn test_cycle_detected() {
        let conn = test_conn();

        Metric::create(
            &conn,
            &MetricCreate {
                metric_id: Some("LOOP_A".to_string()),
                name: "Loop A".to_string(),
                metric_type: MetricType::Calculated,
                unit: None,
                description: None,
                min_value: None,
                max_value: None,
                reference_range: None,
                calculation_formula: Some("LOOP_B + 1".to_string()),
            },
        )
        .unwrap();
        Metric::create(
            &conn,
            &MetricCreate {
                metric_id: Some("LOOP_B".to_string()),
                name: "Loop B".to_string(),
                metric_type: MetricType::Calculated,
                unit: None,
                description: None,
                min_value: None,
                max_value: None,
                reference_range: None,
                calculation_formula: Some("LOOP_A + 1".to_string()),
            },
        )
        .unwrap();

        assert!(evaluate_symbol(&conn, "LOOP_A").unwrap().is_none());
    }

    #[test]
    fn test_division_by_zero_yields_none() {
        let conn = test_conn();
        log(&conn, "WEIGHT", 70.0);
        log(&conn, "HEIGHT", 0.0);
        assert!(evaluate_symbol(&conn, "BMI").unwrap().is_none());
    }

    #[test]
    fn test_non_calculated_metric_yields_none() {
        let conn = test_conn();
        let weight = Metric::get_by_symbol(&conn, "WEIGHT").unwrap().unwrap();
        assert!(evaluate(&conn, &weight).unwrap().is_none());
    }
}
