//! Activity energy accounting
//!
//! Calories for one activity = rate (kcal/hour/kg) × body weight × hours.
//! Body weight comes from the latest recorded WEIGHT observation, falling
//! back to 70 kg when nothing has been logged yet.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::db::DbResult;
use crate::health::{engine, round1, round2};
use crate::models::activity::{ActivityDetail, ActivityRecord, PlannedActivity};
use crate::models::metric::Metric;
use crate::models::metric_value::MetricValue;

/// Body weight assumed when no WEIGHT observation exists
pub const FALLBACK_WEIGHT_KG: f64 = 70.0;

/// Multiplier used when a day has no activities (sedentary)
pub const SEDENTARY_MULTIPLIER: f64 = 1.2;

/// Latest recorded body weight, or the fallback
pub fn body_weight_kg(conn: &Connection) -> DbResult<f64> {
    if let Some(metric) = Metric::get_by_symbol(conn, "WEIGHT")? {
        if let Some(obs) = MetricValue::latest_observation(conn, metric.id)? {
            return Ok(obs.value);
        }
    }
    Ok(FALLBACK_WEIGHT_KG)
}

/// Energy expended by one activity
pub fn activity_calories(rate_per_hour_per_kg: f64, weight_kg: f64, duration_hours: f64) -> f64 {
    rate_per_hour_per_kg * weight_kg * duration_hours
}

/// Daily activity multiplier: (BMR + day's calories) / BMR, two decimals.
/// Falls back to sedentary when the day has no activities or BMR is
/// unavailable.
pub fn daily_multiplier(bmr: Option<f64>, total_calories: f64, has_activities: bool) -> f64 {
    if !has_activities {
        return SEDENTARY_MULTIPLIER;
    }
    match bmr {
        Some(b) if b > 0.0 => round2((b + total_calories) / b),
        _ => SEDENTARY_MULTIPLIER,
    }
}

/// Total logged calories for a date. The bool is false when no activities
/// were logged at all.
pub fn logged_calories_total(conn: &Connection, date: &str) -> DbResult<(f64, bool)> {
    let details = ActivityRecord::list_by_date_detailed(conn, date)?;
    if details.is_empty() {
        return Ok((0.0, false));
    }

    let weight = body_weight_kg(conn)?;
    let total = details
        .iter()
        .map(|d| activity_calories(d.calories_per_hour_per_kg, weight, d.duration_hours))
        .sum();
    Ok((total, true))
}

/// One activity with its computed calorie cost
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityCalories {
    pub id: i64,
    pub activity: String,
    pub duration_hours: f64,
    pub calories: f64,
}

fn with_calories(details: Vec<ActivityDetail>, weight_kg: f64) -> Vec<ActivityCalories> {
    details
        .into_iter()
        .map(|d| ActivityCalories {
            id: d.id,
            activity: d.display_name,
            duration_hours: d.duration_hours,
            calories: round1(activity_calories(
                d.calories_per_hour_per_kg,
                weight_kg,
                d.duration_hours,
            )),
        })
        .collect()
}

/// Planned vs. logged energy picture for one day
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyActivitySummary {
    pub date: String,
    pub body_weight_kg: f64,
    pub bmr: Option<f64>,
    pub planned: Vec<ActivityCalories>,
    pub logged: Vec<ActivityCalories>,
    pub planned_calories: f64,
    pub logged_calories: f64,
    pub planned_multiplier: f64,
    pub logged_multiplier: f64,
}

/// Build the daily summary for a date (YYYY-MM-DD)
pub fn daily_summary(conn: &Connection, date: &str) -> DbResult<DailyActivitySummary> {
    let weight = body_weight_kg(conn)?;
    let bmr = engine::evaluate_symbol(conn, "BMR")?.map(|r| r.value);

    let planned = with_calories(PlannedActivity::list_by_date_detailed(conn, date)?, weight);
    let logged = with_calories(ActivityRecord::list_by_date_detailed(conn, date)?, weight);

    let planned_total: f64 = planned.iter().map(|a| a.calories).sum();
    let logged_total: f64 = logged.iter().map(|a| a.calories).sum();

    Ok(DailyActivitySummary {
        date: date.to_string(),
        body_weight_kg: weight,
        bmr,
        planned_multiplier: daily_multiplier(bmr, planned_total, !planned.is_empty()),
        logged_multiplier: daily_multiplier(bmr, logged_total, !logged.is_empty()),
        planned_calories: round1(planned_total),
        logged_calories: round1(logged_total),
        planned,
        logged,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use crate::models::activity::{ActivityRecordCreate, ActivityType};
    use crate::models::metric_value::{MeasurementType, MetricValueCreate};

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    fn log_weight(conn: &Connection, value: f64) {
        let metric = Metric::get_by_symbol(conn, "WEIGHT").unwrap().unwrap();
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
    fn test_body_weight_fallback() {
        let conn = test_conn();
        assert_eq!(body_weight_kg(&conn).unwrap(), FALLBACK_WEIGHT_KG);

        log_weight(&conn, 82.5);
        assert_eq!(body_weight_kg(&conn).unwrap(), 82.5);
    }

    #[test]
    fn test_activity_calories() {
        // running at 8 kcal/h/kg, 80 kg, 1.5 h
        let calories = activity_calories(8.0, 80.0, 1.5);
        assert!((calories - 960.0).abs() < 1e-9);
    }

    #[test]
    fn test_multiplier_defaults_without_activities() {
        assert_eq!(daily_multiplier(Some(1800.0), 0.0, false), 1.2);
        assert_eq!(daily_multiplier(None, 500.0, true), 1.2);
    }

    #[test]
    fn test_multiplier_from_calories() {
        // (1800 + 540) / 1800 = 1.3
        assert_eq!(daily_multiplier(Some(1800.0), 540.0, true), 1.3);
        // rounds to two decimals
        assert_eq!(daily_multiplier(Some(1800.0), 600.0, true), 1.33);
    }

    #[test]
    fn test_logged_calories_total() {
        let conn = test_conn();
        log_weight(&conn, 80.0);

        let (total, has) = logged_calories_total(&conn, "2025-03-01").unwrap();
        assert!(!has);
        assert_eq!(total, 0.0);

        let cycling = ActivityType::get_by_name(&conn, "cycling").unwrap().unwrap();
        ActivityRecord::create(
            &conn,
            &ActivityRecordCreate {
                activity_type_id: cycling.id,
                duration_hours: 2.0,
                date: "2025-03-01".to_string(),
                notes: None,
            },
        )
        .unwrap();

        // 6.0 * 80 * 2 = 960
        let (total, has) = logged_calories_total(&conn, "2025-03-01").unwrap();
        assert!(has);
        assert!((total - 960.0).abs() < 1e-9);
    }

    #[test]
    fn test_daily_summary_without_bmr() {
        let conn = test_conn();
        let summary = daily_summary(&conn, "2025-03-01").unwrap();
        assert!(summary.bmr.is_none());
        assert_eq!(summary.planned_multiplier, 1.2);
        assert_eq!(summary.logged_multiplier, 1.2);
        assert!(summary.planned.is_empty());
        assert!(summary.logged.is_empty());
    }
}
