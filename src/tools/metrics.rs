//! Metric catalog, value, engine, and favorites MCP tools

use serde::Serialize;

use crate::db::Database;
use crate::health::engine;
use crate::models::{
    MeasurementType, Metric, MetricCreate, MetricFavorite, MetricType, MetricUpdate, MetricValue,
    MetricValueCreate,
};

/// Metrics pinned by setup_default_favorites
const DEFAULT_FAVORITES: &[&str] = &[
    "Weight",
    "Height",
    "BMI",
    "Body Fat Percentage",
    "Waist Circumference",
    "Total Cholesterol",
];

/// Metric summary for listings
#[derive(Debug, Serialize)]
pub struct MetricSummary {
    pub id: i64,
    pub symbol: Option<String>,
    pub name: String,
    pub metric_type: String,
    pub unit: String,
    pub is_calculated: bool,
}

impl From<&Metric> for MetricSummary {
    fn from(metric: &Metric) -> Self {
        Self {
            id: metric.id,
            symbol: metric.metric_id.clone(),
            name: metric.name.clone(),
            metric_type: metric.metric_type.as_str().to_string(),
            unit: metric.unit.clone(),
            is_calculated: metric.is_calculated,
        }
    }
}

/// Full metric detail
#[derive(Debug, Serialize)]
pub struct MetricDetail {
    pub id: i64,
    pub symbol: Option<String>,
    pub name: String,
    pub metric_type: String,
    pub metric_type_display: String,
    pub unit: String,
    pub description: String,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub reference_range: String,
    pub is_calculated: bool,
    pub calculation_formula: Option<String>,
    pub is_active: bool,
    pub is_favorite: bool,
    pub latest_value: Option<f64>,
    pub latest_timestamp: Option<String>,
    pub target_value: Option<f64>,
}

/// Response for list_metrics
#[derive(Debug, Serialize)]
pub struct ListMetricsResponse {
    pub metrics: Vec<MetricSummary>,
    pub total: usize,
}

/// Response for add_metric_value / set_target
#[derive(Debug, Serialize)]
pub struct AddValueResponse {
    pub id: i64,
    pub metric: String,
    pub value: f64,
    pub unit: String,
    pub measurement_type: String,
    pub status: String,
    pub timestamp: String,
}

/// Recorded value for history listings
#[derive(Debug, Serialize)]
pub struct ValueSummary {
    pub id: i64,
    pub value: f64,
    pub measurement_type: String,
    pub status: String,
    pub notes: String,
    pub source: String,
    pub timestamp: String,
}

impl From<&MetricValue> for ValueSummary {
    fn from(value: &MetricValue) -> Self {
        Self {
            id: value.id,
            value: value.value,
            measurement_type: value.measurement_type.as_str().to_string(),
            status: value.status.as_str().to_string(),
            notes: value.notes.clone(),
            source: value.source.clone(),
            timestamp: value.timestamp.clone(),
        }
    }
}

/// Response for list_metric_values
#[derive(Debug, Serialize)]
pub struct ListValuesResponse {
    pub metric: String,
    pub unit: String,
    pub values: Vec<ValueSummary>,
    pub total: usize,
}

/// One entry in get_latest_measurements
#[derive(Debug, Serialize)]
pub struct LatestMeasurement {
    pub symbol: Option<String>,
    pub name: String,
    pub value: f64,
    pub unit: String,
    pub timestamp: String,
}

/// Response for get_latest_measurements
#[derive(Debug, Serialize)]
pub struct LatestMeasurementsResponse {
    pub measurements: Vec<LatestMeasurement>,
    pub as_of: String,
}

/// Response for get_calculated_value
#[derive(Debug, Serialize)]
pub struct CalculatedValueResponse {
    pub metric: String,
    pub available: bool,
    pub value: Option<f64>,
    pub unit: Option<String>,
    pub formula: Option<String>,
    pub inputs: Option<std::collections::BTreeMap<String, f64>>,
}

/// Response for toggle_favorite
#[derive(Debug, Serialize)]
pub struct ToggleFavoriteResponse {
    pub metric: String,
    pub is_favorite: bool,
}

/// Response for setup_default_favorites
#[derive(Debug, Serialize)]
pub struct SetupFavoritesResponse {
    pub added: Vec<String>,
    pub already_present: Vec<String>,
}

/// Response for delete operations
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub deleted_id: i64,
}

fn resolve_metric(conn: &rusqlite::Connection, identifier: &str) -> Result<Metric, String> {
    Metric::resolve(conn, identifier)
        .map_err(|e| format!("Database error: {}", e))?
        .ok_or_else(|| format!("Metric not found: '{}'", identifier))
}

// ============================================================================
// Catalog
// ============================================================================

/// List metrics, optionally filtered by type
pub fn list_metrics(
    db: &Database,
    metric_type: Option<&str>,
    include_inactive: bool,
) -> Result<ListMetricsResponse, String> {
    let mt = match metric_type {
        Some(t) => Some(
            MetricType::from_str(t).ok_or_else(|| {
                format!(
                    "Invalid metric type: '{}'. Valid types: body_measurement, lab_result, \
                     vital_sign, fitness, nutrition, calculated, custom",
                    t
                )
            })?,
        ),
        None => None,
    };

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let metrics =
        Metric::list(&conn, mt, include_inactive).map_err(|e| format!("Failed to list metrics: {}", e))?;

    let summaries: Vec<MetricSummary> = metrics.iter().map(MetricSummary::from).collect();
    let total = summaries.len();

    Ok(ListMetricsResponse {
        metrics: summaries,
        total,
    })
}

/// Get a metric by symbolic id, name, or numeric id
pub fn get_metric(db: &Database, identifier: &str) -> Result<MetricDetail, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let metric = resolve_metric(&conn, identifier)?;

    let latest = MetricValue::latest_observation(&conn, metric.id)
        .map_err(|e| format!("Database error: {}", e))?;
    let target = MetricValue::latest_target(&conn, metric.id)
        .map_err(|e| format!("Database error: {}", e))?;
    let is_favorite =
        MetricFavorite::contains(&conn, metric.id).map_err(|e| format!("Database error: {}", e))?;

    Ok(MetricDetail {
        id: metric.id,
        symbol: metric.metric_id.clone(),
        name: metric.name.clone(),
        metric_type: metric.metric_type.as_str().to_string(),
        metric_type_display: metric.metric_type.display_name().to_string(),
        unit: metric.unit.clone(),
        description: metric.description.clone(),
        min_value: metric.min_value,
        max_value: metric.max_value,
        reference_range: metric.reference_range.clone(),
        is_calculated: metric.is_calculated,
        calculation_formula: if metric.calculation_formula.is_empty() {
            None
        } else {
            Some(metric.calculation_formula.clone())
        },
        is_active: metric.is_active,
        is_favorite,
        latest_value: latest.as_ref().map(|v| v.value),
        latest_timestamp: latest.map(|v| v.timestamp),
        target_value: target.map(|v| v.value),
    })
}

/// Create a custom metric
#[allow(clippy::too_many_arguments)]
pub fn create_metric(
    db: &Database,
    name: &str,
    metric_type: &str,
    symbol: Option<&str>,
    unit: Option<&str>,
    description: Option<&str>,
    min_value: Option<f64>,
    max_value: Option<f64>,
    reference_range: Option<&str>,
    calculation_formula: Option<&str>,
) -> Result<MetricDetail, String> {
    if name.trim().is_empty() {
        return Err("Metric name must not be empty".to_string());
    }

    let mt = MetricType::from_str(metric_type)
        .ok_or_else(|| format!("Invalid metric type: '{}'", metric_type))?;

    // Calculated metrics must carry a parseable formula
    if let Some(formula) = calculation_formula {
        crate::formula::Formula::parse(formula)
            .map_err(|e| format!("Invalid calculation formula: {}", e))?;
    } else if mt == MetricType::Calculated {
        return Err("Calculated metrics require a calculation_formula".to_string());
    }

    let symbol = symbol.map(|s| s.trim().to_uppercase());

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let metric = Metric::create(
        &conn,
        &MetricCreate {
            metric_id: symbol,
            name: name.trim().to_string(),
            metric_type: mt,
            unit: unit.map(String::from),
            description: description.map(String::from),
            min_value,
            max_value,
            reference_range: reference_range.map(String::from),
            calculation_formula: calculation_formula.map(String::from),
        },
    )
    .map_err(|e| format!("Failed to create metric: {}", e))?;

    get_metric(db, &metric.id.to_string())
}

/// Update a metric's catalog entry
#[allow(clippy::too_many_arguments)]
pub fn update_metric(
    db: &Database,
    identifier: &str,
    name: Option<&str>,
    unit: Option<&str>,
    description: Option<&str>,
    min_value: Option<f64>,
    max_value: Option<f64>,
    reference_range: Option<&str>,
    calculation_formula: Option<&str>,
    is_active: Option<bool>,
) -> Result<MetricDetail, String> {
    if let Some(formula) = calculation_formula {
        crate::formula::Formula::parse(formula)
            .map_err(|e| format!("Invalid calculation formula: {}", e))?;
    }

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let metric = resolve_metric(&conn, identifier)?;

    Metric::update(
        &conn,
        metric.id,
        &MetricUpdate {
            name: name.map(String::from),
            unit: unit.map(String::from),
            description: description.map(String::from),
            min_value,
            max_value,
            reference_range: reference_range.map(String::from),
            calculation_formula: calculation_formula.map(String::from),
            is_active,
        },
    )
    .map_err(|e| format!("Failed to update metric: {}", e))?;

    get_metric(db, &metric.id.to_string())
}

/// Delete a metric, or deactivate it to keep its history
pub fn delete_metric(
    db: &Database,
    identifier: &str,
    deactivate_only: bool,
) -> Result<DeleteResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let metric = resolve_metric(&conn, identifier)?;

    let success = if deactivate_only {
        Metric::deactivate(&conn, metric.id).map_err(|e| format!("Failed to deactivate: {}", e))?
    } else {
        Metric::delete(&conn, metric.id).map_err(|e| format!("Failed to delete: {}", e))?
    };

    Ok(DeleteResponse {
        success,
        deleted_id: metric.id,
    })
}

// ============================================================================
// Values
// ============================================================================

/// Record a value for a metric
pub fn add_metric_value(
    db: &Database,
    identifier: &str,
    value: f64,
    measurement_type: Option<&str>,
    notes: Option<&str>,
    source: Option<&str>,
    timestamp: Option<&str>,
) -> Result<AddValueResponse, String> {
    let mt = match measurement_type {
        Some(t) => MeasurementType::from_str(t).ok_or_else(|| {
            format!(
                "Invalid measurement type: '{}'. Valid types: baseline, target, current, log, goal",
                t
            )
        })?,
        None => MeasurementType::Log,
    };

    // Calculated rows are engine output only
    if mt == MeasurementType::Calculated {
        return Err(
            "Measurement type 'calculated' is reserved for the calculator; use run_calculator"
                .to_string(),
        );
    }

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let metric = resolve_metric(&conn, identifier)?;

    if metric.is_calculated {
        return Err(format!(
            "'{}' is a calculated metric; its value is derived, not recorded",
            metric.name
        ));
    }

    let status = metric.classify_value(value);

    let recorded = MetricValue::create(
        &conn,
        &MetricValueCreate {
            metric_id: metric.id,
            value,
            measurement_type: mt,
            status: Some(status),
            notes: notes.map(String::from),
            source: source.map(String::from),
            calculation_inputs: None,
            timestamp: timestamp.map(String::from),
        },
    )
    .map_err(|e| format!("Failed to record value: {}", e))?;

    Ok(AddValueResponse {
        id: recorded.id,
        metric: metric.name,
        value: recorded.value,
        unit: metric.unit,
        measurement_type: recorded.measurement_type.as_str().to_string(),
        status: recorded.status.as_str().to_string(),
        timestamp: recorded.timestamp,
    })
}

/// Set a target value for a metric
pub fn set_target(
    db: &Database,
    identifier: &str,
    value: f64,
    notes: Option<&str>,
) -> Result<AddValueResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let metric = resolve_metric(&conn, identifier)?;

    let target = MetricValue::set_target(&conn, metric.id, value, notes)
        .map_err(|e| format!("Failed to set target: {}", e))?;

    Ok(AddValueResponse {
        id: target.id,
        metric: metric.name,
        value: target.value,
        unit: metric.unit,
        measurement_type: target.measurement_type.as_str().to_string(),
        status: target.status.as_str().to_string(),
        timestamp: target.timestamp,
    })
}

/// List recorded values for a metric, optionally within a trailing day
/// window
pub fn list_metric_values(
    db: &Database,
    identifier: &str,
    measurement_type: Option<&str>,
    days: Option<i64>,
    limit: Option<i64>,
) -> Result<ListValuesResponse, String> {
    let mt = match measurement_type {
        Some(t) => Some(
            MeasurementType::from_str(t)
                .ok_or_else(|| format!("Invalid measurement type: '{}'", t))?,
        ),
        None => None,
    };

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let metric = resolve_metric(&conn, identifier)?;

    let values = match days {
        Some(n) => {
            if n <= 0 {
                return Err("days must be positive".to_string());
            }
            let end = chrono::Utc::now();
            let start = end - chrono::Duration::days(n);
            MetricValue::list_by_date_range(
                &conn,
                metric.id,
                &start.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
                &end.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            )
            .map_err(|e| format!("Failed to list values: {}", e))?
            .into_iter()
            .filter(|v| mt.map_or(true, |t| v.measurement_type == t))
            .collect()
        }
        None => MetricValue::list_by_metric(&conn, metric.id, mt, limit)
            .map_err(|e| format!("Failed to list values: {}", e))?,
    };

    let summaries: Vec<ValueSummary> = values.iter().map(ValueSummary::from).collect();
    let total = summaries.len();

    Ok(ListValuesResponse {
        metric: metric.name,
        unit: metric.unit,
        values: summaries,
        total,
    })
}

/// Latest observation for every metric with recorded data
pub fn get_latest_measurements(db: &Database) -> Result<LatestMeasurementsResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let observations = MetricValue::latest_observations(&conn)
        .map_err(|e| format!("Failed to get measurements: {}", e))?;

    let measurements = observations
        .into_iter()
        .map(|o| LatestMeasurement {
            symbol: o.symbol,
            name: o.name,
            value: o.value,
            unit: o.unit,
            timestamp: o.timestamp,
        })
        .collect();

    Ok(LatestMeasurementsResponse {
        measurements,
        as_of: chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
    })
}

/// Update a recorded value; re-classifies status when the value changes
pub fn update_metric_value(
    db: &Database,
    id: i64,
    value: Option<f64>,
    notes: Option<&str>,
) -> Result<ValueSummary, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let existing = MetricValue::get_by_id(&conn, id)
        .map_err(|e| format!("Database error: {}", e))?
        .ok_or_else(|| format!("Metric value not found with id: {}", id))?;

    let status = match value {
        Some(v) => {
            let metric = Metric::get_by_id(&conn, existing.metric_id)
                .map_err(|e| format!("Database error: {}", e))?;
            metric.map(|m| m.classify_value(v))
        }
        None => None,
    };

    let updated = MetricValue::update(&conn, id, value, notes.map(String::from), status)
        .map_err(|e| format!("Failed to update value: {}", e))?
        .ok_or_else(|| format!("Metric value not found with id: {}", id))?;

    Ok(ValueSummary::from(&updated))
}

/// Delete a recorded value by its id
pub fn delete_metric_value(db: &Database, id: i64) -> Result<DeleteResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let existing =
        MetricValue::get_by_id(&conn, id).map_err(|e| format!("Database error: {}", e))?;
    if existing.is_none() {
        return Err(format!("Metric value not found with id: {}", id));
    }

    MetricValue::delete(&conn, id).map_err(|e| format!("Failed to delete value: {}", e))?;

    Ok(DeleteResponse {
        success: true,
        deleted_id: id,
    })
}

// ============================================================================
// Engine
// ============================================================================

/// Evaluate a calculated metric against the latest measurements
pub fn get_calculated_value(db: &Database, identifier: &str) -> Result<CalculatedValueResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let metric = resolve_metric(&conn, identifier)?;

    if !metric.is_calculated {
        return Err(format!(
            "'{}' is not a calculated metric; use get_metric for recorded values",
            metric.name
        ));
    }

    let result =
        engine::evaluate(&conn, &metric).map_err(|e| format!("Evaluation failed: {}", e))?;

    Ok(match result {
        Some(r) => CalculatedValueResponse {
            metric: metric.name,
            available: true,
            value: Some(r.value),
            unit: Some(r.unit),
            formula: Some(r.formula),
            inputs: Some(r.inputs),
        },
        None => CalculatedValueResponse {
            metric: metric.name,
            available: false,
            value: None,
            unit: None,
            formula: Some(metric.calculation_formula),
            inputs: None,
        },
    })
}

// ============================================================================
// Favorites
// ============================================================================

/// Toggle a metric's favorite flag
pub fn toggle_favorite(db: &Database, identifier: &str) -> Result<ToggleFavoriteResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let metric = resolve_metric(&conn, identifier)?;

    let is_favorite = if MetricFavorite::contains(&conn, metric.id)
        .map_err(|e| format!("Database error: {}", e))?
    {
        MetricFavorite::remove(&conn, metric.id).map_err(|e| format!("Database error: {}", e))?;
        false
    } else {
        MetricFavorite::add(&conn, metric.id).map_err(|e| format!("Database error: {}", e))?;
        true
    };

    Ok(ToggleFavoriteResponse {
        metric: metric.name,
        is_favorite,
    })
}

/// List favorite metrics with their latest values
pub fn list_favorites(db: &Database) -> Result<ListMetricsResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let favorites =
        MetricFavorite::list(&conn).map_err(|e| format!("Failed to list favorites: {}", e))?;

    let summaries: Vec<MetricSummary> = favorites.iter().map(MetricSummary::from).collect();
    let total = summaries.len();

    Ok(ListMetricsResponse {
        metrics: summaries,
        total,
    })
}

/// Pin the standard starter set of favorites
pub fn setup_default_favorites(db: &Database) -> Result<SetupFavoritesResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let mut added = Vec::new();
    let mut already_present = Vec::new();

    for name in DEFAULT_FAVORITES {
        let metric = match Metric::get_by_name(&conn, name)
            .map_err(|e| format!("Database error: {}", e))?
        {
            Some(m) => m,
            None => continue,
        };

        if MetricFavorite::add(&conn, metric.id).map_err(|e| format!("Database error: {}", e))? {
            added.push(metric.name);
        } else {
            already_present.push(metric.name);
        }
    }

    Ok(SetupFavoritesResponse {
        added,
        already_present,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db(name: &str) -> Database {
        let db = Database::new(format!("file:{}?mode=memory&cache=shared", name)).unwrap();
        let conn = db.get_conn().unwrap();
        crate::db::migrations::run_migrations(&conn).unwrap();
        db
    }

    #[test]
    fn test_add_value_and_history() {
        let db = test_db("metrics_add_value");

        let response = add_metric_value(&db, "WEIGHT", 80.5, None, None, None, None).unwrap();
        assert_eq!(response.metric, "Weight");
        assert_eq!(response.measurement_type, "log");

        let history = list_metric_values(&db, "weight", None, None, None).unwrap();
        assert_eq!(history.total, 1);
        assert_eq!(history.values[0].value, 80.5);
    }

    #[test]
    fn test_add_value_rejects_calculated() {
        let db = test_db("metrics_reject_calculated");

        let result = add_metric_value(&db, "WEIGHT", 80.0, Some("calculated"), None, None, None);
        assert!(result.is_err());

        // Calculated metrics can't be written to directly either
        let result = add_metric_value(&db, "BMI", 24.0, None, None, None, None);
        assert!(result.is_err());
    }

    #[test]
    fn test_get_calculated_value() {
        let db = test_db("metrics_calculated_value");

        add_metric_value(&db, "WEIGHT", 70.0, None, None, None, None).unwrap();
        let response = get_calculated_value(&db, "BMI").unwrap();
        assert!(!response.available);

        add_metric_value(&db, "HEIGHT", 170.0, None, None, None, None).unwrap();
        let response = get_calculated_value(&db, "BMI").unwrap();
        assert!(response.available);
        assert_eq!(response.value, Some(24.2));
    }

    #[test]
    fn test_create_metric_validates_formula() {
        let db = test_db("metrics_create_validation");

        let result = create_metric(
            &db,
            "Broken",
            "calculated",
            None,
            None,
            None,
            None,
            None,
            None,
            Some("WEIGHT +"),
        );
        assert!(result.is_err());

        let detail = create_metric(
            &db,
            "Weight To Height",
            "calculated",
            Some("W2H"),
            None,
            None,
            None,
            None,
            None,
            Some("WEIGHT / HEIGHT"),
        )
        .unwrap();
        assert!(detail.is_calculated);
    }

    #[test]
    fn test_favorites_toggle_and_defaults() {
        let db = test_db("metrics_favorites");

        let response = toggle_favorite(&db, "WEIGHT").unwrap();
        assert!(response.is_favorite);
        let response = toggle_favorite(&db, "WEIGHT").unwrap();
        assert!(!response.is_favorite);

        let setup = setup_default_favorites(&db).unwrap();
        assert_eq!(setup.added.len(), DEFAULT_FAVORITES.len());

        // Idempotent
        let setup = setup_default_favorites(&db).unwrap();
        assert!(setup.added.is_empty());
        assert_eq!(setup.already_present.len(), DEFAULT_FAVORITES.len());

        let favorites = list_favorites(&db).unwrap();
        assert_eq!(favorites.total, DEFAULT_FAVORITES.len());
    }

    #[test]
    fn test_update_metric_value_reclassifies() {
        let db = test_db("metrics_update_value");

        // Glucose seed has a plausibility band, so status flips with the value
        let added = add_metric_value(&db, "GLUCOSE", 95.0, None, None, None, None).unwrap();
        assert_eq!(added.status, "normal");

        let updated = update_metric_value(&db, added.id, Some(700.0), Some("meter error?")).unwrap();
        assert_eq!(updated.value, 700.0);
        assert_eq!(updated.notes, "meter error?");
        assert_eq!(updated.status, "high");
    }

    #[test]
    fn test_get_metric_detail() {
        let db = test_db("metrics_detail");

        add_metric_value(&db, "GLUCOSE", 95.0, None, None, None, None).unwrap();
        set_target(&db, "GLUCOSE", 90.0, None).unwrap();

        let detail = get_metric(&db, "GLUCOSE").unwrap();
        assert_eq!(detail.latest_value, Some(95.0));
        assert_eq!(detail.target_value, Some(90.0));
        assert!(!detail.is_calculated);
    }

    #[test]
    fn test_set_target_with_notes() {
        let db = test_db("metrics_target_notes");

        let first = set_target(&db, "WEIGHT", 75.0, Some("summer goal")).unwrap();
        let second = set_target(&db, "WEIGHT", 74.0, Some("stretch goal")).unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.value, 74.0);

        let conn = db.get_conn().unwrap();
        let row = MetricValue::get_by_id(&conn, second.id).unwrap().unwrap();
        assert_eq!(row.notes, "stretch goal");
    }
}
