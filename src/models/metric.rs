//! Metric model
//!
//! The metric catalog defines every quantity the tracker knows about:
//! measured values like weight or blood glucose, and calculated values
//! like BMI that carry a formula over other metrics' symbolic ids.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};
use crate::models::metric_value::ValueStatus;

/// Metric type enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricType {
    BodyMeasurement,
    LabResult,
    VitalSign,
    Fitness,
    Nutrition,
    Calculated,
    Custom,
}

impl MetricType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricType::BodyMeasurement => "body_measurement",
            MetricType::LabResult => "lab_result",
            MetricType::VitalSign => "vital_sign",
            MetricType::Fitness => "fitness",
            MetricType::Nutrition => "nutrition",
            MetricType::Calculated => "calculated",
            MetricType::Custom => "custom",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "body_measurement" | "body" => Some(MetricType::BodyMeasurement),
            "lab_result" | "lab" => Some(MetricType::LabResult),
            "vital_sign" | "vital" => Some(MetricType::VitalSign),
            "fitness" => Some(MetricType::Fitness),
            "nutrition" => Some(MetricType::Nutrition),
            "calculated" => Some(MetricType::Calculated),
            "custom" => Some(MetricType::Custom),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            MetricType::BodyMeasurement => "Body Measurement",
            MetricType::LabResult => "Lab Result",
            MetricType::VitalSign => "Vital Sign",
            MetricType::Fitness => "Fitness",
            MetricType::Nutrition => "Nutrition",
            MetricType::Calculated => "Calculated",
            MetricType::Custom => "Custom",
        }
    }
}

/// A catalog entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metric {
    pub id: i64,
    /// Symbolic id used in formulas (e.g. `WEIGHT`); None for ad-hoc custom metrics
    pub metric_id: Option<String>,
    pub name: String,
    pub metric_type: MetricType,
    pub unit: String,
    pub description: String,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub reference_range: String,
    pub is_calculated: bool,
    pub calculation_formula: String,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for creating a new metric
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricCreate {
    pub metric_id: Option<String>,
    pub name: String,
    pub metric_type: MetricType,
    pub unit: Option<String>,
    pub description: Option<String>,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub reference_range: Option<String>,
    pub calculation_formula: Option<String>,
}

/// Data for updating a metric
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricUpdate {
    pub name: Option<String>,
    pub unit: Option<String>,
    pub description: Option<String>,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub reference_range: Option<String>,
    pub calculation_formula: Option<String>,
    pub is_active: Option<bool>,
}

impl Metric {
    /// Create from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let type_str: String = row.get("metric_type")?;
        let metric_type = MetricType::from_str(&type_str).unwrap_or(MetricType::Custom);

        Ok(Self {
            id: row.get("id")?,
            metric_id: row.get("metric_id")?,
            name: row.get("name")?,
            metric_type,
            unit: row.get("unit")?,
            description: row.get("description")?,
            min_value: row.get("min_value")?,
            max_value: row.get("max_value")?,
            reference_range: row.get("reference_range")?,
            is_calculated: row.get("is_calculated")?,
            calculation_formula: row.get("calculation_formula")?,
            is_active: row.get("is_active")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Create a new metric
    pub fn create(conn: &Connection, data: &MetricCreate) -> DbResult<Self> {
        let formula = data.calculation_formula.clone().unwrap_or_default();
        let is_calculated = data.metric_type == MetricType::Calculated || !formula.is_empty();

        if is_calculated && formula.is_empty() {
            return Err(DbError::Invalid(
                "calculated metrics require a calculation formula".to_string(),
            ));
        }

        conn.execute(
            r#"
            INSERT INTO metrics
            (metric_id, name, metric_type, unit, description, min_value, max_value,
             reference_range, is_calculated, calculation_formula)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                data.metric_id,
                data.name,
                data.metric_type.as_str(),
                data.unit.clone().unwrap_or_default(),
                data.description.clone().unwrap_or_default(),
                data.min_value,
                data.max_value,
                data.reference_range.clone().unwrap_or_default(),
                is_calculated,
                formula,
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?
            .ok_or_else(|| DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    /// Get a metric by database ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM metrics WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(metric) => Ok(Some(metric)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Get a metric by symbolic id (e.g. `WEIGHT`)
    pub fn get_by_symbol(conn: &Connection, symbol: &str) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM metrics WHERE metric_id = ?1")?;

        let result = stmt.query_row([symbol], Self::from_row);
        match result {
            Ok(metric) => Ok(Some(metric)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Get a metric by name (case-insensitive)
    pub fn get_by_name(conn: &Connection, name: &str) -> DbResult<Option<Self>> {
        let mut stmt =
            conn.prepare("SELECT * FROM metrics WHERE name = ?1 COLLATE NOCASE")?;

        let result = stmt.query_row([name], Self::from_row);
        match result {
            Ok(metric) => Ok(Some(metric)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Resolve a metric by symbolic id, then name, then numeric id.
    pub fn resolve(conn: &Connection, identifier: &str) -> DbResult<Option<Self>> {
        if let Some(metric) = Self::get_by_symbol(conn, &identifier.to_uppercase())? {
            return Ok(Some(metric));
        }
        if let Some(metric) = Self::get_by_name(conn, identifier)? {
            return Ok(Some(metric));
        }
        if let Ok(id) = identifier.parse::<i64>() {
            return Self::get_by_id(conn, id);
        }
        Ok(None)
    }

    /// List metrics, optionally filtered by type; inactive entries excluded
    /// unless requested.
    pub fn list(
        conn: &Connection,
        metric_type: Option<MetricType>,
        include_inactive: bool,
    ) -> DbResult<Vec<Self>> {
        let mut conditions = Vec::new();
        if metric_type.is_some() {
            conditions.push("metric_type = ?1");
        }
        if !include_inactive {
            conditions.push("is_active = 1");
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        let sql = format!(
            "SELECT * FROM metrics {} ORDER BY metric_type, name",
            where_clause
        );

        let mut stmt = conn.prepare(&sql)?;
        let metrics = match metric_type {
            Some(mt) => stmt
                .query_map([mt.as_str()], Self::from_row)?
                .collect::<Result<Vec<_>, _>>()?,
            None => stmt
                .query_map([], Self::from_row)?
                .collect::<Result<Vec<_>, _>>()?,
        };

        Ok(metrics)
    }

    /// List active calculated metrics
    pub fn list_calculated(conn: &Connection) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM metrics WHERE is_calculated = 1 AND is_active = 1 ORDER BY name",
        )?;
        let metrics = stmt
            .query_map([], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(metrics)
    }

    /// Update a metric
    pub fn update(conn: &Connection, id: i64, data: &MetricUpdate) -> DbResult<Option<Self>> {
        let mut updates = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref name) = data.name {
            updates.push(format!("name = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(name.clone()));
        }
        if let Some(ref unit) = data.unit {
            updates.push(format!("unit = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(unit.clone()));
        }
        if let Some(ref desc) = data.description {
            updates.push(format!("description = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(desc.clone()));
        }
        if let Some(min) = data.min_value {
            updates.push(format!("min_value = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(min));
        }
        if let Some(max) = data.max_value {
            updates.push(format!("max_value = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(max));
        }
        if let Some(ref range) = data.reference_range {
            updates.push(format!("reference_range = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(range.clone()));
        }
        if let Some(ref formula) = data.calculation_formula {
            updates.push(format!("calculation_formula = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(formula.clone()));
            // Keep the flag the engine filters on in sync with the formula
            updates.push(format!(
                "is_calculated = {}",
                if formula.is_empty() { 0 } else { 1 }
            ));
        }
        if let Some(active) = data.is_active {
            updates.push(format!("is_active = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(active));
        }

        if updates.is_empty() {
            return Self::get_by_id(conn, id);
        }

        updates.push("updated_at = datetime('now')".to_string());

        let sql = format!(
            "UPDATE metrics SET {} WHERE id = ?{}",
            updates.join(", "),
            params_vec.len() + 1
        );

        params_vec.push(Box::new(id));

        let params_refs: Vec<&dyn rusqlite::ToSql> =
            params_vec.iter().map(|p| p.as_ref()).collect();
        conn.execute(&sql, params_refs.as_slice())?;

        Self::get_by_id(conn, id)
    }

    /// Deactivate a metric (kept in the catalog, hidden from listings)
    pub fn deactivate(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute(
            "UPDATE metrics SET is_active = 0, updated_at = datetime('now') WHERE id = ?1",
            [id],
        )?;
        Ok(rows > 0)
    }

    /// Delete a metric and all its values (cascade)
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM metrics WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }

    /// Classify a value against this metric's min/max range
    pub fn classify_value(&self, value: f64) -> ValueStatus {
        if let Some(min) = self.min_value {
            if value < min {
                return ValueStatus::Low;
            }
        }
        if let Some(max) = self.max_value {
            if value > max {
                return ValueStatus::High;
            }
        }
        ValueStatus::Normal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    #[test]
    fn test_catalog_seeded_and_resolvable() {
        let conn = test_conn();

        let weight = Metric::get_by_symbol(&conn, "WEIGHT").unwrap().unwrap();
        assert_eq!(weight.name, "Weight");
        assert!(!weight.is_calculated);

        let bmi = Metric::resolve(&conn, "bmi").unwrap().unwrap();
        assert!(bmi.is_calculated);
        assert!(!bmi.calculation_formula.is_empty());

        // Resolve by name and by numeric id
        let by_name = Metric::resolve(&conn, "Body Fat Percentage").unwrap().unwrap();
        assert_eq!(by_name.metric_id.as_deref(), Some("BF_PCT"));
        let by_id = Metric::resolve(&conn, &weight.id.to_string()).unwrap().unwrap();
        assert_eq!(by_id.id, weight.id);
    }

    #[test]
    fn test_create_custom_metric() {
        let conn = test_conn();

        let metric = Metric::create(
            &conn,
            &MetricCreate {
                metric_id: Some("STEPS".to_string()),
                name: "Daily Steps".to_string(),
                metric_type: MetricType::Fitness,
                unit: Some("steps".to_string()),
                description: None,
                min_value: Some(0.0),
                max_value: Some(100000.0),
                reference_range: None,
                calculation_formula: None,
            },
        )
        .unwrap();

        assert_eq!(metric.name, "Daily Steps");
        assert!(!metric.is_calculated);
    }

    #[test]
    fn test_calculated_requires_formula() {
        let conn = test_conn();

        let result = Metric::create(
            &conn,
            &MetricCreate {
                metric_id: None,
                name: "Broken".to_string(),
                metric_type: MetricType::Calculated,
                unit: None,
                description: None,
                min_value: None,
                max_value: None,
                reference_range: None,
                calculation_formula: None,
            },
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_update_formula_syncs_calculated_flag() {
        let conn = test_conn();
        let steps = Metric::create(
            &conn,
            &MetricCreate {
                metric_id: Some("STEPS".to_string()),
                name: "Daily Steps".to_string(),
                metric_type: MetricType::Fitness,
                unit: Some("steps".to_string()),
                description: None,
                min_value: None,
                max_value: None,
                reference_range: None,
                calculation_formula: None,
            },
        )
        .unwrap();
        assert!(!steps.is_calculated);

        // Giving a measured metric a formula must make the engine see it
        let updated = Metric::update(
            &conn,
            steps.id,
            &MetricUpdate {
                calculation_formula: Some("WEIGHT * 100".to_string()),
                ..Default::default()
            },
        )
        .unwrap()
        .unwrap();
        assert!(updated.is_calculated);

        // Clearing the formula drops the flag again
        let cleared = Metric::update(
            &conn,
            steps.id,
            &MetricUpdate {
                calculation_formula: Some(String::new()),
                ..Default::default()
            },
        )
        .unwrap()
        .unwrap();
        assert!(!cleared.is_calculated);
        assert!(cleared.calculation_formula.is_empty());
    }

    #[test]
    fn test_list_by_type() {
        let conn = test_conn();
        let labs = Metric::list(&conn, Some(MetricType::LabResult), false).unwrap();
        assert!(!labs.is_empty());
        assert!(labs.iter().all(|m| m.metric_type == MetricType::LabResult));
    }

    #[test]
    fn test_deactivate_hides_from_listing() {
        let conn = test_conn();
        let weight = Metric::get_by_symbol(&conn, "WEIGHT").unwrap().unwrap();
        assert!(Metric::deactivate(&conn, weight.id).unwrap());

        let active = Metric::list(&conn, None, false).unwrap();
        assert!(active.iter().all(|m| m.id != weight.id));

        let all = Metric::list(&conn, None, true).unwrap();
        assert!(all.iter().any(|m| m.id == weight.id));
    }

    #[test]
    fn test_classify_value() {
        let conn = test_conn();
        let glucose = Metric::get_by_symbol(&conn, "GLUCOSE").unwrap().unwrap();
        assert_eq!(glucose.classify_value(90.0), ValueStatus::Normal);
        assert_eq!(glucose.classify_value(10.0), ValueStatus::Low);
        assert_eq!(glucose.classify_value(700.0), ValueStatus::High);
    }
}
