//! Metric value model
//!
//! Append-only observation log. Each row ties a value to a catalog metric
//! with a measurement type that says what kind of observation it is:
//! `log`, `current`, and `baseline` rows describe the body as measured and
//! feed formula evaluation; `target` and `goal` rows express intent;
//! `calculated` rows are engine output and never feed back into formulas.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};

/// Measurement type enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementType {
    Baseline,
    Target,
    Current,
    Log,
    Goal,
    Calculated,
}

impl MeasurementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeasurementType::Baseline => "baseline",
            MeasurementType::Target => "target",
            MeasurementType::Current => "current",
            MeasurementType::Log => "log",
            MeasurementType::Goal => "goal",
            MeasurementType::Calculated => "calculated",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "baseline" => Some(MeasurementType::Baseline),
            "target" => Some(MeasurementType::Target),
            "current" => Some(MeasurementType::Current),
            "log" => Some(MeasurementType::Log),
            "goal" => Some(MeasurementType::Goal),
            "calculated" => Some(MeasurementType::Calculated),
            _ => None,
        }
    }

    /// Whether rows of this type describe the body as measured and may
    /// feed formula evaluation.
    pub fn is_observation(&self) -> bool {
        matches!(
            self,
            MeasurementType::Log | MeasurementType::Current | MeasurementType::Baseline
        )
    }
}

/// Status classification for a recorded value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueStatus {
    Normal,
    High,
    Low,
    Critical,
    Pending,
}

impl ValueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueStatus::Normal => "normal",
            ValueStatus::High => "high",
            ValueStatus::Low => "low",
            ValueStatus::Critical => "critical",
            ValueStatus::Pending => "pending",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "normal" => Some(ValueStatus::Normal),
            "high" => Some(ValueStatus::High),
            "low" => Some(ValueStatus::Low),
            "critical" => Some(ValueStatus::Critical),
            "pending" => Some(ValueStatus::Pending),
            _ => None,
        }
    }
}

/// A recorded metric value
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricValue {
    pub id: i64,
    pub metric_id: i64,
    pub value: f64,
    pub measurement_type: MeasurementType,
    pub status: ValueStatus,
    pub notes: String,
    pub source: String,
    /// JSON snapshot of formula inputs, set on calculated rows
    pub calculation_inputs: Option<String>,
    pub timestamp: String,
    pub created_at: String,
}

/// Data for creating a new metric value
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricValueCreate {
    pub metric_id: i64,
    pub value: f64,
    pub measurement_type: MeasurementType,
    pub status: Option<ValueStatus>,
    pub notes: Option<String>,
    pub source: Option<String>,
    pub calculation_inputs: Option<String>,
    pub timestamp: Option<String>,
}

/// Latest observation per metric, joined with the catalog symbol
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatestObservation {
    pub metric_id: i64,
    pub symbol: Option<String>,
    pub name: String,
    pub unit: String,
    pub value: f64,
    pub timestamp: String,
}

impl MetricValue {
    /// Create from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let type_str: String = row.get("measurement_type")?;
        let measurement_type = MeasurementType::from_str(&type_str).unwrap_or(MeasurementType::Log);
        let status_str: String = row.get("status")?;
        let status = ValueStatus::from_str(&status_str).unwrap_or(ValueStatus::Normal);

        Ok(Self {
            id: row.get("id")?,
            metric_id: row.get("metric_id")?,
            value: row.get("value")?,
            measurement_type,
            status,
            notes: row.get("notes")?,
            source: row.get("source")?,
            calculation_inputs: row.get("calculation_inputs")?,
            timestamp: row.get("timestamp")?,
            created_at: row.get("created_at")?,
        })
    }

    /// Record a new value
    pub fn create(conn: &Connection, data: &MetricValueCreate) -> DbResult<Self> {
        let timestamp = data
            .timestamp
            .clone()
            .unwrap_or_else(|| chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string());

        conn.execute(
            r#"
            INSERT INTO metric_values
            (metric_id, value, measurement_type, status, notes, source,
             calculation_inputs, timestamp)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                data.metric_id,
                data.value,
                data.measurement_type.as_str(),
                data.status.unwrap_or(ValueStatus::Normal).as_str(),
                data.notes.clone().unwrap_or_default(),
                data.source.clone().unwrap_or_default(),
                data.calculation_inputs,
                timestamp,
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?
            .ok_or_else(|| DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    /// Get a value by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM metric_values WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List values for a metric, newest first
    pub fn list_by_metric(
        conn: &Connection,
        metric_id: i64,
        measurement_type: Option<MeasurementType>,
        limit: Option<i64>,
    ) -> DbResult<Vec<Self>> {
        let mut sql =
            "SELECT * FROM metric_values WHERE metric_id = ?1".to_string();
        if measurement_type.is_some() {
            sql.push_str(" AND measurement_type = ?2");
        }
        sql.push_str(" ORDER BY timestamp DESC");
        if let Some(n) = limit {
            sql.push_str(&format!(" LIMIT {}", n));
        }

        let mut stmt = conn.prepare(&sql)?;
        let values = match measurement_type {
            Some(mt) => stmt
                .query_map(params![metric_id, mt.as_str()], Self::from_row)?
                .collect::<Result<Vec<_>, _>>()?,
            None => stmt
                .query_map([metric_id], Self::from_row)?
                .collect::<Result<Vec<_>, _>>()?,
        };

        Ok(values)
    }

    /// List values for a metric within a date range, newest first
    pub fn list_by_date_range(
        conn: &Connection,
        metric_id: i64,
        start: &str,
        end: &str,
    ) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM metric_values
            WHERE metric_id = ?1 AND timestamp >= ?2 AND timestamp <= ?3
            ORDER BY timestamp DESC
            "#,
        )?;
        let values = stmt
            .query_map(params![metric_id, start, end], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(values)
    }

    /// Latest observation for a metric. Only `log`, `current`, and
    /// `baseline` rows count; targets, goals, and calculated output
    /// never shadow a real measurement.
    pub fn latest_observation(conn: &Connection, metric_id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM metric_values
            WHERE metric_id = ?1 AND measurement_type IN ('log', 'current', 'baseline')
            ORDER BY timestamp DESC, id DESC
            LIMIT 1
            "#,
        )?;

        let result = stmt.query_row([metric_id], Self::from_row);
        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Latest observation per metric across the whole catalog, keyed by
    /// symbolic id where one exists.
    pub fn latest_observations(conn: &Connection) -> DbResult<Vec<LatestObservation>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT m.id AS metric_id, m.metric_id AS symbol, m.name, m.unit,
                   mv.value, mv.timestamp
            FROM metrics m
            INNER JOIN metric_values mv ON mv.id = (
                SELECT id FROM metric_values
                WHERE metric_id = m.id
                  AND measurement_type IN ('log', 'current', 'baseline')
                ORDER BY timestamp DESC, id DESC
                LIMIT 1
            )
            WHERE m.is_active = 1
            ORDER BY m.name
            "#,
        )?;

        let observations = stmt
            .query_map([], |row| {
                Ok(LatestObservation {
                    metric_id: row.get("metric_id")?,
                    symbol: row.get("symbol")?,
                    name: row.get("name")?,
                    unit: row.get("unit")?,
                    value: row.get("value")?,
                    timestamp: row.get("timestamp")?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(observations)
    }

    /// Set a target value. Reuses the latest target row when it is at
    /// most one day old; otherwise appends a new row so target history
    /// is preserved. Timestamps in this table sort lexically, so the
    /// cutoff and the rewritten timestamp must use the same format
    /// `create` writes.
    pub fn set_target(
        conn: &Connection,
        metric_id: i64,
        value: f64,
        notes: Option<&str>,
    ) -> DbResult<Self> {
        let now = chrono::Utc::now();
        let timestamp = now.format("%Y-%m-%dT%H:%M:%SZ").to_string();
        let cutoff = (now - chrono::Duration::days(1))
            .format("%Y-%m-%dT%H:%M:%SZ")
            .to_string();

        let recent: Option<i64> = {
            let mut stmt = conn.prepare(
                r#"
                SELECT id FROM metric_values
                WHERE metric_id = ?1 AND measurement_type = 'target'
                  AND timestamp >= ?2
                ORDER BY timestamp DESC, id DESC
                LIMIT 1
                "#,
            )?;
            match stmt.query_row(params![metric_id, cutoff], |row| row.get(0)) {
                Ok(id) => Some(id),
                Err(rusqlite::Error::QueryReturnedNoRows) => None,
                Err(e) => return Err(e.into()),
            }
        };

        match recent {
            Some(id) => {
                match notes {
                    Some(n) => conn.execute(
                        "UPDATE metric_values SET value = ?1, notes = ?2, timestamp = ?3 WHERE id = ?4",
                        params![value, n, timestamp, id],
                    )?,
                    None => conn.execute(
                        "UPDATE metric_values SET value = ?1, timestamp = ?2 WHERE id = ?3",
                        params![value, timestamp, id],
                    )?,
                };
                Self::get_by_id(conn, id)?
                    .ok_or_else(|| DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
            }
            None => Self::create(
                conn,
                &MetricValueCreate {
                    metric_id,
                    value,
                    measurement_type: MeasurementType::Target,
                    status: None,
                    notes: notes.map(|s| s.to_string()),
                    source: None,
                    calculation_inputs: None,
                    timestamp: Some(timestamp),
                },
            ),
        }
    }

    /// Latest target for a metric
    pub fn latest_target(conn: &Connection, metric_id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM metric_values
            WHERE metric_id = ?1 AND measurement_type = 'target'
            ORDER BY timestamp DESC, id DESC
            LIMIT 1
            "#,
        )?;

        let result = stmt.query_row([metric_id], Self::from_row);
        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List calculated rows written at an exact timestamp (one calculator
    /// run shares its session's calculation date).
    pub fn list_calculated_at(conn: &Connection, timestamp: &str) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM metric_values
            WHERE measurement_type = 'calculated' AND timestamp = ?1
            ORDER BY metric_id
            "#,
        )?;
        let values = stmt
            .query_map([timestamp], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(values)
    }

    /// Update a value's fields
    pub fn update(
        conn: &Connection,
        id: i64,
        value: Option<f64>,
        notes: Option<String>,
        status: Option<ValueStatus>,
    ) -> DbResult<Option<Self>> {
        let mut updates = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(v) = value {
            updates.push(format!("value = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(v));
        }
        if let Some(ref n) = notes {
            updates.push(format!("notes = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(n.clone()));
        }
        if let Some(s) = status {
            updates.push(format!("status = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(s.as_str()));
        }

        if updates.is_empty() {
            return Self::get_by_id(conn, id);
        }

        let sql = format!(
            "UPDATE metric_values SET {} WHERE id = ?{}",
            updates.join(", "),
            params_vec.len() + 1
        );

        params_vec.push(Box::new(id));

        let params_refs: Vec<&dyn rusqlite::ToSql> =
            params_vec.iter().map(|p| p.as_ref()).collect();
        conn.execute(&sql, params_refs.as_slice())?;

        Self::get_by_id(conn, id)
    }

    /// Delete a value
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM metric_values WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use crate::models::metric::Metric;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    fn weight_id(conn: &Connection) -> i64 {
        Metric::get_by_symbol(conn, "WEIGHT").unwrap().unwrap().id
    }

    fn log_value(conn: &Connection, metric_id: i64, value: f64, timestamp: &str) -> MetricValue {
        MetricValue::create(
            conn,
            &MetricValueCreate {
                metric_id,
                value,
                measurement_type: MeasurementType::Log,
                status: None,
                notes: None,
                source: None,
                calculation_inputs: None,
                timestamp: Some(timestamp.to_string()),
            },
        )
        .unwrap()
    }

    #[test]
    fn test_latest_observation_newest_wins() {
        let conn = test_conn();
        let id = weight_id(&conn);

        log_value(&conn, id, 82.0, "2025-01-01T08:00:00Z");
        log_value(&conn, id, 80.5, "2025-03-01T08:00:00Z");
        log_value(&conn, id, 81.0, "2025-02-01T08:00:00Z");

        let latest = MetricValue::latest_observation(&conn, id).unwrap().unwrap();
        assert_eq!(latest.value, 80.5);
    }

    #[test]
    fn test_targets_do_not_shadow_observations() {
        let conn = test_conn();
        let id = weight_id(&conn);

        log_value(&conn, id, 82.0, "2025-01-01T08:00:00Z");
        MetricValue::create(
            &conn,
            &MetricValueCreate {
                metric_id: id,
                value: 75.0,
                measurement_type: MeasurementType::Target,
                status: None,
                notes: None,
                source: None,
                calculation_inputs: None,
                timestamp: Some("2025-06-01T08:00:00Z".to_string()),
            },
        )
        .unwrap();

        let latest = MetricValue::latest_observation(&conn, id).unwrap().unwrap();
        assert_eq!(latest.value, 82.0);
    }

    #[test]
    fn test_set_target_reuses_recent_row() {
        let conn = test_conn();
        let id = weight_id(&conn);

        let first = MetricValue::set_target(&conn, id, 75.0, None).unwrap();
        let second = MetricValue::set_target(&conn, id, 74.0, None).unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.value, 74.0);

        let targets =
            MetricValue::list_by_metric(&conn, id, Some(MeasurementType::Target), None).unwrap();
        assert_eq!(targets.len(), 1);
    }

    #[test]
    fn test_set_target_reuse_keeps_timestamp_format() {
        let conn = test_conn();
        let id = weight_id(&conn);

        let first = MetricValue::set_target(&conn, id, 75.0, None).unwrap();
        assert!(first.timestamp.contains('T'));

        // Another target appended an hour earlier, in the format create
        // writes. Timestamps compare lexically, so if the reuse-update
        // were to rewrite the row in a different format this stale row
        // would sort above it.
        let earlier = (chrono::Utc::now() - chrono::Duration::hours(1))
            .format("%Y-%m-%dT%H:%M:%SZ")
            .to_string();
        MetricValue::create(
            &conn,
            &MetricValueCreate {
                metric_id: id,
                value: 78.0,
                measurement_type: MeasurementType::Target,
                status: None,
                notes: None,
                source: None,
                calculation_inputs: None,
                timestamp: Some(earlier),
            },
        )
        .unwrap();

        let second = MetricValue::set_target(&conn, id, 74.0, None).unwrap();
        assert_eq!(first.id, second.id);
        assert!(second.timestamp.contains('T'));
        assert!(second.timestamp.ends_with('Z'));

        let latest = MetricValue::latest_target(&conn, id).unwrap().unwrap();
        assert_eq!(latest.id, second.id);
        assert_eq!(latest.value, 74.0);
    }

    #[test]
    fn test_set_target_updates_notes() {
        let conn = test_conn();
        let id = weight_id(&conn);

        let first = MetricValue::set_target(&conn, id, 75.0, Some("cut for spring")).unwrap();
        assert_eq!(first.notes, "cut for spring");

        let second = MetricValue::set_target(&conn, id, 74.0, Some("revised")).unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.notes, "revised");

        // Omitting notes on reuse leaves the stored text alone
        let third = MetricValue::set_target(&conn, id, 73.0, None).unwrap();
        assert_eq!(third.notes, "revised");
    }

    #[test]
    fn test_set_target_appends_after_a_day() {
        let conn = test_conn();
        let id = weight_id(&conn);

        // Old target, outside the reuse window
        MetricValue::create(
            &conn,
            &MetricValueCreate {
                metric_id: id,
                value: 78.0,
                measurement_type: MeasurementType::Target,
                status: None,
                notes: None,
                source: None,
                calculation_inputs: None,
                timestamp: Some("2024-01-01T00:00:00Z".to_string()),
            },
        )
        .unwrap();

        MetricValue::set_target(&conn, id, 75.0, None).unwrap();

        let targets =
            MetricValue::list_by_metric(&conn, id, Some(MeasurementType::Target), None).unwrap();
        assert_eq!(targets.len(), 2);

        let latest = MetricValue::latest_target(&conn, id).unwrap().unwrap();
        assert_eq!(latest.value, 75.0);
    }

    #[test]
    fn test_latest_observations_snapshot() {
        let conn = test_conn();
        let w = weight_id(&conn);
        let h = Metric::get_by_symbol(&conn, "HEIGHT").unwrap().unwrap().id;

        log_value(&conn, w, 80.0, "2025-03-01T08:00:00Z");
        log_value(&conn, h, 178.0, "2025-01-01T08:00:00Z");

        let snapshot = MetricValue::latest_observations(&conn).unwrap();
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot
            .iter()
            .any(|o| o.symbol.as_deref() == Some("WEIGHT") && o.value == 80.0));
        assert!(snapshot
            .iter()
            .any(|o| o.symbol.as_deref() == Some("HEIGHT") && o.value == 178.0));
    }

    #[test]
    fn test_history_window() {
        let conn = test_conn();
        let id = weight_id(&conn);

        log_value(&conn, id, 82.0, "2025-01-01T08:00:00Z");
        log_value(&conn, id, 81.0, "2025-02-01T08:00:00Z");
        log_value(&conn, id, 80.0, "2025-03-01T08:00:00Z");

        let window = MetricValue::list_by_date_range(
            &conn,
            id,
            "2025-01-15T00:00:00Z",
            "2025-02-15T00:00:00Z",
        )
        .unwrap();
        assert_eq!(window.len(), 1);
        assert_eq!(window[0].value, 81.0);
    }
}
