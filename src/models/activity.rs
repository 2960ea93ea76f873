//! Activity models
//!
//! Activity types carry an energy expenditure rate (kcal per hour per kg
//! of body weight). Planned activities are scheduled for a date and can
//! be marked completed; activity records are what actually happened and
//! feed the daily TDEE multiplier.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};

/// An activity type with its energy expenditure rate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityType {
    pub id: i64,
    pub name: String,
    pub display_name: String,
    pub calories_per_hour_per_kg: f64,
    pub category: String,
    pub is_active: bool,
    pub is_default: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for creating an activity type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityTypeCreate {
    pub name: String,
    pub display_name: Option<String>,
    pub calories_per_hour_per_kg: f64,
    pub category: Option<String>,
}

/// Data for updating an activity type
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivityTypeUpdate {
    pub display_name: Option<String>,
    pub calories_per_hour_per_kg: Option<f64>,
    pub category: Option<String>,
    pub is_active: Option<bool>,
}

impl ActivityType {
    /// Create from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            display_name: row.get("display_name")?,
            calories_per_hour_per_kg: row.get("calories_per_hour_per_kg")?,
            category: row.get("category")?,
            is_active: row.get("is_active")?,
            is_default: row.get("is_default")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Create a new activity type
    pub fn create(conn: &Connection, data: &ActivityTypeCreate) -> DbResult<Self> {
        if data.calories_per_hour_per_kg <= 0.0 {
            return Err(DbError::Invalid(
                "energy expenditure rate must be positive".to_string(),
            ));
        }

        let name = data.name.to_lowercase().replace([' ', '-'], "_");
        let display_name = data
            .display_name
            .clone()
            .unwrap_or_else(|| data.name.clone());

        conn.execute(
            r#"
            INSERT INTO activity_types (name, display_name, calories_per_hour_per_kg, category)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                name,
                display_name,
                data.calories_per_hour_per_kg,
                data.category.clone().unwrap_or_default(),
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?
            .ok_or_else(|| DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    /// Get an activity type by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM activity_types WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(at) => Ok(Some(at)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Get an activity type by name (case-insensitive)
    pub fn get_by_name(conn: &Connection, name: &str) -> DbResult<Option<Self>> {
        let normalized = name.to_lowercase().replace([' ', '-'], "_");
        let mut stmt = conn.prepare("SELECT * FROM activity_types WHERE name = ?1")?;

        let result = stmt.query_row([normalized], Self::from_row);
        match result {
            Ok(at) => Ok(Some(at)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Resolve by name first, then numeric id.
    pub fn resolve(conn: &Connection, identifier: &str) -> DbResult<Option<Self>> {
        if let Some(at) = Self::get_by_name(conn, identifier)? {
            return Ok(Some(at));
        }
        if let Ok(id) = identifier.parse::<i64>() {
            return Self::get_by_id(conn, id);
        }
        Ok(None)
    }

    /// List activity types, active only unless requested
    pub fn list(conn: &Connection, include_inactive: bool) -> DbResult<Vec<Self>> {
        let sql = if include_inactive {
            "SELECT * FROM activity_types ORDER BY category, display_name"
        } else {
            "SELECT * FROM activity_types WHERE is_active = 1 ORDER BY category, display_name"
        };

        let mut stmt = conn.prepare(sql)?;
        let types = stmt
            .query_map([], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(types)
    }

    /// Update an activity type
    pub fn update(conn: &Connection, id: i64, data: &ActivityTypeUpdate) -> DbResult<Option<Self>> {
        let mut updates = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref display_name) = data.display_name {
            updates.push(format!("display_name = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(display_name.clone()));
        }
        if let Some(rate) = data.calories_per_hour_per_kg {
            if rate <= 0.0 {
                return Err(DbError::Invalid(
                    "energy expenditure rate must be positive".to_string(),
                ));
            }
            updates.push(format!("calories_per_hour_per_kg = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(rate));
        }
        if let Some(ref category) = data.category {
            updates.push(format!("category = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(category.clone()));
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
            "UPDATE activity_types SET {} WHERE id = ?{}",
            updates.join(", "),
            params_vec.len() + 1
        );

        params_vec.push(Box::new(id));

        let params_refs: Vec<&dyn rusqlite::ToSql> =
            params_vec.iter().map(|p| p.as_ref()).collect();
        conn.execute(&sql, params_refs.as_slice())?;

        Self::get_by_id(conn, id)
    }

    /// Delete an activity type and its planned/recorded activities (cascade)
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM activity_types WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}

/// A scheduled activity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedActivity {
    pub id: i64,
    pub activity_type_id: i64,
    pub duration_hours: f64,
    pub date: String,
    pub is_completed: bool,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for creating a planned activity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedActivityCreate {
    pub activity_type_id: i64,
    pub duration_hours: f64,
    pub date: String,
    pub notes: Option<String>,
}

impl PlannedActivity {
    /// Create from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            activity_type_id: row.get("activity_type_id")?,
            duration_hours: row.get("duration_hours")?,
            date: row.get("date")?,
            is_completed: row.get("is_completed")?,
            notes: row.get("notes")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Schedule an activity
    pub fn create(conn: &Connection, data: &PlannedActivityCreate) -> DbResult<Self> {
        if data.duration_hours <= 0.0 {
            return Err(DbError::Invalid("duration must be positive".to_string()));
        }

        conn.execute(
            r#"
            INSERT INTO planned_activities (activity_type_id, duration_hours, date, notes)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                data.activity_type_id,
                data.duration_hours,
                data.date,
                data.notes,
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?
            .ok_or_else(|| DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    /// Get a planned activity by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM planned_activities WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(pa) => Ok(Some(pa)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List planned activities for a date
    pub fn list_by_date(conn: &Connection, date: &str) -> DbResult<Vec<Self>> {
        let mut stmt = conn
            .prepare("SELECT * FROM planned_activities WHERE date = ?1 ORDER BY created_at")?;
        let activities = stmt
            .query_map([date], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(activities)
    }

    /// List planned activities within a date range
    pub fn list_by_date_range(conn: &Connection, start: &str, end: &str) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM planned_activities WHERE date >= ?1 AND date <= ?2 ORDER BY date",
        )?;
        let activities = stmt
            .query_map(params![start, end], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(activities)
    }

    /// List plans for a date, joined with their type's rate
    pub fn list_by_date_detailed(conn: &Connection, date: &str) -> DbResult<Vec<ActivityDetail>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT pa.id, at.name AS activity_name, at.display_name,
                   pa.duration_hours, at.calories_per_hour_per_kg, pa.date, pa.notes
            FROM planned_activities pa
            INNER JOIN activity_types at ON at.id = pa.activity_type_id
            WHERE pa.date = ?1
            ORDER BY pa.created_at
            "#,
        )?;

        let plans = stmt
            .query_map([date], ActivityDetail::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(plans)
    }

    /// Mark a planned activity as completed and log a matching record.
    /// Returns None when the plan doesn't exist.
    pub fn complete(conn: &Connection, id: i64) -> DbResult<Option<ActivityRecord>> {
        let plan = match Self::get_by_id(conn, id)? {
            Some(p) => p,
            None => return Ok(None),
        };

        if plan.is_completed {
            return Err(DbError::Invalid(format!(
                "planned activity {} is already completed",
                id
            )));
        }

        conn.execute(
            "UPDATE planned_activities SET is_completed = 1, updated_at = datetime('now') WHERE id = ?1",
            [id],
        )?;

        let record = ActivityRecord::create(
            conn,
            &ActivityRecordCreate {
                activity_type_id: plan.activity_type_id,
                duration_hours: plan.duration_hours,
                date: plan.date.clone(),
                notes: plan.notes.clone(),
            },
        )?;

        Ok(Some(record))
    }

    /// Delete a planned activity
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM planned_activities WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}

/// A logged activity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub id: i64,
    pub activity_type_id: i64,
    pub duration_hours: f64,
    pub date: String,
    pub notes: Option<String>,
    pub created_at: String,
}

/// Data for logging an activity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityRecordCreate {
    pub activity_type_id: i64,
    pub duration_hours: f64,
    pub date: String,
    pub notes: Option<String>,
}

/// A planned or logged activity joined with its type, for energy accounting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityDetail {
    pub id: i64,
    pub activity_name: String,
    pub display_name: String,
    pub duration_hours: f64,
    pub calories_per_hour_per_kg: f64,
    pub date: String,
    pub notes: Option<String>,
}

impl ActivityDetail {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            activity_name: row.get("activity_name")?,
            display_name: row.get("display_name")?,
            duration_hours: row.get("duration_hours")?,
            calories_per_hour_per_kg: row.get("calories_per_hour_per_kg")?,
            date: row.get("date")?,
            notes: row.get("notes")?,
        })
    }
}

impl ActivityRecord {
    /// Create from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            activity_type_id: row.get("activity_type_id")?,
            duration_hours: row.get("duration_hours")?,
            date: row.get("date")?,
            notes: row.get("notes")?,
            created_at: row.get("created_at")?,
        })
    }

    /// Log an activity
    pub fn create(conn: &Connection, data: &ActivityRecordCreate) -> DbResult<Self> {
        if data.duration_hours <= 0.0 {
            return Err(DbError::Invalid("duration must be positive".to_string()));
        }

        conn.execute(
            r#"
            INSERT INTO activity_records (activity_type_id, duration_hours, date, notes)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                data.activity_type_id,
                data.duration_hours,
                data.date,
                data.notes,
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?
            .ok_or_else(|| DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    /// Get a record by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM activity_records WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List records for a date, joined with their type's rate
    pub fn list_by_date_detailed(conn: &Connection, date: &str) -> DbResult<Vec<ActivityDetail>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT ar.id, at.name AS activity_name, at.display_name,
                   ar.duration_hours, at.calories_per_hour_per_kg, ar.date, ar.notes
            FROM activity_records ar
            INNER JOIN activity_types at ON at.id = ar.activity_type_id
            WHERE ar.date = ?1
            ORDER BY ar.created_at
            "#,
        )?;

        let records = stmt
            .query_map([date], ActivityDetail::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    /// List records within a date range
    pub fn list_by_date_range(conn: &Connection, start: &str, end: &str) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM activity_records WHERE date >= ?1 AND date <= ?2 ORDER BY date",
        )?;
        let records = stmt
            .query_map(params![start, end], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    /// Delete a record
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM activity_records WHERE id = ?1", [id])?;
        Ok(rows > 0)
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
    fn test_default_types_seeded() {
        let conn = test_conn();
        let types = ActivityType::list(&conn, false).unwrap();
        assert!(types.len() >= 7);

        let running = ActivityType::get_by_name(&conn, "running").unwrap().unwrap();
        assert_eq!(running.calories_per_hour_per_kg, 8.0);
        assert!(running.is_default);
    }

    #[test]
    fn test_name_normalization() {
        let conn = test_conn();
        let created = ActivityType::create(
            &conn,
            &ActivityTypeCreate {
                name: "Rock Climbing".to_string(),
                display_name: None,
                calories_per_hour_per_kg: 9.0,
                category: Some("strength".to_string()),
            },
        )
        .unwrap();
        assert_eq!(created.name, "rock_climbing");

        let found = ActivityType::get_by_name(&conn, "Rock Climbing").unwrap();
        assert!(found.is_some());
    }

    #[test]
    fn test_rejects_nonpositive_rate() {
        let conn = test_conn();
        let result = ActivityType::create(
            &conn,
            &ActivityTypeCreate {
                name: "standing".to_string(),
                display_name: None,
                calories_per_hour_per_kg: 0.0,
                category: None,
            },
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_complete_plan_creates_record() {
        let conn = test_conn();
        let running = ActivityType::get_by_name(&conn, "running").unwrap().unwrap();

        let plan = PlannedActivity::create(
            &conn,
            &PlannedActivityCreate {
                activity_type_id: running.id,
                duration_hours: 1.5,
                date: "2025-03-01".to_string(),
                notes: None,
            },
        )
        .unwrap();
        assert!(!plan.is_completed);

        let record = PlannedActivity::complete(&conn, plan.id).unwrap().unwrap();
        assert_eq!(record.duration_hours, 1.5);
        assert_eq!(record.date, "2025-03-01");

        let plan = PlannedActivity::get_by_id(&conn, plan.id).unwrap().unwrap();
        assert!(plan.is_completed);

        // Completing twice is an error
        assert!(PlannedActivity::complete(&conn, plan.id).is_err());
    }

    #[test]
    fn test_records_joined_with_rate() {
        let conn = test_conn();
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

        let details = ActivityRecord::list_by_date_detailed(&conn, "2025-03-01").unwrap();
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].calories_per_hour_per_kg, 6.0);
        assert_eq!(details[0].duration_hours, 2.0);
    }
}
