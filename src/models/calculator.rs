//! Calculator session model
//!
//! A session is a snapshot of the inputs to one run of the health
//! calculator (weight, height, body fat, gender, activity level). The
//! derived outputs land in metric_values as `calculated` rows.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};
use crate::models::profile::Gender;

/// Activity level enum with TDEE multipliers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Sedentary,
    LightlyActive,
    ModeratelyActive,
    VeryActive,
    ExtremelyActive,
}

impl ActivityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityLevel::Sedentary => "sedentary",
            ActivityLevel::LightlyActive => "lightly_active",
            ActivityLevel::ModeratelyActive => "moderately_active",
            ActivityLevel::VeryActive => "very_active",
            ActivityLevel::ExtremelyActive => "extremely_active",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().replace([' ', '-'], "_").as_str() {
            "sedentary" => Some(ActivityLevel::Sedentary),
            "lightly_active" | "light" => Some(ActivityLevel::LightlyActive),
            "moderately_active" | "moderate" => Some(ActivityLevel::ModeratelyActive),
            "very_active" => Some(ActivityLevel::VeryActive),
            "extremely_active" | "extreme" | "athlete" => Some(ActivityLevel::ExtremelyActive),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ActivityLevel::Sedentary => "Sedentary (little or no exercise)",
            ActivityLevel::LightlyActive => "Lightly Active (1-3 days/week)",
            ActivityLevel::ModeratelyActive => "Moderately Active (3-5 days/week)",
            ActivityLevel::VeryActive => "Very Active (6-7 days/week)",
            ActivityLevel::ExtremelyActive => "Extremely Active (physical job or 2x training)",
        }
    }

    /// TDEE multiplier applied to BMR
    pub fn multiplier(&self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.2,
            ActivityLevel::LightlyActive => 1.375,
            ActivityLevel::ModeratelyActive => 1.55,
            ActivityLevel::VeryActive => 1.725,
            ActivityLevel::ExtremelyActive => 1.9,
        }
    }

    pub fn all() -> &'static [ActivityLevel] {
        &[
            ActivityLevel::Sedentary,
            ActivityLevel::LightlyActive,
            ActivityLevel::ModeratelyActive,
            ActivityLevel::VeryActive,
            ActivityLevel::ExtremelyActive,
        ]
    }
}

/// A saved calculator input snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculatorSession {
    pub id: i64,
    pub weight_kg: f64,
    pub height_cm: f64,
    pub body_fat_pct: f64,
    pub gender: Gender,
    pub activity_level: ActivityLevel,
    pub activity_hours_per_week: f64,
    pub notes: String,
    pub calculation_date: String,
    pub created_at: String,
}

/// Data for creating a calculator session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculatorSessionCreate {
    pub weight_kg: f64,
    pub height_cm: f64,
    pub body_fat_pct: f64,
    pub gender: Gender,
    pub activity_level: ActivityLevel,
    pub activity_hours_per_week: Option<f64>,
    pub notes: Option<String>,
}

impl CalculatorSession {
    /// Create from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let gender_str: String = row.get("gender")?;
        let gender = Gender::from_str(&gender_str).unwrap_or(Gender::Male);
        let level_str: String = row.get("activity_level")?;
        let activity_level =
            ActivityLevel::from_str(&level_str).unwrap_or(ActivityLevel::ModeratelyActive);

        Ok(Self {
            id: row.get("id")?,
            weight_kg: row.get("weight_kg")?,
            height_cm: row.get("height_cm")?,
            body_fat_pct: row.get("body_fat_pct")?,
            gender,
            activity_level,
            activity_hours_per_week: row.get("activity_hours_per_week")?,
            notes: row.get("notes")?,
            calculation_date: row.get("calculation_date")?,
            created_at: row.get("created_at")?,
        })
    }

    /// Save a new session
    pub fn create(conn: &Connection, data: &CalculatorSessionCreate) -> DbResult<Self> {
        if data.weight_kg <= 0.0 || data.height_cm <= 0.0 {
            return Err(DbError::Invalid(
                "weight and height must be positive".to_string(),
            ));
        }
        if !(0.0..=100.0).contains(&data.body_fat_pct) {
            return Err(DbError::Invalid(
                "body fat percentage must be between 0 and 100".to_string(),
            ));
        }

        conn.execute(
            r#"
            INSERT INTO calculator_sessions
            (weight_kg, height_cm, body_fat_pct, gender, activity_level,
             activity_hours_per_week, notes)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                data.weight_kg,
                data.height_cm,
                data.body_fat_pct,
                data.gender.as_str(),
                data.activity_level.as_str(),
                data.activity_hours_per_week.unwrap_or(0.0),
                data.notes.clone().unwrap_or_default(),
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?
            .ok_or_else(|| DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    /// Get a session by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM calculator_sessions WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(session) => Ok(Some(session)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Most recent session
    pub fn latest(conn: &Connection) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM calculator_sessions ORDER BY calculation_date DESC, id DESC LIMIT 1",
        )?;

        let result = stmt.query_row([], Self::from_row);
        match result {
            Ok(session) => Ok(Some(session)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List sessions, newest first
    pub fn list(conn: &Connection, limit: Option<i64>) -> DbResult<Vec<Self>> {
        let sql = match limit {
            Some(n) => format!(
                "SELECT * FROM calculator_sessions ORDER BY calculation_date DESC, id DESC LIMIT {}",
                n
            ),
            None => {
                "SELECT * FROM calculator_sessions ORDER BY calculation_date DESC, id DESC"
                    .to_string()
            }
        };

        let mut stmt = conn.prepare(&sql)?;
        let sessions = stmt
            .query_map([], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(sessions)
    }

    /// Delete a session
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM calculator_sessions WHERE id = ?1", [id])?;
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

    fn sample() -> CalculatorSessionCreate {
        CalculatorSessionCreate {
            weight_kg: 80.0,
            height_cm: 178.0,
            body_fat_pct: 22.0,
            gender: Gender::Male,
            activity_level: ActivityLevel::ModeratelyActive,
            activity_hours_per_week: Some(5.0),
            notes: None,
        }
    }

    #[test]
    fn test_multipliers() {
        assert_eq!(ActivityLevel::Sedentary.multiplier(), 1.2);
        assert_eq!(ActivityLevel::LightlyActive.multiplier(), 1.375);
        assert_eq!(ActivityLevel::ModeratelyActive.multiplier(), 1.55);
        assert_eq!(ActivityLevel::VeryActive.multiplier(), 1.725);
        assert_eq!(ActivityLevel::ExtremelyActive.multiplier(), 1.9);
    }

    #[test]
    fn test_create_and_latest() {
        let conn = test_conn();
        let session = CalculatorSession::create(&conn, &sample()).unwrap();
        assert_eq!(session.weight_kg, 80.0);

        let latest = CalculatorSession::latest(&conn).unwrap().unwrap();
        assert_eq!(latest.id, session.id);
    }

    #[test]
    fn test_rejects_invalid_inputs() {
        let conn = test_conn();

        let mut data = sample();
        data.weight_kg = 0.0;
        assert!(CalculatorSession::create(&conn, &data).is_err());

        let mut data = sample();
        data.body_fat_pct = 150.0;
        assert!(CalculatorSession::create(&conn, &data).is_err());
    }

    #[test]
    fn test_list_and_delete() {
        let conn = test_conn();
        let a = CalculatorSession::create(&conn, &sample()).unwrap();
        CalculatorSession::create(&conn, &sample()).unwrap();

        assert_eq!(CalculatorSession::list(&conn, None).unwrap().len(), 2);
        assert!(CalculatorSession::delete(&conn, a.id).unwrap());
        assert_eq!(CalculatorSession::list(&conn, None).unwrap().len(), 1);
    }
}
