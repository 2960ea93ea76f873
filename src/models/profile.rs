//! Profile model
//!
//! Single-row owner profile. Date of birth and gender feed the BMR
//! calculation when the caller doesn't supply them directly.

use chrono::{Datelike, NaiveDate};
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;

/// Biological gender, as used by the Mifflin-St Jeor equation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "male" | "m" => Some(Gender::Male),
            "female" | "f" => Some(Gender::Female),
            _ => None,
        }
    }

    /// Numeric encoding used in formula evaluation (1 = male, 0 = female)
    pub fn as_formula_value(&self) -> f64 {
        match self {
            Gender::Male => 1.0,
            Gender::Female => 0.0,
        }
    }
}

/// Owner profile (single row, id = 1)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: i64,
    pub name: String,
    pub date_of_birth: Option<String>,
    pub gender: Option<Gender>,
    pub created_at: String,
    pub updated_at: String,
}

impl Profile {
    /// Create from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let gender_str: Option<String> = row.get("gender")?;
        let gender = gender_str.as_deref().and_then(Gender::from_str);

        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            date_of_birth: row.get("date_of_birth")?,
            gender,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Get the profile (single row table)
    pub fn get(conn: &Connection) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM profile WHERE id = 1")?;

        let result = stmt.query_row([], Self::from_row);
        match result {
            Ok(profile) => Ok(Some(profile)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Set or update the profile (upsert)
    pub fn set(
        conn: &Connection,
        name: &str,
        date_of_birth: Option<&str>,
        gender: Option<Gender>,
    ) -> DbResult<Self> {
        conn.execute(
            r#"
            INSERT INTO profile (id, name, date_of_birth, gender)
            VALUES (1, ?1, ?2, ?3)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                date_of_birth = excluded.date_of_birth,
                gender = excluded.gender,
                updated_at = datetime('now')
            "#,
            params![name, date_of_birth, gender.map(|g| g.as_str())],
        )?;

        Self::get(conn)?
            .ok_or_else(|| crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    /// Age in whole years as of the given date. Returns None when the
    /// date of birth is missing, unparseable, or implausible.
    pub fn age_on(&self, today: NaiveDate) -> Option<u32> {
        let dob_str = self.date_of_birth.as_deref()?;
        let dob = NaiveDate::parse_from_str(dob_str, "%Y-%m-%d").ok()?;

        let mut age = today.year() - dob.year();
        if (today.month(), today.day()) < (dob.month(), dob.day()) {
            age -= 1;
        }

        if !(0..=120).contains(&age) {
            return None;
        }
        Some(age as u32)
    }

    /// Age in whole years as of today
    pub fn age(&self) -> Option<u32> {
        self.age_on(chrono::Utc::now().date_naive())
    }
}
