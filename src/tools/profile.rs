//! Profile MCP tools

use serde::Serialize;

use crate::db::Database;
use crate::models::{Gender, Profile};

/// Response for get_profile / set_profile
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub name: String,
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    pub age: Option<u32>,
    pub updated_at: String,
}

impl From<Profile> for ProfileResponse {
    fn from(profile: Profile) -> Self {
        let age = profile.age();
        Self {
            name: profile.name,
            date_of_birth: profile.date_of_birth,
            gender: profile.gender.map(|g| g.as_str().to_string()),
            age,
            updated_at: profile.updated_at,
        }
    }
}

/// Set or update the owner profile
pub fn set_profile(
    db: &Database,
    name: &str,
    date_of_birth: Option<&str>,
    gender: Option<&str>,
) -> Result<ProfileResponse, String> {
    if name.trim().is_empty() {
        return Err("Name must not be empty".to_string());
    }

    let gender = match gender {
        Some(g) => Some(
            Gender::from_str(g)
                .ok_or_else(|| format!("Invalid gender: '{}'. Valid values: male, female", g))?,
        ),
        None => None,
    };

    if let Some(dob) = date_of_birth {
        chrono::NaiveDate::parse_from_str(dob, "%Y-%m-%d")
            .map_err(|_| format!("Invalid date of birth: '{}'. Expected YYYY-MM-DD", dob))?;
    }

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let profile = Profile::set(&conn, name.trim(), date_of_birth, gender)
        .map_err(|e| format!("Failed to set profile: {}", e))?;

    Ok(profile.into())
}

/// Get the owner profile
pub fn get_profile(db: &Database) -> Result<Option<ProfileResponse>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let profile = Profile::get(&conn).map_err(|e| format!("Failed to get profile: {}", e))?;

    Ok(profile.map(ProfileResponse::from))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Named shared-memory database so every pooled connection sees the
    // same data.
    fn test_db(name: &str) -> Database {
        let db = Database::new(format!("file:{}?mode=memory&cache=shared", name)).unwrap();
        let conn = db.get_conn().unwrap();
        crate::db::migrations::run_migrations(&conn).unwrap();
        db
    }

    #[test]
    fn test_set_and_get_profile() {
        let db = test_db("profile_set_get");
        assert!(get_profile(&db).unwrap().is_none());

        let response = set_profile(&db, "Alex", Some("1990-06-15"), Some("male")).unwrap();
        assert_eq!(response.name, "Alex");
        assert_eq!(response.gender.as_deref(), Some("male"));
        assert!(response.age.is_some());

        assert!(get_profile(&db).unwrap().is_some());
    }

    #[test]
    fn test_set_profile_validation() {
        let db = test_db("profile_validation");
        assert!(set_profile(&db, "", None, None).is_err());
        assert!(set_profile(&db, "Alex", Some("15/06/1990"), None).is_err());
        assert!(set_profile(&db, "Alex", None, Some("other")).is_err());
    }
}
