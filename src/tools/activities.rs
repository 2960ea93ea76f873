//! Activity planning and logging MCP tools

use serde::Serialize;

use crate::db::Database;
use crate::health::activity::{self, DailyActivitySummary};
use crate::health::round1;
use crate::models::{
    ActivityDetail, ActivityRecord, ActivityRecordCreate, ActivityType, ActivityTypeCreate,
    PlannedActivity, PlannedActivityCreate,
};

/// Activity type summary for listings
#[derive(Debug, Serialize)]
pub struct ActivityTypeSummary {
    pub id: i64,
    pub name: String,
    pub display_name: String,
    pub calories_per_hour_per_kg: f64,
    pub category: String,
    pub is_default: bool,
}

impl From<&ActivityType> for ActivityTypeSummary {
    fn from(at: &ActivityType) -> Self {
        Self {
            id: at.id,
            name: at.name.clone(),
            display_name: at.display_name.clone(),
            calories_per_hour_per_kg: at.calories_per_hour_per_kg,
            category: at.category.clone(),
            is_default: at.is_default,
        }
    }
}

/// Response for list_activity_types
#[derive(Debug, Serialize)]
pub struct ListActivityTypesResponse {
    pub activity_types: Vec<ActivityTypeSummary>,
    pub total: usize,
}

/// A planned or logged activity with its calorie cost
#[derive(Debug, Serialize)]
pub struct ActivityEntry {
    pub id: i64,
    pub activity: String,
    pub display_name: String,
    pub date: String,
    pub duration_hours: f64,
    pub calories: f64,
    pub notes: Option<String>,
}

impl ActivityEntry {
    fn from_detail(detail: &ActivityDetail, weight_kg: f64) -> Self {
        Self {
            id: detail.id,
            activity: detail.activity_name.clone(),
            display_name: detail.display_name.clone(),
            date: detail.date.clone(),
            duration_hours: detail.duration_hours,
            calories: round1(activity::activity_calories(
                detail.calories_per_hour_per_kg,
                weight_kg,
                detail.duration_hours,
            )),
            notes: detail.notes.clone(),
        }
    }
}

/// Response for plan_activity
#[derive(Debug, Serialize)]
pub struct PlanActivityResponse {
    pub entry: ActivityEntry,
    pub is_completed: bool,
}

/// Response for complete_planned_activity
#[derive(Debug, Serialize)]
pub struct CompletePlanResponse {
    pub plan_id: i64,
    pub record: ActivityEntry,
}

/// Response for the planned/logged listings
#[derive(Debug, Serialize)]
pub struct ListActivitiesResponse {
    pub date: String,
    pub activities: Vec<ActivityEntry>,
    pub total_calories: f64,
    pub total: usize,
}

/// Response for delete operations
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub deleted_id: i64,
}

fn today() -> String {
    chrono::Utc::now().format("%Y-%m-%d").to_string()
}

fn normalize_date(date: Option<&str>) -> Result<String, String> {
    match date {
        Some(d) => {
            chrono::NaiveDate::parse_from_str(d, "%Y-%m-%d")
                .map_err(|_| format!("Invalid date: '{}'. Expected YYYY-MM-DD", d))?;
            Ok(d.to_string())
        }
        None => Ok(today()),
    }
}

fn resolve_activity_type(
    conn: &rusqlite::Connection,
    identifier: &str,
) -> Result<ActivityType, String> {
    ActivityType::resolve(conn, identifier)
        .map_err(|e| format!("Database error: {}", e))?
        .ok_or_else(|| {
            format!(
                "Activity type not found: '{}'. Use list_activity_types to see what exists",
                identifier
            )
        })
}

fn entry_for_plan(
    conn: &rusqlite::Connection,
    at: &ActivityType,
    plan: &PlannedActivity,
) -> Result<ActivityEntry, String> {
    let weight = activity::body_weight_kg(conn).map_err(|e| format!("Database error: {}", e))?;
    Ok(ActivityEntry {
        id: plan.id,
        activity: at.name.clone(),
        display_name: at.display_name.clone(),
        date: plan.date.clone(),
        duration_hours: plan.duration_hours,
        calories: round1(activity::activity_calories(
            at.calories_per_hour_per_kg,
            weight,
            plan.duration_hours,
        )),
        notes: plan.notes.clone(),
    })
}

fn entry_for_record(
    conn: &rusqlite::Connection,
    at: &ActivityType,
    record: &ActivityRecord,
) -> Result<ActivityEntry, String> {
    let weight = activity::body_weight_kg(conn).map_err(|e| format!("Database error: {}", e))?;
    Ok(ActivityEntry {
        id: record.id,
        activity: at.name.clone(),
        display_name: at.display_name.clone(),
        date: record.date.clone(),
        duration_hours: record.duration_hours,
        calories: round1(activity::activity_calories(
            at.calories_per_hour_per_kg,
            weight,
            record.duration_hours,
        )),
        notes: record.notes.clone(),
    })
}

/// List available activity types
pub fn list_activity_types(
    db: &Database,
    include_inactive: bool,
) -> Result<ListActivityTypesResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let types = ActivityType::list(&conn, include_inactive)
        .map_err(|e| format!("Failed to list activity types: {}", e))?;

    let summaries: Vec<ActivityTypeSummary> = types.iter().map(ActivityTypeSummary::from).collect();
    let total = summaries.len();

    Ok(ListActivityTypesResponse {
        activity_types: summaries,
        total,
    })
}

/// Create a custom activity type
pub fn create_activity_type(
    db: &Database,
    name: &str,
    calories_per_hour_per_kg: f64,
    display_name: Option<&str>,
    category: Option<&str>,
) -> Result<ActivityTypeSummary, String> {
    if name.trim().is_empty() {
        return Err("Activity name must not be empty".to_string());
    }

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    if ActivityType::get_by_name(&conn, name)
        .map_err(|e| format!("Database error: {}", e))?
        .is_some()
    {
        return Err(format!("Activity type already exists: '{}'", name));
    }

    let at = ActivityType::create(
        &conn,
        &ActivityTypeCreate {
            name: name.trim().to_string(),
            display_name: display_name.map(String::from),
            calories_per_hour_per_kg,
            category: category.map(String::from),
        },
    )
    .map_err(|e| format!("Failed to create activity type: {}", e))?;

    Ok(ActivityTypeSummary::from(&at))
}

/// Schedule an activity for a date
pub fn plan_activity(
    db: &Database,
    activity: &str,
    duration_hours: f64,
    date: Option<&str>,
    notes: Option<&str>,
) -> Result<PlanActivityResponse, String> {
    let date = normalize_date(date)?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let at = resolve_activity_type(&conn, activity)?;

    let plan = PlannedActivity::create(
        &conn,
        &PlannedActivityCreate {
            activity_type_id: at.id,
            duration_hours,
            date,
            notes: notes.map(String::from),
        },
    )
    .map_err(|e| format!("Failed to plan activity: {}", e))?;

    Ok(PlanActivityResponse {
        entry: entry_for_plan(&conn, &at, &plan)?,
        is_completed: plan.is_completed,
    })
}

/// Log a completed activity
pub fn log_activity(
    db: &Database,
    activity: &str,
    duration_hours: f64,
    date: Option<&str>,
    notes: Option<&str>,
) -> Result<ActivityEntry, String> {
    let date = normalize_date(date)?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let at = resolve_activity_type(&conn, activity)?;

    let record = ActivityRecord::create(
        &conn,
        &ActivityRecordCreate {
            activity_type_id: at.id,
            duration_hours,
            date,
            notes: notes.map(String::from),
        },
    )
    .map_err(|e| format!("Failed to log activity: {}", e))?;

    entry_for_record(&conn, &at, &record)
}

/// Mark a planned activity completed; logs a matching record
pub fn complete_planned_activity(db: &Database, id: i64) -> Result<CompletePlanResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let record = PlannedActivity::complete(&conn, id)
        .map_err(|e| format!("Failed to complete planned activity: {}", e))?
        .ok_or_else(|| format!("Planned activity not found with id: {}", id))?;

    let at = ActivityType::get_by_id(&conn, record.activity_type_id)
        .map_err(|e| format!("Database error: {}", e))?
        .ok_or_else(|| format!("Activity type not found with id: {}", record.activity_type_id))?;

    Ok(CompletePlanResponse {
        plan_id: id,
        record: entry_for_record(&conn, &at, &record)?,
    })
}

fn list_detailed(
    db: &Database,
    date: Option<&str>,
    planned: bool,
) -> Result<ListActivitiesResponse, String> {
    let date = normalize_date(date)?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let weight = activity::body_weight_kg(&conn).map_err(|e| format!("Database error: {}", e))?;

    let details = if planned {
        PlannedActivity::list_by_date_detailed(&conn, &date)
    } else {
        ActivityRecord::list_by_date_detailed(&conn, &date)
    }
    .map_err(|e| format!("Failed to list activities: {}", e))?;

    let activities: Vec<ActivityEntry> = details
        .iter()
        .map(|d| ActivityEntry::from_detail(d, weight))
        .collect();
    let total_calories = round1(activities.iter().map(|a| a.calories).sum::<f64>());
    let total = activities.len();

    Ok(ListActivitiesResponse {
        date,
        activities,
        total_calories,
        total,
    })
}

/// List planned activities for a date (defaults to today)
pub fn list_planned_activities(
    db: &Database,
    date: Option<&str>,
) -> Result<ListActivitiesResponse, String> {
    list_detailed(db, date, true)
}

/// List logged activities for a date (defaults to today)
pub fn list_activity_records(
    db: &Database,
    date: Option<&str>,
) -> Result<ListActivitiesResponse, String> {
    list_detailed(db, date, false)
}

/// Delete a planned activity
pub fn delete_planned_activity(db: &Database, id: i64) -> Result<DeleteResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    if PlannedActivity::get_by_id(&conn, id)
        .map_err(|e| format!("Database error: {}", e))?
        .is_none()
    {
        return Err(format!("Planned activity not found with id: {}", id));
    }

    PlannedActivity::delete(&conn, id).map_err(|e| format!("Failed to delete: {}", e))?;

    Ok(DeleteResponse {
        success: true,
        deleted_id: id,
    })
}

/// Delete a logged activity record
pub fn delete_activity_record(db: &Database, id: i64) -> Result<DeleteResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    if ActivityRecord::get_by_id(&conn, id)
        .map_err(|e| format!("Database error: {}", e))?
        .is_none()
    {
        return Err(format!("Activity record not found with id: {}", id));
    }

    ActivityRecord::delete(&conn, id).map_err(|e| format!("Failed to delete: {}", e))?;

    Ok(DeleteResponse {
        success: true,
        deleted_id: id,
    })
}

/// Planned vs. logged energy picture for a date (defaults to today)
pub fn get_daily_activity_summary(
    db: &Database,
    date: Option<&str>,
) -> Result<DailyActivitySummary, String> {
    let date = normalize_date(date)?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    activity::daily_summary(&conn, &date).map_err(|e| format!("Failed to build summary: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::metrics::add_metric_value;

    fn test_db(name: &str) -> Database {
        let db = Database::new(format!("file:{}?mode=memory&cache=shared", name)).unwrap();
        let conn = db.get_conn().unwrap();
        crate::db::migrations::run_migrations(&conn).unwrap();
        db
    }

    #[test]
    fn test_list_and_create_activity_types() {
        let db = test_db("activities_types");

        let listing = list_activity_types(&db, false).unwrap();
        assert!(listing.total >= 7);
        assert!(listing.activity_types.iter().any(|t| t.name == "running"));

        let created = create_activity_type(&db, "Rock Climbing", 9.0, None, Some("outdoor")).unwrap();
        assert_eq!(created.name, "rock_climbing");

        // Duplicate names rejected
        assert!(create_activity_type(&db, "rock climbing", 9.0, None, None).is_err());
    }

    #[test]
    fn test_plan_and_complete() {
        let db = test_db("activities_plan_complete");
        add_metric_value(&db, "WEIGHT", 80.0, None, None, None, None).unwrap();

        let plan = plan_activity(&db, "running", 1.0, Some("2025-03-01"), None).unwrap();
        assert!(!plan.is_completed);
        // 8.0 * 80 * 1
        assert_eq!(plan.entry.calories, 640.0);

        let completed = complete_planned_activity(&db, plan.entry.id).unwrap();
        assert_eq!(completed.record.calories, 640.0);

        // Completing twice fails
        assert!(complete_planned_activity(&db, plan.entry.id).is_err());

        let logged = list_activity_records(&db, Some("2025-03-01")).unwrap();
        assert_eq!(logged.total, 1);
        assert_eq!(logged.total_calories, 640.0);
    }

    #[test]
    fn test_log_and_delete() {
        let db = test_db("activities_log_delete");

        let entry = log_activity(&db, "cycling", 2.0, Some("2025-03-02"), Some("hill loop")).unwrap();
        // 6.0 * 70 (fallback weight) * 2
        assert_eq!(entry.calories, 840.0);

        delete_activity_record(&db, entry.id).unwrap();
        assert!(delete_activity_record(&db, entry.id).is_err());

        let listing = list_activity_records(&db, Some("2025-03-02")).unwrap();
        assert_eq!(listing.total, 0);
    }

    #[test]
    fn test_rejects_unknown_activity_and_bad_date() {
        let db = test_db("activities_validation");

        assert!(plan_activity(&db, "juggling", 1.0, None, None).is_err());
        assert!(log_activity(&db, "running", 1.0, Some("03/01/2025"), None).is_err());
    }

    #[test]
    fn test_daily_summary() {
        let db = test_db("activities_summary");
        add_metric_value(&db, "WEIGHT", 80.0, None, None, None, None).unwrap();

        plan_activity(&db, "running", 1.0, Some("2025-03-05"), None).unwrap();
        log_activity(&db, "walking", 2.0, Some("2025-03-05"), None).unwrap();

        let summary = get_daily_activity_summary(&db, Some("2025-03-05")).unwrap();
        assert_eq!(summary.body_weight_kg, 80.0);
        assert_eq!(summary.planned_calories, 640.0);
        // 3.5 * 80 * 2
        assert_eq!(summary.logged_calories, 560.0);
        // No profile, so BMR is unavailable and multipliers fall back
        assert!(summary.bmr.is_none());
        assert_eq!(summary.planned_multiplier, 1.2);
    }
}
