//! Database migrations
//!
//! Schema creation, migration logic, and catalog seeding.

use rusqlite::Connection;

use super::connection::DbResult;

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

/// Run all migrations to bring the database up to the current schema version
pub fn run_migrations(conn: &Connection) -> DbResult<()> {
    // Create migrations table if it doesn't exist
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    // Get current version
    let current_version: i32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    // Run migrations
    if current_version < SCHEMA_VERSION {
        migrate_v1(conn)?;
        conn.execute("INSERT INTO schema_migrations (version) VALUES (1)", [])?;
    }

    Ok(())
}

/// Get the current schema version
pub fn get_schema_version(conn: &Connection) -> DbResult<i32> {
    let version: i32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}

/// Migration v1: Initial schema plus metric and activity-type catalogs
fn migrate_v1(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        r#"
        -- ============================================
        -- PROFILE
        -- Single-row owner profile (age and gender feed BMR)
        -- ============================================
        CREATE TABLE profile (
            id INTEGER PRIMARY KEY CHECK(id = 1),
            name TEXT NOT NULL,
            date_of_birth TEXT,                  -- YYYY-MM-DD, nullable
            gender TEXT CHECK(gender IN ('male', 'female')),
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- ============================================
        -- METRICS
        -- Catalog of measurable and derived health quantities
        -- ============================================
        CREATE TABLE metrics (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            metric_id TEXT UNIQUE,               -- symbolic id for formulas, e.g. 'WEIGHT'
            name TEXT NOT NULL UNIQUE,
            metric_type TEXT NOT NULL CHECK(metric_type IN
                ('body_measurement', 'lab_result', 'vital_sign',
                 'fitness', 'nutrition', 'calculated', 'custom')),
            unit TEXT NOT NULL DEFAULT '',
            description TEXT NOT NULL DEFAULT '',
            min_value REAL,
            max_value REAL,
            reference_range TEXT NOT NULL DEFAULT '',
            is_calculated INTEGER NOT NULL DEFAULT 0,
            calculation_formula TEXT NOT NULL DEFAULT '',
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),

            -- calculated metrics must carry a formula
            CHECK(is_calculated = 0 OR calculation_formula <> '')
        );

        CREATE INDEX idx_metrics_type ON metrics(metric_type, is_active);
        CREATE INDEX idx_metrics_calculated ON metrics(is_calculated);

        -- ============================================
        -- METRIC VALUES
        -- Append-only observation log per metric
        -- ============================================
        CREATE TABLE metric_values (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            metric_id INTEGER NOT NULL REFERENCES metrics(id) ON DELETE CASCADE,
            value REAL NOT NULL,
            measurement_type TEXT NOT NULL DEFAULT 'log' CHECK(measurement_type IN
                ('baseline', 'target', 'current', 'log', 'goal', 'calculated')),
            status TEXT NOT NULL DEFAULT 'normal' CHECK(status IN
                ('normal', 'high', 'low', 'critical', 'pending')),
            notes TEXT NOT NULL DEFAULT '',
            source TEXT NOT NULL DEFAULT '',
            calculation_inputs TEXT,             -- JSON inputs for calculated rows
            timestamp TEXT NOT NULL DEFAULT (datetime('now')),
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_metric_values_metric_ts ON metric_values(metric_id, timestamp);
        CREATE INDEX idx_metric_values_type ON metric_values(measurement_type);

        -- ============================================
        -- CALCULATOR SESSIONS
        -- Input snapshots; outputs land in metric_values as 'calculated'
        -- ============================================
        CREATE TABLE calculator_sessions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            weight_kg REAL NOT NULL,
            height_cm REAL NOT NULL,
            body_fat_pct REAL NOT NULL,
            gender TEXT NOT NULL CHECK(gender IN ('male', 'female')),
            activity_level TEXT NOT NULL DEFAULT 'moderately_active' CHECK(activity_level IN
                ('sedentary', 'lightly_active', 'moderately_active',
                 'very_active', 'extremely_active')),
            activity_hours_per_week REAL NOT NULL DEFAULT 0,
            notes TEXT NOT NULL DEFAULT '',
            calculation_date TEXT NOT NULL DEFAULT (datetime('now')),
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_calculator_sessions_date ON calculator_sessions(calculation_date);

        -- ============================================
        -- ACTIVITY TYPES
        -- Energy expenditure rates per activity
        -- ============================================
        CREATE TABLE activity_types (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            display_name TEXT NOT NULL,
            calories_per_hour_per_kg REAL NOT NULL,
            category TEXT NOT NULL DEFAULT '',
            is_active INTEGER NOT NULL DEFAULT 1,
            is_default INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_activity_types_category ON activity_types(category, display_name);

        -- ============================================
        -- PLANNED ACTIVITIES
        -- ============================================
        CREATE TABLE planned_activities (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            activity_type_id INTEGER NOT NULL REFERENCES activity_types(id) ON DELETE CASCADE,
            duration_hours REAL NOT NULL,
            date TEXT NOT NULL,                  -- YYYY-MM-DD
            is_completed INTEGER NOT NULL DEFAULT 0,
            notes TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_planned_activities_date ON planned_activities(date);

        -- ============================================
        -- ACTIVITY RECORDS
        -- Logged / actual activities
        -- ============================================
        CREATE TABLE activity_records (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            activity_type_id INTEGER NOT NULL REFERENCES activity_types(id) ON DELETE CASCADE,
            duration_hours REAL NOT NULL,
            date TEXT NOT NULL,                  -- YYYY-MM-DD
            notes TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_activity_records_date ON activity_records(date);

        -- ============================================
        -- METRIC FAVORITES
        -- ============================================
        CREATE TABLE metric_favorites (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            metric_id INTEGER NOT NULL UNIQUE REFERENCES metrics(id) ON DELETE CASCADE,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        "#,
    )?;

    seed_metric_catalog(conn)?;
    seed_activity_types(conn)?;

    Ok(())
}

/// One catalog seed row
struct MetricSeed {
    metric_id: &'static str,
    name: &'static str,
    metric_type: &'static str,
    unit: &'static str,
    description: &'static str,
    min_value: Option<f64>,
    max_value: Option<f64>,
    reference_range: &'static str,
    formula: &'static str,
}

impl MetricSeed {
    const fn measured(
        metric_id: &'static str,
        name: &'static str,
        metric_type: &'static str,
        unit: &'static str,
        description: &'static str,
        min_value: f64,
        max_value: f64,
        reference_range: &'static str,
    ) -> Self {
        Self {
            metric_id,
            name,
            metric_type,
            unit,
            description,
            min_value: Some(min_value),
            max_value: Some(max_value),
            reference_range,
            formula: "",
        }
    }

    const fn calculated(
        metric_id: &'static str,
        name: &'static str,
        unit: &'static str,
        description: &'static str,
        min_value: f64,
        max_value: f64,
        formula: &'static str,
    ) -> Self {
        Self {
            metric_id,
            name,
            metric_type: "calculated",
            unit,
            description,
            min_value: Some(min_value),
            max_value: Some(max_value),
            reference_range: "",
            formula,
        }
    }
}

/// Built-in metric catalog, seeded once by migrate_v1
const METRIC_SEEDS: &[MetricSeed] = &[
    // Body measurements
    MetricSeed::measured("WEIGHT", "Weight", "body_measurement", "kg",
        "Body weight in kilograms", 20.0, 300.0, ""),
    MetricSeed::measured("HEIGHT", "Height", "body_measurement", "cm",
        "Height in centimeters", 100.0, 250.0, ""),
    MetricSeed::measured("BF_PCT", "Body Fat Percentage", "body_measurement", "%",
        "Body fat percentage", 0.0, 50.0, ""),
    MetricSeed::measured("WAIST_CIRC", "Waist Circumference", "body_measurement", "cm",
        "Waist circumference measurement", 50.0, 200.0, ""),
    MetricSeed::measured("HIP_CIRC", "Hip Circumference", "body_measurement", "cm",
        "Hip circumference measurement", 60.0, 200.0, ""),
    MetricSeed::measured("NECK_CIRC", "Neck Circumference", "body_measurement", "cm",
        "Neck circumference measurement", 20.0, 60.0, ""),
    MetricSeed::measured("MUSCLE_PCT", "Muscle Mass Percentage", "body_measurement", "%",
        "Muscle mass percentage", 20.0, 80.0, ""),
    MetricSeed::measured("BW_PCT", "Body Water Percentage", "body_measurement", "%",
        "Body water percentage", 30.0, 80.0, ""),
    MetricSeed::measured("BONE_MASS", "Bone Mass", "body_measurement", "kg",
        "Bone mass in kilograms", 1.0, 20.0, ""),
    // Calculated metrics; GENDER evaluates as 1 for male, 0 for female
    MetricSeed::calculated("BMI", "BMI", "",
        "Body Mass Index - calculated from weight and height",
        10.0, 60.0, "WEIGHT / pow(HEIGHT / 100, 2)"),
    MetricSeed::calculated("LBM", "Lean Body Mass", "kg",
        "Lean Body Mass - calculated from weight and body fat percentage",
        20.0, 200.0, "WEIGHT * (1 - BF_PCT / 100)"),
    MetricSeed::calculated("BF_MASS", "Body Fat Mass", "kg",
        "Body Fat Mass - calculated from weight and body fat percentage",
        0.0, 100.0, "WEIGHT * (BF_PCT / 100)"),
    MetricSeed::calculated("BMR", "Basal Metabolic Rate", "kcal/day",
        "Basal Metabolic Rate - Mifflin-St Jeor equation",
        800.0, 4000.0, "10 * WEIGHT + 6.25 * HEIGHT - 5 * AGE + (GENDER == 1 ? 5 : -161)"),
    MetricSeed::calculated("TDEE", "Total Daily Energy Expenditure", "kcal/day",
        "Total Daily Energy Expenditure - BMR scaled by activity",
        1000.0, 8000.0, "BMR * ACTIVITY_MULTIPLIER"),
    // Lab results
    MetricSeed::measured("GLUCOSE", "Blood Glucose", "lab_result", "mg/dL",
        "Blood glucose level", 20.0, 600.0, "70-100"),
    MetricSeed::measured("HBA1C", "Hemoglobin A1c", "lab_result", "%",
        "Glycated hemoglobin", 3.0, 15.0, "4.0-5.6"),
    MetricSeed::measured("CHOL_TOTAL", "Total Cholesterol", "lab_result", "mg/dL",
        "Total cholesterol level", 50.0, 500.0, "<200"),
    MetricSeed::measured("CHOL_HDL", "HDL Cholesterol", "lab_result", "mg/dL",
        "High-density lipoprotein cholesterol", 10.0, 200.0, ">40"),
    MetricSeed::measured("CHOL_LDL", "LDL Cholesterol", "lab_result", "mg/dL",
        "Low-density lipoprotein cholesterol", 20.0, 300.0, "<100"),
    MetricSeed::measured("TRIGLYCERIDES", "Triglycerides", "lab_result", "mg/dL",
        "Triglyceride level", 20.0, 1000.0, "<150"),
    MetricSeed::measured("VIT_D", "Vitamin D", "lab_result", "ng/mL",
        "Vitamin D (25-OH) level", 5.0, 200.0, "30-100"),
    // Vital signs
    MetricSeed::measured("BP_SYS", "Blood Pressure Systolic", "vital_sign", "mmHg",
        "Systolic blood pressure", 60.0, 250.0, "<120"),
    MetricSeed::measured("BP_DIA", "Blood Pressure Diastolic", "vital_sign", "mmHg",
        "Diastolic blood pressure", 40.0, 150.0, "<80"),
    MetricSeed::measured("HR", "Heart Rate", "vital_sign", "bpm",
        "Resting heart rate", 30.0, 200.0, "60-100"),
    MetricSeed::measured("TEMP", "Body Temperature", "vital_sign", "°C",
        "Body temperature", 30.0, 45.0, "36.1-37.2"),
    MetricSeed::measured("RESP_RATE", "Respiratory Rate", "vital_sign", "breaths/min",
        "Respiratory rate", 5.0, 50.0, "12-20"),
    // Fitness metrics
    MetricSeed::measured("VO2_MAX", "VO2 Max", "fitness", "mL/kg/min",
        "Maximum oxygen consumption", 20.0, 80.0, ""),
    MetricSeed::measured("HR_REST", "Resting Heart Rate", "fitness", "bpm",
        "Resting heart rate", 30.0, 200.0, "60-100"),
    MetricSeed::measured("HR_MAX", "Max Heart Rate", "fitness", "bpm",
        "Maximum heart rate", 100.0, 220.0, ""),
    // Nutrition metrics
    MetricSeed::measured("CALORIES_DAILY", "Daily Calories", "nutrition", "kcal",
        "Daily caloric intake", 500.0, 5000.0, ""),
    MetricSeed::measured("PROTEIN", "Protein Intake", "nutrition", "g",
        "Daily protein intake", 0.0, 500.0, ""),
    MetricSeed::measured("CARBS", "Carbohydrate Intake", "nutrition", "g",
        "Daily carbohydrate intake", 0.0, 1000.0, ""),
    MetricSeed::measured("FAT", "Fat Intake", "nutrition", "g",
        "Daily fat intake", 0.0, 200.0, ""),
];

/// Seed the built-in metric catalog
fn seed_metric_catalog(conn: &Connection) -> DbResult<()> {
    let mut stmt = conn.prepare(
        r#"
        INSERT OR IGNORE INTO metrics
        (metric_id, name, metric_type, unit, description, min_value, max_value,
         reference_range, is_calculated, calculation_formula)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
    )?;

    for seed in METRIC_SEEDS {
        stmt.execute(rusqlite::params![
            seed.metric_id,
            seed.name,
            seed.metric_type,
            seed.unit,
            seed.description,
            seed.min_value,
            seed.max_value,
            seed.reference_range,
            !seed.formula.is_empty() as i32,
            seed.formula,
        ])?;
    }

    Ok(())
}

/// Built-in activity types with energy expenditure rates
const ACTIVITY_TYPE_SEEDS: &[(&str, &str, f64, &str)] = &[
    ("running", "Running", 8.0, "cardio"),
    ("strength_training", "Strength Training", 4.0, "strength"),
    ("cycling", "Cycling", 6.0, "cardio"),
    ("yoga", "Yoga", 2.5, "flexibility"),
    ("swimming", "Swimming", 7.0, "cardio"),
    ("walking", "Walking", 3.5, "cardio"),
    ("hiking", "Hiking", 6.0, "cardio"),
];

/// Seed the built-in activity-type catalog
fn seed_activity_types(conn: &Connection) -> DbResult<()> {
    let mut stmt = conn.prepare(
        r#"
        INSERT OR IGNORE INTO activity_types
        (name, display_name, calories_per_hour_per_kg, category, is_default)
        VALUES (?1, ?2, ?3, ?4, 1)
        "#,
    )?;

    for (name, display_name, rate, category) in ACTIVITY_TYPE_SEEDS {
        stmt.execute(rusqlite::params![name, display_name, rate, category])?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_fresh_database() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), 1);

        // Catalog seeded
        let metric_count: i64 = conn
            .query_row("SELECT COUNT(*) FROM metrics", [], |row| row.get(0))
            .unwrap();
        assert_eq!(metric_count, METRIC_SEEDS.len() as i64);

        let type_count: i64 = conn
            .query_row("SELECT COUNT(*) FROM activity_types", [], |row| row.get(0))
            .unwrap();
        assert_eq!(type_count, ACTIVITY_TYPE_SEEDS.len() as i64);
    }

    #[test]
    fn test_migrations_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), 1);
    }

    #[test]
    fn test_calculated_metrics_carry_formulas() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        let missing: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM metrics WHERE is_calculated = 1 AND calculation_formula = ''",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(missing, 0);
    }
}
