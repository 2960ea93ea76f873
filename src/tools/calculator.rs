//! Health calculator MCP tools
//!
//! A run snapshots its inputs as a CalculatorSession and persists the
//! derived values (BMI, LBM, body fat mass, BMR, TDEE) as `calculated`
//! metric_values rows stamped with the session's calculation date.

use serde::Serialize;

use crate::db::Database;
use crate::health::formulas::{self, BmiCategory};
use crate::health::round1;
use crate::models::{
    ActivityLevel, CalculatorSession, CalculatorSessionCreate, Gender, MeasurementType, Metric,
    MetricValue, MetricValueCreate, Profile,
};

/// Age assumed when the profile has no date of birth
const DEFAULT_AGE: u32 = 30;

/// Source tag on calculator-written values
const CALCULATOR_SOURCE: &str = "Health Calculator";

/// Session inputs for responses
#[derive(Debug, Serialize)]
pub struct SessionSummary {
    pub id: i64,
    pub weight_kg: f64,
    pub height_cm: f64,
    pub body_fat_pct: f64,
    pub gender: String,
    pub activity_level: String,
    pub activity_level_display: String,
    pub activity_hours_per_week: f64,
    pub notes: String,
    pub calculation_date: String,
}

impl From<&CalculatorSession> for SessionSummary {
    fn from(session: &CalculatorSession) -> Self {
        Self {
            id: session.id,
            weight_kg: session.weight_kg,
            height_cm: session.height_cm,
            body_fat_pct: session.body_fat_pct,
            gender: session.gender.as_str().to_string(),
            activity_level: session.activity_level.as_str().to_string(),
            activity_level_display: session.activity_level.display_name().to_string(),
            activity_hours_per_week: session.activity_hours_per_week,
            notes: session.notes.clone(),
            calculation_date: session.calculation_date.clone(),
        }
    }
}

/// Derived values from one run
#[derive(Debug, Serialize)]
pub struct CalculatorResults {
    pub bmi: Option<f64>,
    pub bmi_category: Option<String>,
    pub lean_body_mass_kg: Option<f64>,
    pub body_fat_mass_kg: Option<f64>,
    pub bmr_kcal: f64,
    pub tdee_kcal: f64,
}

/// Response for run_calculator
#[derive(Debug, Serialize)]
pub struct CalculatorResponse {
    pub session: SessionSummary,
    pub results: CalculatorResults,
    pub age_years: u32,
    pub age_is_approximate: bool,
}

/// One stored calculated value attached to a session
#[derive(Debug, Serialize)]
pub struct StoredCalculatedValue {
    pub id: i64,
    pub symbol: Option<String>,
    pub name: String,
    pub value: f64,
    pub unit: String,
}

/// Response for get_calculator_session
#[derive(Debug, Serialize)]
pub struct SessionDetail {
    pub session: SessionSummary,
    pub results: Vec<StoredCalculatedValue>,
}

/// Response for list_calculator_sessions
#[derive(Debug, Serialize)]
pub struct ListSessionsResponse {
    pub sessions: Vec<SessionSummary>,
    pub total: usize,
}

fn record_calculated(
    conn: &rusqlite::Connection,
    symbol: &str,
    value: f64,
    inputs_json: &str,
    timestamp: &str,
) -> Result<(), String> {
    let metric = Metric::get_by_symbol(conn, symbol)
        .map_err(|e| format!("Database error: {}", e))?
        .ok_or_else(|| format!("Metric catalog is missing '{}'", symbol))?;

    MetricValue::create(
        conn,
        &MetricValueCreate {
            metric_id: metric.id,
            value: round1(value),
            measurement_type: MeasurementType::Calculated,
            status: None,
            notes: None,
            source: Some(CALCULATOR_SOURCE.to_string()),
            calculation_inputs: Some(inputs_json.to_string()),
            timestamp: Some(timestamp.to_string()),
        },
    )
    .map_err(|e| format!("Failed to store calculated value: {}", e))?;

    Ok(())
}

/// Run the health calculator with explicit inputs
#[allow(clippy::too_many_arguments)]
pub fn run_calculator(
    db: &Database,
    weight_kg: f64,
    height_cm: f64,
    body_fat_pct: Option<f64>,
    gender: &str,
    activity_level: &str,
    activity_hours_per_week: Option<f64>,
    notes: Option<&str>,
) -> Result<CalculatorResponse, String> {
    let gender = Gender::from_str(gender)
        .ok_or_else(|| format!("Invalid gender: '{}'. Valid values: male, female", gender))?;
    let level = ActivityLevel::from_str(activity_level).ok_or_else(|| {
        format!(
            "Invalid activity level: '{}'. Valid levels: sedentary, lightly_active, \
             moderately_active, very_active, extremely_active",
            activity_level
        )
    })?;
    let body_fat_pct = body_fat_pct.unwrap_or(0.0);

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let session = CalculatorSession::create(
        &conn,
        &CalculatorSessionCreate {
            weight_kg,
            height_cm,
            body_fat_pct,
            gender,
            activity_level: level,
            activity_hours_per_week,
            notes: notes.map(String::from),
        },
    )
    .map_err(|e| format!("Failed to create session: {}", e))?;

    let age = Profile::get(&conn)
        .map_err(|e| format!("Database error: {}", e))?
        .and_then(|p| p.age());
    let age_is_approximate = age.is_none();
    let age = age.unwrap_or(DEFAULT_AGE);

    let bmi = formulas::bmi(weight_kg, height_cm).map(round1);
    let lbm = formulas::lean_body_mass(weight_kg, body_fat_pct).map(round1);
    let bf_mass = if body_fat_pct > 0.0 {
        formulas::body_fat_mass(weight_kg, body_fat_pct).map(round1)
    } else {
        None
    };
    let bmr = round1(formulas::bmr(weight_kg, height_cm, age, gender));
    let tdee = round1(formulas::tdee(bmr, level));

    let mut inputs = serde_json::json!({
        "session_id": session.id,
        "weight_kg": weight_kg,
        "height_cm": height_cm,
        "body_fat_pct": body_fat_pct,
        "gender": gender.as_str(),
        "activity_level": level.as_str(),
        "age_years": age,
    });
    if age_is_approximate {
        inputs["age_note"] =
            serde_json::json!("age approximated; set date_of_birth in the profile for exact BMR");
    }
    let inputs_json =
        serde_json::to_string(&inputs).map_err(|e| format!("Failed to encode inputs: {}", e))?;

    if let Some(v) = bmi {
        record_calculated(&conn, "BMI", v, &inputs_json, &session.calculation_date)?;
    }
    if let Some(v) = lbm {
        record_calculated(&conn, "LBM", v, &inputs_json, &session.calculation_date)?;
    }
    if let Some(v) = bf_mass {
        record_calculated(&conn, "BF_MASS", v, &inputs_json, &session.calculation_date)?;
    }
    record_calculated(&conn, "BMR", bmr, &inputs_json, &session.calculation_date)?;
    record_calculated(&conn, "TDEE", tdee, &inputs_json, &session.calculation_date)?;

    Ok(CalculatorResponse {
        results: CalculatorResults {
            bmi,
            bmi_category: bmi.map(|v| BmiCategory::classify(v).display_name().to_string()),
            lean_body_mass_kg: lbm,
            body_fat_mass_kg: bf_mass,
            bmr_kcal: bmr,
            tdee_kcal: tdee,
        },
        session: SessionSummary::from(&session),
        age_years: age,
        age_is_approximate,
    })
}

/// Run the calculator from the latest recorded measurements
pub fn run_calculator_from_measurements(
    db: &Database,
    gender: &str,
    activity_level: &str,
    notes: Option<&str>,
) -> Result<CalculatorResponse, String> {
    let (weight, height, body_fat) = {
        let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

        let latest = |symbol: &str| -> Result<Option<f64>, String> {
            let metric = Metric::get_by_symbol(&conn, symbol)
                .map_err(|e| format!("Database error: {}", e))?;
            match metric {
                Some(m) => Ok(MetricValue::latest_observation(&conn, m.id)
                    .map_err(|e| format!("Database error: {}", e))?
                    .map(|v| v.value)),
                None => Ok(None),
            }
        };

        let weight = latest("WEIGHT")?
            .ok_or_else(|| "No recorded weight; log WEIGHT first or use run_calculator".to_string())?;
        let height = latest("HEIGHT")?
            .ok_or_else(|| "No recorded height; log HEIGHT first or use run_calculator".to_string())?;
        let body_fat = latest("BF_PCT")?;
        (weight, height, body_fat)
    };

    run_calculator(
        db,
        weight,
        height,
        body_fat,
        gender,
        activity_level,
        None,
        notes,
    )
}

/// Get a session with its stored calculated results
pub fn get_calculator_session(db: &Database, id: i64) -> Result<SessionDetail, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let session = CalculatorSession::get_by_id(&conn, id)
        .map_err(|e| format!("Database error: {}", e))?
        .ok_or_else(|| format!("Calculator session not found with id: {}", id))?;

    let values = MetricValue::list_calculated_at(&conn, &session.calculation_date)
        .map_err(|e| format!("Database error: {}", e))?;

    let mut results = Vec::with_capacity(values.len());
    for value in values {
        let metric = Metric::get_by_id(&conn, value.metric_id)
            .map_err(|e| format!("Database error: {}", e))?;
        let (symbol, name, unit) = match metric {
            Some(m) => (m.metric_id, m.name, m.unit),
            None => (None, format!("metric #{}", value.metric_id), String::new()),
        };
        results.push(StoredCalculatedValue {
            id: value.id,
            symbol,
            name,
            value: value.value,
            unit,
        });
    }

    Ok(SessionDetail {
        session: SessionSummary::from(&session),
        results,
    })
}

/// List calculator sessions, newest first
pub fn list_calculator_sessions(
    db: &Database,
    limit: Option<i64>,
) -> Result<ListSessionsResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let sessions =
        CalculatorSession::list(&conn, limit).map_err(|e| format!("Database error: {}", e))?;

    let summaries: Vec<SessionSummary> = sessions.iter().map(SessionSummary::from).collect();
    let total = summaries.len();

    Ok(ListSessionsResponse {
        sessions: summaries,
        total,
    })
}
