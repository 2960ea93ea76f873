//! MCP server implementation
//!
//! Exposes the metric, calculator, and activity tools over MCP.

use std::path::PathBuf;
use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::db::Database;
use crate::tools::status::StatusTracker;
use crate::tools::{activities, calculator, metrics, profile};

/// Wellness metrics MCP service
#[derive(Clone)]
pub struct WellmetricsService {
    status_tracker: Arc<Mutex<StatusTracker>>,
    database: Database,
    tool_router: ToolRouter<WellmetricsService>,
}

impl WellmetricsService {
    pub fn new(database_path: PathBuf, database: Database) -> Self {
        Self {
            status_tracker: Arc::new(Mutex::new(StatusTracker::new(database_path))),
            database,
            tool_router: Self::tool_router(),
        }
    }
}

// ============================================================================
// Profile Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SetProfileParams {
    /// Owner's name
    pub name: String,
    /// Date of birth (YYYY-MM-DD); used to derive AGE for formulas
    pub date_of_birth: Option<String>,
    /// Gender: male or female; used for BMR
    pub gender: Option<String>,
}

// ============================================================================
// Metric Catalog Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListMetricsParams {
    /// Filter by type: body_measurement, lab_result, vital_sign, fitness,
    /// nutrition, calculated, custom (optional)
    pub metric_type: Option<String>,
    /// Include deactivated metrics (default false)
    #[serde(default)]
    pub include_inactive: bool,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetMetricParams {
    /// Symbolic id (e.g. WEIGHT), display name, or numeric id
    pub metric: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CreateMetricParams {
    /// Display name
    pub name: String,
    /// Type: body_measurement, lab_result, vital_sign, fitness, nutrition,
    /// calculated, custom
    pub metric_type: String,
    /// Symbolic id for use in formulas (optional, uppercased)
    pub symbol: Option<String>,
    /// Unit of measure (optional)
    pub unit: Option<String>,
    /// Description (optional)
    pub description: Option<String>,
    /// Plausible minimum; values below are flagged low (optional)
    pub min_value: Option<f64>,
    /// Plausible maximum; values above are flagged high (optional)
    pub max_value: Option<f64>,
    /// Human-readable healthy range, e.g. "70-100" (optional)
    pub reference_range: Option<String>,
    /// Formula over other metrics' symbols; required for calculated metrics
    pub calculation_formula: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateMetricParams {
    /// Symbolic id, display name, or numeric id
    pub metric: String,
    pub name: Option<String>,
    pub unit: Option<String>,
    pub description: Option<String>,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub reference_range: Option<String>,
    pub calculation_formula: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DeleteMetricParams {
    /// Symbolic id, display name, or numeric id
    pub metric: String,
    /// Deactivate instead of deleting, keeping recorded history (default false)
    #[serde(default)]
    pub deactivate_only: bool,
}

// ============================================================================
// Metric Value Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddMetricValueParams {
    /// Symbolic id (e.g. WEIGHT), display name, or numeric id
    pub metric: String,
    /// The reading, in the metric's unit
    pub value: f64,
    /// baseline, target, current, log, or goal (default log)
    pub measurement_type: Option<String>,
    /// Context notes (optional)
    pub notes: Option<String>,
    /// Where the reading came from, e.g. a device name (optional)
    pub source: Option<String>,
    /// Timestamp override, ISO format (optional, defaults to now)
    pub timestamp: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SetTargetParams {
    /// Symbolic id, display name, or numeric id
    pub metric: String,
    /// Target value in the metric's unit
    pub value: f64,
    /// Notes about the target (optional)
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListMetricValuesParams {
    /// Symbolic id, display name, or numeric id
    pub metric: String,
    /// Filter by measurement type (optional)
    pub measurement_type: Option<String>,
    /// Only values from the last N days (optional)
    pub days: Option<i64>,
    /// Maximum results, newest first (optional)
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateMetricValueParams {
    /// Value ID to update
    pub id: i64,
    /// New reading (optional)
    pub value: Option<f64>,
    /// New notes (optional)
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DeleteMetricValueParams {
    /// Value ID to delete
    pub id: i64,
}

// ============================================================================
// Calculator Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RunCalculatorParams {
    /// Body weight in kg
    pub weight_kg: f64,
    /// Height in cm
    pub height_cm: f64,
    /// Body fat percentage 0-100 (optional; enables LBM and fat mass)
    pub body_fat_pct: Option<f64>,
    /// male or female
    pub gender: String,
    /// sedentary, lightly_active, moderately_active, very_active,
    /// extremely_active
    pub activity_level: String,
    /// Weekly activity hours (optional, informational)
    pub activity_hours_per_week: Option<f64>,
    /// Session notes (optional)
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RunCalculatorFromMeasurementsParams {
    /// male or female
    pub gender: String,
    /// sedentary, lightly_active, moderately_active, very_active,
    /// extremely_active
    pub activity_level: String,
    /// Session notes (optional)
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetCalculatorSessionParams {
    /// Session ID
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListCalculatorSessionsParams {
    /// Maximum results, newest first (optional)
    pub limit: Option<i64>,
}

// ============================================================================
// Activity Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListActivityTypesParams {
    /// Include deactivated types (default false)
    #[serde(default)]
    pub include_inactive: bool,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CreateActivityTypeParams {
    /// Activity name, e.g. "rock climbing" (normalized to rock_climbing)
    pub name: String,
    /// Energy expenditure rate in kcal per hour per kg of body weight
    pub calories_per_hour_per_kg: f64,
    /// Display name (optional, derived from name)
    pub display_name: Option<String>,
    /// Category, e.g. cardio or strength (optional)
    pub category: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PlanActivityParams {
    /// Activity type name or numeric id
    pub activity: String,
    /// Planned duration in hours
    pub duration_hours: f64,
    /// Date (YYYY-MM-DD, defaults to today)
    pub date: Option<String>,
    /// Notes (optional)
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct LogActivityParams {
    /// Activity type name or numeric id
    pub activity: String,
    /// Actual duration in hours
    pub duration_hours: f64,
    /// Date (YYYY-MM-DD, defaults to today)
    pub date: Option<String>,
    /// Notes (optional)
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CompletePlannedActivityParams {
    /// Planned activity ID
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListActivitiesParams {
    /// Date (YYYY-MM-DD, defaults to today)
    pub date: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DeleteActivityParams {
    /// Planned activity or record ID
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DailyActivitySummaryParams {
    /// Date (YYYY-MM-DD, defaults to today)
    pub date: Option<String>,
}

// ============================================================================
// Tool Implementations
// ============================================================================

#[tool_router]
impl WellmetricsService {
    // --- Status ---

    #[tool(description = "Get the current status of the service including build info, database status, and process information")]
    async fn service_status(&self) -> Result<CallToolResult, McpError> {
        let tracker = self.status_tracker.lock().await;
        let status = tracker.get_status();
        let json = serde_json::to_string_pretty(&status)
            .map_err(|e| McpError::internal_error(format!("Serialization error: {}", e), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Get step-by-step instructions for logging metrics, running the calculator, and tracking activities. Call this when starting a session or when unsure how to use the tools.")]
    fn metric_instructions(&self) -> Result<CallToolResult, McpError> {
        use crate::tools::status::METRIC_INSTRUCTIONS;
        Ok(CallToolResult::success(vec![Content::text(METRIC_INSTRUCTIONS)]))
    }

    // --- Profile ---

    #[tool(description = "Set or update the owner profile (name, date of birth, gender). Date of birth and gender feed AGE and GENDER in calculated metrics.")]
    fn set_profile(&self, Parameters(p): Parameters<SetProfileParams>) -> Result<CallToolResult, McpError> {
        let result = profile::set_profile(&self.database, &p.name, p.date_of_birth.as_deref(), p.gender.as_deref())
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Get the owner profile including derived age")]
    fn get_profile(&self) -> Result<CallToolResult, McpError> {
        let result = profile::get_profile(&self.database).map_err(|e| McpError::internal_error(e, None))?;
        let json = match result {
            Some(p) => serde_json::to_string_pretty(&p),
            None => Ok(r#"{"error": "No profile set. Use set_profile first."}"#.to_string()),
        }
        .map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    // --- Metric Catalog ---

    #[tool(description = "List metrics in the catalog, optionally filtered by type")]
    fn list_metrics(&self, Parameters(p): Parameters<ListMetricsParams>) -> Result<CallToolResult, McpError> {
        let result = metrics::list_metrics(&self.database, p.metric_type.as_deref(), p.include_inactive)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Get full details for a metric including its latest observation, target, and favorite flag")]
    fn get_metric(&self, Parameters(p): Parameters<GetMetricParams>) -> Result<CallToolResult, McpError> {
        let result = metrics::get_metric(&self.database, &p.metric).map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Create a custom metric. Provide a calculation_formula to make it calculated (e.g. WEIGHT / pow(HEIGHT / 100, 2)).")]
    fn create_metric(&self, Parameters(p): Parameters<CreateMetricParams>) -> Result<CallToolResult, McpError> {
        let result = metrics::create_metric(
            &self.database,
            &p.name,
            &p.metric_type,
            p.symbol.as_deref(),
            p.unit.as_deref(),
            p.description.as_deref(),
            p.min_value,
            p.max_value,
            p.reference_range.as_deref(),
            p.calculation_formula.as_deref(),
        )
        .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Update a metric's catalog entry (name, unit, ranges, formula, active flag)")]
    fn update_metric(&self, Parameters(p): Parameters<UpdateMetricParams>) -> Result<CallToolResult, McpError> {
        let result = metrics::update_metric(
            &self.database,
            &p.metric,
            p.name.as_deref(),
            p.unit.as_deref(),
            p.description.as_deref(),
            p.min_value,
            p.max_value,
            p.reference_range.as_deref(),
            p.calculation_formula.as_deref(),
            p.is_active,
        )
        .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Delete a metric and its history, or deactivate it with deactivate_only=true to keep history")]
    fn delete_metric(&self, Parameters(p): Parameters<DeleteMetricParams>) -> Result<CallToolResult, McpError> {
        let result = metrics::delete_metric(&self.database, &p.metric, p.deactivate_only)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    // --- Metric Values ---

    #[tool(description = "Record a value for a metric. Values are in the metric's unit (kg, cm, mg/dL, ...). Measurement type defaults to log.")]
    fn add_metric_value(&self, Parameters(p): Parameters<AddMetricValueParams>) -> Result<CallToolResult, McpError> {
        let result = metrics::add_metric_value(
            &self.database,
            &p.metric,
            p.value,
            p.measurement_type.as_deref(),
            p.notes.as_deref(),
            p.source.as_deref(),
            p.timestamp.as_deref(),
        )
        .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Set a target value for a metric. A target set within the last day is updated in place; older targets are preserved as history.")]
    fn set_target(&self, Parameters(p): Parameters<SetTargetParams>) -> Result<CallToolResult, McpError> {
        let result = metrics::set_target(&self.database, &p.metric, p.value, p.notes.as_deref())
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "List recorded values for a metric, newest first, with optional type filter, trailing-days window, and limit")]
    fn list_metric_values(&self, Parameters(p): Parameters<ListMetricValuesParams>) -> Result<CallToolResult, McpError> {
        let result = metrics::list_metric_values(
            &self.database,
            &p.metric,
            p.measurement_type.as_deref(),
            p.days,
            p.limit,
        )
        .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Get the latest observation for every metric with recorded data")]
    fn get_latest_measurements(&self) -> Result<CallToolResult, McpError> {
        let result = metrics::get_latest_measurements(&self.database)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Update a recorded value or its notes; status is re-classified against the metric's range")]
    fn update_metric_value(&self, Parameters(p): Parameters<UpdateMetricValueParams>) -> Result<CallToolResult, McpError> {
        let result = metrics::update_metric_value(&self.database, p.id, p.value, p.notes.as_deref())
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Delete a recorded metric value by its id")]
    fn delete_metric_value(&self, Parameters(p): Parameters<DeleteMetricValueParams>) -> Result<CallToolResult, McpError> {
        let result = metrics::delete_metric_value(&self.database, p.id)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    // --- Engine ---

    #[tool(description = "Evaluate a calculated metric (BMI, BMR, TDEE, ...) against the latest measurements and profile. Returns available=false when inputs are missing.")]
    fn get_calculated_value(&self, Parameters(p): Parameters<GetMetricParams>) -> Result<CallToolResult, McpError> {
        let result = metrics::get_calculated_value(&self.database, &p.metric)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    // --- Favorites ---

    #[tool(description = "Toggle a metric's favorite flag")]
    fn toggle_favorite(&self, Parameters(p): Parameters<GetMetricParams>) -> Result<CallToolResult, McpError> {
        let result = metrics::toggle_favorite(&self.database, &p.metric)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "List favorite metrics in pin order")]
    fn list_favorites(&self) -> Result<CallToolResult, McpError> {
        let result = metrics::list_favorites(&self.database).map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Pin the standard starter set of favorite metrics (weight, height, BMI, body fat, waist, cholesterol). Idempotent.")]
    fn setup_default_favorites(&self) -> Result<CallToolResult, McpError> {
        let result = metrics::setup_default_favorites(&self.database)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    // --- Calculator ---

    #[tool(description = "Run the health calculator with explicit inputs. Computes BMI, lean body mass, body fat mass, BMR (Mifflin-St Jeor), and TDEE; stores the results as calculated values tied to a session.")]
    fn run_calculator(&self, Parameters(p): Parameters<RunCalculatorParams>) -> Result<CallToolResult, McpError> {
        let result = calculator::run_calculator(
            &self.database,
            p.weight_kg,
            p.height_cm,
            p.body_fat_pct,
            &p.gender,
            &p.activity_level,
            p.activity_hours_per_week,
            p.notes.as_deref(),
        )
        .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Run the health calculator using the latest recorded weight, height, and body fat measurements")]
    fn run_calculator_from_measurements(&self, Parameters(p): Parameters<RunCalculatorFromMeasurementsParams>) -> Result<CallToolResult, McpError> {
        let result = calculator::run_calculator_from_measurements(
            &self.database,
            &p.gender,
            &p.activity_level,
            p.notes.as_deref(),
        )
        .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Get a calculator session with its stored calculated results")]
    fn get_calculator_session(&self, Parameters(p): Parameters<GetCalculatorSessionParams>) -> Result<CallToolResult, McpError> {
        let result = calculator::get_calculator_session(&self.database, p.id)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "List calculator sessions, newest first")]
    fn list_calculator_sessions(&self, Parameters(p): Parameters<ListCalculatorSessionsParams>) -> Result<CallToolResult, McpError> {
        let result = calculator::list_calculator_sessions(&self.database, p.limit)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    // --- Activities ---

    #[tool(description = "List activity types with their energy expenditure rates (kcal per hour per kg)")]
    fn list_activity_types(&self, Parameters(p): Parameters<ListActivityTypesParams>) -> Result<CallToolResult, McpError> {
        let result = activities::list_activity_types(&self.database, p.include_inactive)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Create a custom activity type with an energy expenditure rate")]
    fn create_activity_type(&self, Parameters(p): Parameters<CreateActivityTypeParams>) -> Result<CallToolResult, McpError> {
        let result = activities::create_activity_type(
            &self.database,
            &p.name,
            p.calories_per_hour_per_kg,
            p.display_name.as_deref(),
            p.category.as_deref(),
        )
        .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Schedule an activity for a date (defaults to today). Returns the projected calorie cost.")]
    fn plan_activity(&self, Parameters(p): Parameters<PlanActivityParams>) -> Result<CallToolResult, McpError> {
        let result = activities::plan_activity(
            &self.database,
            &p.activity,
            p.duration_hours,
            p.date.as_deref(),
            p.notes.as_deref(),
        )
        .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Log a completed activity for a date (defaults to today). Returns the calorie cost based on the latest recorded weight.")]
    fn log_activity(&self, Parameters(p): Parameters<LogActivityParams>) -> Result<CallToolResult, McpError> {
        let result = activities::log_activity(
            &self.database,
            &p.activity,
            p.duration_hours,
            p.date.as_deref(),
            p.notes.as_deref(),
        )
        .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Mark a planned activity as completed and log a matching activity record in one step")]
    fn complete_planned_activity(&self, Parameters(p): Parameters<CompletePlannedActivityParams>) -> Result<CallToolResult, McpError> {
        let result = activities::complete_planned_activity(&self.database, p.id)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "List planned activities for a date (defaults to today) with projected calories")]
    fn list_planned_activities(&self, Parameters(p): Parameters<ListActivitiesParams>) -> Result<CallToolResult, McpError> {
        let result = activities::list_planned_activities(&self.database, p.date.as_deref())
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "List logged activity records for a date (defaults to today) with calories")]
    fn list_activity_records(&self, Parameters(p): Parameters<ListActivitiesParams>) -> Result<CallToolResult, McpError> {
        let result = activities::list_activity_records(&self.database, p.date.as_deref())
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Delete a planned activity by its id")]
    fn delete_planned_activity(&self, Parameters(p): Parameters<DeleteActivityParams>) -> Result<CallToolResult, McpError> {
        let result = activities::delete_planned_activity(&self.database, p.id)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Delete a logged activity record by its id")]
    fn delete_activity_record(&self, Parameters(p): Parameters<DeleteActivityParams>) -> Result<CallToolResult, McpError> {
        let result = activities::delete_activity_record(&self.database, p.id)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Get the planned vs. logged energy picture for a date (defaults to today): activities, calorie totals, and the day's activity multipliers")]
    fn get_daily_activity_summary(&self, Parameters(p): Parameters<DailyActivitySummaryParams>) -> Result<CallToolResult, McpError> {
        let result = activities::get_daily_activity_summary(&self.database, p.date.as_deref())
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }
}

// ============================================================================
// Server Handler
// ============================================================================

#[tool_handler]
impl ServerHandler for WellmetricsService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "wellmetrics".into(),
                version: crate::build_info::VERSION.into(),
                title: Some("Wellness Metrics Tracker".into()),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Wellness Metrics Tracker - health metric, calculator, and activity tracking. \
                 IMPORTANT: Call metric_instructions before logging; all measurements use metric units (kg, cm). \
                 Profile: set_profile/get_profile (date of birth and gender feed AGE/GENDER in formulas). \
                 Catalog: list_metrics, get_metric, create_metric, update_metric, delete_metric. \
                 Values: add_metric_value, set_target, list_metric_values, get_latest_measurements, \
                 update_metric_value, delete_metric_value. \
                 Calculated metrics: get_calculated_value (BMI, LBM, BMR, TDEE, ...). \
                 Favorites: toggle_favorite, list_favorites, setup_default_favorites. \
                 Calculator: run_calculator, run_calculator_from_measurements, get_calculator_session, \
                 list_calculator_sessions. \
                 Activities: list_activity_types, create_activity_type, plan_activity, log_activity, \
                 complete_planned_activity, list_planned_activities, list_activity_records, \
                 delete_planned_activity, delete_activity_record, get_daily_activity_summary."
                    .into(),
            ),
        }
    }
}
