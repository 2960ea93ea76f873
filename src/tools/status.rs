//! Service status tool
//!
//! Runtime status information plus the metric-logging guide served to
//! assistants through the server instructions.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::build_info::BuildInfo;

/// Metric logging instructions for AI assistants
pub const METRIC_INSTRUCTIONS: &str = r#"
# Wellness Metrics Logging Instructions

This guide explains how to track health metrics, run the calculator, and
log activities.

## Overview

The service tracks three kinds of data:
1. **Metrics** - A catalog of measurable values (weight, glucose, blood
   pressure components, ...) plus calculated metrics (BMI, BMR, TDEE, ...)
2. **Metric values** - Timestamped readings attached to a metric
3. **Activities** - Planned and logged physical activity with calorie
   accounting

## Units

All measurements use metric units:
- Body measurements: **kg** for weight, **cm** for lengths/circumferences
- Lab results follow each metric's `unit` field (mg/dL, %, etc.)
- Energy: **kcal**

Convert user input before logging (1 lb = 0.4536 kg, 1 inch = 2.54 cm).

## Metric Identifiers

Tools accept any of:
- The symbolic id (e.g. `WEIGHT`, `HEIGHT`, `BF_PCT`, `GLUCOSE`) - preferred
- The display name (e.g. "Body Fat Percentage") - case-insensitive
- The numeric database id

Use `list_metrics` to discover what exists before creating a new metric.

## Measurement Types

| Type | Use For |
|------|---------|
| `log` | Ordinary reading (default) |
| `current` | Explicit "this is my current value" snapshot |
| `baseline` | Starting point before a program |
| `target` | Desired value (use `set_target`) |
| `goal` | Long-term aspiration |

`log`, `current`, and `baseline` count as observations; the latest
observation feeds formulas. Targets and goals never shadow a real
measurement. The `calculated` type is reserved for calculator output and
cannot be written directly.

## Calculated Metrics

Calculated metrics carry a formula over other metrics' symbols, e.g.
BMI is `WEIGHT / pow(HEIGHT / 100, 2)`. Use `get_calculated_value` to
evaluate one against the latest measurements. Evaluation also supplies:
- `AGE` and `GENDER` from the profile (set it with `set_profile`)
- `ACTIVITY_MULTIPLIER` from today's logged activities

If a required input has never been recorded the response has
`available: false` - log the missing measurement and retry.

## The Health Calculator

`run_calculator` takes weight, height, optional body fat %, gender, and
activity level, then computes BMI, lean body mass, body fat mass, BMR
(Mifflin-St Jeor), and TDEE. Results are stored as `calculated` values
tied to the session, retrievable with `get_calculator_session`.

`run_calculator_from_measurements` pulls weight/height/body fat from the
latest observations instead - log those first.

Activity levels: `sedentary`, `lightly_active`, `moderately_active`,
`very_active`, `extremely_active`.

## Activities

1. `list_activity_types` - see the catalog (running, cycling, ...)
2. `plan_activity` - schedule for a date (defaults to today)
3. `log_activity` - record what actually happened
4. `complete_planned_activity` - mark a plan done and log it in one step
5. `get_daily_activity_summary` - planned vs. logged calories and the
   day's activity multipliers

Calories = rate (kcal/h/kg) x body weight x hours, using the latest
recorded weight (70 kg when none exists). Keep WEIGHT current for
accurate numbers.

## Typical Workflows

### Daily weigh-in
```
add_metric_value(metric: "WEIGHT", value: 81.2)
```

### Morning glucose with context
```
add_metric_value(metric: "GLUCOSE", value: 95, notes: "fasting")
```

### Set a weight goal
```
set_target(metric: "WEIGHT", value: 75)
```
Setting a target again within a day updates it in place; after a day a
new row is written so history is preserved.

### Check progress
```
get_latest_measurements()
get_calculated_value(metric: "BMI")
list_metric_values(metric: "WEIGHT", days: 30)
```

### Custom tracking
```
create_metric(name: "Resting Heart Rate", metric_type: "vital_sign",
              symbol: "RHR", unit: "bpm", min_value: 40, max_value: 100)
```
Values outside min/max are flagged `high`/`low` automatically.

## Notes

- Dates use ISO format: YYYY-MM-DD; timestamps default to now
- Deleting a metric removes its history; prefer `deactivate_only: true`
- `setup_default_favorites` pins the common starter metrics; use
  `toggle_favorite` for personal preferences
"#;

/// Runtime status of the service
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStatus {
    /// Build information
    pub build_number: u64,
    pub build_timestamp: &'static str,
    pub version: &'static str,

    /// Database information
    pub database_path: String,
    pub database_size_bytes: Option<u64>,

    /// Process information
    pub uptime_seconds: u64,
    pub process_id: u32,
    pub memory_usage_bytes: u64,
}

/// Status tracker for collecting runtime information
pub struct StatusTracker {
    start_time: Instant,
    database_path: PathBuf,
}

impl StatusTracker {
    /// Create a new status tracker
    pub fn new(database_path: PathBuf) -> Self {
        Self {
            start_time: Instant::now(),
            database_path,
        }
    }

    /// Get the current status
    pub fn get_status(&self) -> ServiceStatus {
        let build_info = BuildInfo::current();

        let database_size_bytes = std::fs::metadata(&self.database_path)
            .ok()
            .map(|m| m.len());

        let pid = std::process::id();
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]));

        let memory_usage_bytes = sys
            .process(Pid::from_u32(pid))
            .map(|p| p.memory())
            .unwrap_or(0);

        ServiceStatus {
            build_number: build_info.build_number,
            build_timestamp: build_info.build_timestamp,
            version: build_info.version,
            database_path: self.database_path.display().to_string(),
            database_size_bytes,
            uptime_seconds: self.start_time.elapsed().as_secs(),
            process_id: pid,
            memory_usage_bytes,
        }
    }
}
