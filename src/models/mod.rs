//! Data models
//!
//! Each model wraps a table with typed CRUD operations.

pub mod activity;
pub mod calculator;
pub mod favorite;
pub mod metric;
pub mod metric_value;
pub mod profile;

pub use activity::{
    ActivityDetail, ActivityRecord, ActivityRecordCreate, ActivityType, ActivityTypeCreate,
    ActivityTypeUpdate, PlannedActivity, PlannedActivityCreate,
};
pub use calculator::{ActivityLevel, CalculatorSession, CalculatorSessionCreate};
pub use favorite::MetricFavorite;
pub use metric::{Metric, MetricCreate, MetricType, MetricUpdate};
pub use metric_value::{MeasurementType, MetricValue, MetricValueCreate, ValueStatus};
pub use profile::{Gender, Profile};
