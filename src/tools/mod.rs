//! MCP tool implementations
//!
//! Each module holds the plain-function backends for one tool family;
//! the MCP server wraps them with parameter structs and JSON responses.

pub mod activities;
pub mod calculator;
pub mod metrics;
pub mod profile;
pub mod status;
