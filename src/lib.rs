//! Wellness Metrics Tracker
//!
//! Core functionality for health metric tracking, calculated metrics, and
//! activity energy accounting.

pub mod build_info;
pub mod db;
pub mod formula;
pub mod health;
pub mod mcp;
pub mod models;
pub mod tools;
