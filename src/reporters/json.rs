//! JSON reporter
//!
//! Outputs the full HealthReport as pretty-printed JSON.
//! Field names are the serde names of the model types and are stable.

use crate::models::HealthReport;
use anyhow::Result;

/// Render report as JSON
pub fn render(report: &HealthReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}
