//! JSON report

use super::SessionReport;
use anyhow::{Context, Result};

pub fn render(report: &SessionReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("Failed to serialize session report")
}
