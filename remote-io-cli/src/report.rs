//! Session report
//!
//! Every host exchange is recorded with its timestamp, the opcode sent, the
//! reply received and whether the reply passed its check. The report is
//! rendered as plain text or JSON.

pub mod json;
pub mod txt;

use crate::config::{OutputFormat, TestKind};
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use remote_io_device::DeviceSnapshot;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// What a reply is checked against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum Expectation {
    /// Reply must equal this value
    Exact(u16),
    /// Reply must be 0 or 1
    Digital,
    /// Reply must fit in 0..=255
    Byte,
    /// Informational only
    Any,
}

impl Expectation {
    pub fn accepts(&self, reply: u16) -> bool {
        match *self {
            Expectation::Exact(expected) => reply == expected,
            Expectation::Digital => reply <= 1,
            Expectation::Byte => reply <= 0xFF,
            Expectation::Any => true,
        }
    }
}

impl std::fmt::Display for Expectation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expectation::Exact(value) => write!(f, "== {}", value),
            Expectation::Digital => write!(f, "0|1"),
            Expectation::Byte => write!(f, "0-255"),
            Expectation::Any => write!(f, "-"),
        }
    }
}

/// One request/reply pair
#[derive(Debug, Clone, Serialize)]
pub struct ExchangeRecord {
    pub timestamp: DateTime<Local>,
    /// Sweep iteration, if the exchange belongs to one
    pub iteration: Option<usize>,
    pub opcode: u16,
    pub reply: u16,
    pub label: String,
    pub expected: Expectation,
    pub ok: bool,
}

/// Totals over a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub exchanges: usize,
    pub passed: usize,
    pub failed: usize,
}

/// Everything a session produced
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub test: TestKind,
    pub bus_address: u8,
    pub started: DateTime<Local>,
    pub finished: DateTime<Local>,
    pub summary: Summary,
    pub exchanges: Vec<ExchangeRecord>,
    /// Device state at the end of the session
    pub device: DeviceSnapshot,
}

impl SessionReport {
    pub fn new(
        test: TestKind,
        bus_address: u8,
        started: DateTime<Local>,
        exchanges: Vec<ExchangeRecord>,
        device: DeviceSnapshot,
    ) -> Self {
        let failed = exchanges.iter().filter(|e| !e.ok).count();
        let summary = Summary {
            exchanges: exchanges.len(),
            passed: exchanges.len() - failed,
            failed,
        };
        Self {
            test,
            bus_address,
            started,
            finished: Local::now(),
            summary,
            exchanges,
            device,
        }
    }

    pub fn is_success(&self) -> bool {
        self.summary.failed == 0
    }

    /// Render in the requested format
    pub fn render(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Txt => txt::render(self),
            OutputFormat::Json => json::render(self),
        }
    }

    /// Render and write to `path`
    pub fn write_to(&self, path: &Path, format: OutputFormat) -> Result<()> {
        let content = self.render(format)?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write report: {:?}", path))?;
        log::info!("Report written to {:?}", path);
        Ok(())
    }
}
