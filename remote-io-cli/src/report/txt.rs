//! Plain text report

use super::SessionReport;
use anyhow::{Context, Result};
use remote_io_device::PinRole;
use std::fmt::{self, Write};

const RULE: &str = "═══════════════════════════════════════════════";
const THIN_RULE: &str = "───────────────────────────────────────────────";

pub fn render(report: &SessionReport) -> Result<String> {
    let mut out = String::new();
    write_report(&mut out, report).context("Failed to format session report")?;
    Ok(out)
}

fn write_report(out: &mut impl Write, report: &SessionReport) -> fmt::Result {
    writeln!(out, "{}", RULE)?;
    writeln!(out, "  Remote I/O Session Report - {} test", report.test)?;
    writeln!(out, "{}", RULE)?;
    writeln!(out, "Bus address: 0x{:02X}", report.bus_address)?;
    writeln!(out, "Started:     {}", report.started.format("%Y-%m-%d %H:%M:%S%.3f"))?;
    writeln!(out, "Finished:    {}", report.finished.format("%Y-%m-%d %H:%M:%S%.3f"))?;

    writeln!(out, "\nExchanges:")?;
    writeln!(out, "{}", THIN_RULE)?;
    for record in &report.exchanges {
        let iteration = match record.iteration {
            Some(i) => format!("[{:04}] ", i),
            None => String::new(),
        };
        writeln!(
            out,
            "{} {}{:<26} sent {:>3}  received {:>5}  expected {:<6} {}",
            record.timestamp.format("%H:%M:%S%.3f"),
            iteration,
            record.label,
            record.opcode,
            record.reply,
            record.expected.to_string(),
            if record.ok { "✓" } else { "✗" }
        )?;
    }

    let device = &report.device;
    writeln!(out, "\nDevice state:")?;
    writeln!(out, "{}", THIN_RULE)?;
    for (pin, role) in device.roles.iter().enumerate() {
        if *role != PinRole::Unused {
            writeln!(out, "  pin {:>2}  {:<13} value {}", pin, role, device.values[pin])?;
        }
    }
    writeln!(
        out,
        "  analog window {}..{} (auto-range {})",
        device.range.min,
        device.range.max,
        if device.range.auto_range { "on" } else { "off" }
    )?;
    writeln!(out, "  loops {}  requests {}", device.loop_count, device.request_count)?;

    let summary = &report.summary;
    writeln!(out, "\nSummary:")?;
    writeln!(out, "{}", THIN_RULE)?;
    writeln!(out, "  Exchanges: {}", summary.exchanges)?;
    writeln!(out, "  Passed:    {}", summary.passed)?;
    writeln!(out, "  Failed:    {}", summary.failed)
}

#[cfg(test)]
mod tests {
    use super::super::tests::sample_report;
    use super::*;

    #[test]
    fn test_txt_sections() {
        let rendered = render(&sample_report()).unwrap();
        assert!(rendered.contains("configuration test"));
        assert!(rendered.contains("Bus address: 0x08"));
        assert!(rendered.contains("analog window 70..600 (auto-range on)"));
        assert!(rendered.contains("Failed:    1"));
        assert_eq!(rendered.matches('✗').count(), 1);
    }

    struct FailingSink;

    impl Write for FailingSink {
        fn write_str(&mut self, _: &str) -> fmt::Result {
            Err(fmt::Error)
        }
    }

    #[test]
    fn test_write_errors_propagate() {
        assert!(write_report(&mut FailingSink, &sample_report()).is_err());
    }
}
