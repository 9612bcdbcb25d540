//! Console reporter
//!
//! Human-readable output with an ASCII table and a status marker per metric.

use anyhow::Result;
use std::fmt::Write;

use crate::metrics::{Metric, MetricStatus, MetricUnit};
use crate::report::AnalysisReport;

pub struct ConsoleReporter;

impl ConsoleReporter {
    pub fn format(report: &AnalysisReport) -> Result<String> {
        let mut output = String::new();

        writeln!(output)?;
        writeln!(output, "╔══════════════════════════════════════════════════════════════╗")?;
        writeln!(output, "║                     LAB ANALYSIS REPORT                      ║")?;
        writeln!(output, "╚══════════════════════════════════════════════════════════════╝")?;
        writeln!(output)?;

        writeln!(output, "URL:       {}", report.url)?;
        writeln!(output, "Device:    {}", report.device)?;
        writeln!(output, "Test run:  {}", report.test_run.to_rfc3339())?;
        writeln!(output)?;

        writeln!(output, "  ┌──────────────────────┬──────────────┬─────────────────────┐")?;
        writeln!(output, "  │ Metric               │        Value │ Status              │")?;
        writeln!(output, "  ├──────────────────────┼──────────────┼─────────────────────┤")?;
        for metric in &report.metrics {
            Self::format_metric_row(&mut output, metric)?;
        }
        writeln!(output, "  └──────────────────────┴──────────────┴─────────────────────┘")?;
        writeln!(output)?;

        Ok(output)
    }

    fn format_metric_row(output: &mut String, metric: &Metric) -> Result<()> {
        let value = match metric.unit {
            MetricUnit::Milliseconds => format!("{:.0} ms", metric.value),
            MetricUnit::Count => format!("{:.0}", metric.value),
        };
        let status = format!("{} {}", Self::marker(metric.status), metric.status);
        writeln!(
            output,
            "  │ {:<20} │ {:>12} │ {:<19} │",
            metric.name.label(),
            value,
            status
        )?;
        Ok(())
    }

    fn marker(status: MetricStatus) -> &'static str {
        match status {
            MetricStatus::Good | MetricStatus::Low => "✓",
            MetricStatus::NeedsImprovement | MetricStatus::Medium => "!",
            MetricStatus::Poor | MetricStatus::High => "✗",
            MetricStatus::Unknown => "?",
        }
    }
}
