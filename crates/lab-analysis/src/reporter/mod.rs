//! Report output for the command-line tool
//!
//! - **Json**: compact, identical to the HTTP `/analyze` body
//! - **JsonPretty**: indented JSON
//! - **Console**: human-readable table
//!
//! ```no_run
//! use lab_analysis::reporter::{OutputFormat, Reporter};
//! use lab_analysis::AnalysisReport;
//!
//! # fn example(report: AnalysisReport) -> anyhow::Result<()> {
//! Reporter::new(OutputFormat::Console).report(&report)?;
//! Reporter::new(OutputFormat::JsonPretty).write_to_file(&report, "report.json")?;
//! # Ok(())
//! # }
//! ```

mod console;
mod json;

use anyhow::Result;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use crate::report::AnalysisReport;

pub use console::ConsoleReporter;
pub use json::JsonReporter;

/// Output format for analysis reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    Json,
    JsonPretty,
    #[default]
    Console,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "json-pretty" | "pretty" => Ok(OutputFormat::JsonPretty),
            "console" | "text" => Ok(OutputFormat::Console),
            other => Err(format!(
                "Unknown output format '{}' (expected json, json-pretty or console)",
                other
            )),
        }
    }
}

/// Formats and writes analysis reports
#[derive(Debug, Default)]
pub struct Reporter {
    format: OutputFormat,
}

impl Reporter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Write the report to stdout
    pub fn report(&self, report: &AnalysisReport) -> Result<()> {
        let output = self.format_report(report)?;
        let mut stdout = io::stdout().lock();
        stdout.write_all(output.as_bytes())?;
        if !output.ends_with('\n') {
            writeln!(stdout)?;
        }
        stdout.flush()?;
        Ok(())
    }

    pub fn write_to_file<P: AsRef<Path>>(&self, report: &AnalysisReport, path: P) -> Result<()> {
        let output = self.format_report(report)?;
        fs::write(path, output)?;
        Ok(())
    }

    pub fn format_report(&self, report: &AnalysisReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => JsonReporter::format(report, false),
            OutputFormat::JsonPretty => JsonReporter::format(report, true),
            OutputFormat::Console => ConsoleReporter::format(report),
        }
    }
}
