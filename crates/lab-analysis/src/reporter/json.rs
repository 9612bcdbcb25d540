//! JSON reporter

use anyhow::Result;

use crate::report::AnalysisReport;

pub struct JsonReporter;

impl JsonReporter {
    /// Serialize the report, optionally indented
    pub fn format(report: &AnalysisReport, pretty: bool) -> Result<String> {
        let output = if pretty {
            serde_json::to_string_pretty(report)?
        } else {
            serde_json::to_string(report)?
        };
        Ok(output)
    }
}
