//! Analysis report returned to callers

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::metrics::{Metric, MetricName};

/// Result of one synthetic analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    /// The analysed URL, as requested
    pub url: String,
    /// When the report was produced (RFC 3339, UTC)
    #[serde(with = "rfc3339")]
    pub test_run: DateTime<Utc>,
    /// Human-readable description of the emulated device
    pub device: String,
    /// Derived metrics in report order
    pub metrics: Vec<Metric>,
}

impl AnalysisReport {
    pub fn new(url: impl Into<String>, device: impl Into<String>, metrics: Vec<Metric>) -> Self {
        Self {
            url: url.into(),
            test_run: Utc::now(),
            device: device.into(),
            metrics,
        }
    }

    pub fn metric(&self, name: MetricName) -> Option<&Metric> {
        self.metrics.iter().find(|m| m.name == name)
    }
}

/// Millisecond-precision RFC 3339 with a `Z` suffix
mod rfc3339 {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
