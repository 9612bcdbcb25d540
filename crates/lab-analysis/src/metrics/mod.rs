//! Lab metrics derived from long-task samples
//!
//! [`derive`] turns the long tasks observed during the interaction window
//! into four classified metrics:
//!
//! | Metric            | Value                      | Scale                          |
//! |-------------------|----------------------------|--------------------------------|
//! | INP (lab)         | longest single long task   | Good / Needs Improvement / Poor |
//! | TBT               | sum of long-task durations | Good / Needs Improvement / Poor |
//! | JS blocking time  | same as TBT                | Low / Medium / High            |
//! | Long tasks count  | number of long tasks       | Low / Medium / High            |
//!
//! # Example
//!
//! ```
//! use lab_analysis::metrics::{derive, LongTaskSample, MetricName, MetricStatus};
//!
//! let samples = [50.0, 75.0, 400.0].map(LongTaskSample::new);
//! let metrics = derive(&samples);
//!
//! let tbt = metrics.iter().find(|m| m.name == MetricName::Tbt).unwrap();
//! assert_eq!(tbt.value, 525.0);
//! assert_eq!(tbt.status, MetricStatus::NeedsImprovement);
//! ```

pub mod thresholds;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Duration of one main-thread long task, in observation order
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LongTaskSample {
    pub duration_ms: f64,
}

impl LongTaskSample {
    pub fn new(duration_ms: f64) -> Self {
        Self { duration_ms }
    }
}

/// Names of the reported metrics, serialized as their display labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetricName {
    #[serde(rename = "INP (lab)")]
    InpLab,
    #[serde(rename = "TBT")]
    Tbt,
    #[serde(rename = "JS blocking time")]
    JsBlockingTime,
    #[serde(rename = "Long tasks count")]
    LongTaskCount,
}

impl MetricName {
    /// Report order
    pub const ALL: [MetricName; 4] = [
        MetricName::InpLab,
        MetricName::Tbt,
        MetricName::JsBlockingTime,
        MetricName::LongTaskCount,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MetricName::InpLab => "INP (lab)",
            MetricName::Tbt => "TBT",
            MetricName::JsBlockingTime => "JS blocking time",
            MetricName::LongTaskCount => "Long tasks count",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|name| name.label() == label)
    }

    pub fn unit(&self) -> MetricUnit {
        match self {
            MetricName::LongTaskCount => MetricUnit::Count,
            _ => MetricUnit::Milliseconds,
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricUnit {
    #[serde(rename = "ms")]
    Milliseconds,
    #[serde(rename = "")]
    Count,
}

impl MetricUnit {
    pub fn suffix(&self) -> &'static str {
        match self {
            MetricUnit::Milliseconds => "ms",
            MetricUnit::Count => "",
        }
    }
}

/// Classification of a metric value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricStatus {
    Good,
    #[serde(rename = "Needs Improvement")]
    NeedsImprovement,
    Poor,
    High,
    Medium,
    Low,
    Unknown,
}

impl fmt::Display for MetricStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MetricStatus::Good => "Good",
            MetricStatus::NeedsImprovement => "Needs Improvement",
            MetricStatus::Poor => "Poor",
            MetricStatus::High => "High",
            MetricStatus::Medium => "Medium",
            MetricStatus::Low => "Low",
            MetricStatus::Unknown => "Unknown",
        };
        f.write_str(label)
    }
}

/// A named, classified lab metric
///
/// Counts serialize as JSON integers, durations as floats.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Metric {
    pub name: MetricName,
    pub value: f64,
    pub unit: MetricUnit,
    pub status: MetricStatus,
}

impl Metric {
    /// Build a metric and classify it with the standard thresholds
    pub fn new(name: MetricName, value: f64) -> Self {
        Self {
            name,
            value,
            unit: name.unit(),
            status: thresholds::classify(name, value),
        }
    }
}

impl Serialize for Metric {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Metric", 4)?;
        state.serialize_field("name", &self.name)?;
        match self.unit {
            MetricUnit::Count => state.serialize_field("value", &(self.value.max(0.0).round() as u64))?,
            MetricUnit::Milliseconds => state.serialize_field("value", &self.value)?,
        }
        state.serialize_field("unit", &self.unit)?;
        state.serialize_field("status", &self.status)?;
        state.end()
    }
}

/// Derive the lab metrics from long-task samples
///
/// Pure: the output depends only on the input samples. An empty input is
/// valid and yields zero values at the lowest-severity statuses.
pub fn derive(samples: &[LongTaskSample]) -> Vec<Metric> {
    let total_blocking: f64 = samples.iter().map(|s| s.duration_ms).sum();
    let longest = samples
        .iter()
        .map(|s| s.duration_ms)
        .fold(0.0_f64, f64::max);
    let count = samples.len() as f64;

    MetricName::ALL
        .into_iter()
        .map(|name| {
            let value = match name {
                MetricName::InpLab => longest,
                MetricName::Tbt | MetricName::JsBlockingTime => total_blocking,
                MetricName::LongTaskCount => count,
            };
            Metric::new(name, value)
        })
        .collect()
}
