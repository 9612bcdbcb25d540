//! Status thresholds for lab metrics
//!
//! Two scales are in use. INP and TBT are rated Good / Needs Improvement /
//! Poor; the display-oriented JS blocking time and long-task count use
//! Low / Medium / High. In both cases the lower bound is exclusive and the
//! upper bound inclusive: `v < lower` is the best band, `v <= upper` the
//! middle one.

use super::{MetricName, MetricStatus};

/// Which set of labels a threshold band maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scale {
    /// Good / Needs Improvement / Poor
    Rating,
    /// Low / Medium / High
    Severity,
}

/// A two-boundary classification band
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub lower: f64,
    pub upper: f64,
    pub scale: Scale,
}

pub const INP: Thresholds = Thresholds {
    lower: 200.0,
    upper: 500.0,
    scale: Scale::Rating,
};

pub const TBT: Thresholds = Thresholds {
    lower: 200.0,
    upper: 600.0,
    scale: Scale::Rating,
};

pub const JS_BLOCKING_TIME: Thresholds = Thresholds {
    lower: 200.0,
    upper: 500.0,
    scale: Scale::Severity,
};

pub const LONG_TASK_COUNT: Thresholds = Thresholds {
    lower: 10.0,
    upper: 50.0,
    scale: Scale::Severity,
};

impl Thresholds {
    pub fn for_metric(name: MetricName) -> Self {
        match name {
            MetricName::InpLab => INP,
            MetricName::Tbt => TBT,
            MetricName::JsBlockingTime => JS_BLOCKING_TIME,
            MetricName::LongTaskCount => LONG_TASK_COUNT,
        }
    }

    pub fn classify(&self, value: f64) -> MetricStatus {
        let band = if value < self.lower {
            0
        } else if value <= self.upper {
            1
        } else {
            2
        };

        match (self.scale, band) {
            (Scale::Rating, 0) => MetricStatus::Good,
            (Scale::Rating, 1) => MetricStatus::NeedsImprovement,
            (Scale::Rating, _) => MetricStatus::Poor,
            (Scale::Severity, 0) => MetricStatus::Low,
            (Scale::Severity, 1) => MetricStatus::Medium,
            (Scale::Severity, _) => MetricStatus::High,
        }
    }
}

/// Classify a value for a known metric
pub fn classify(name: MetricName, value: f64) -> MetricStatus {
    Thresholds::for_metric(name).classify(value)
}

/// Classify by display label; unrecognised labels are `Unknown`
pub fn classify_label(label: &str, value: f64) -> MetricStatus {
    match MetricName::from_label(label) {
        Some(name) => classify(name, value),
        None => MetricStatus::Unknown,
    }
}
