//! Data models for the RUM server

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::ApiError;

/// One field interaction-latency measurement reported by a browser
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RumSample {
    /// Client-side capture time, as sent
    pub timestamp: String,
    /// Interaction to Next Paint in milliseconds
    pub inp: f64,
    /// Description of the element the user interacted with
    pub element: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub browser: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_url: Option<String>,
}

impl RumSample {
    /// Reject samples that deserialize but carry unusable values
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.timestamp.trim().is_empty() {
            return Err(ApiError::Validation("timestamp is required".into()));
        }
        if self.element.trim().is_empty() {
            return Err(ApiError::Validation("element is required".into()));
        }
        if !self.inp.is_finite() || self.inp < 0.0 {
            return Err(ApiError::Validation(format!(
                "inp must be a non-negative number, got {}",
                self.inp
            )));
        }
        Ok(())
    }
}

/// Row shape of `rum_samples`
#[derive(Debug, FromRow)]
pub struct DbRumSample {
    pub timestamp: String,
    pub inp: f64,
    pub element: String,
    pub device: Option<String>,
    pub browser: Option<String>,
    pub os: Option<String>,
    pub connection: Option<String>,
    pub page_url: Option<String>,
}

impl From<DbRumSample> for RumSample {
    fn from(row: DbRumSample) -> Self {
        Self {
            timestamp: row.timestamp,
            inp: row.inp,
            element: row.element,
            device: row.device,
            browser: row.browser,
            os: row.os,
            connection: row.connection,
            page_url: row.page_url,
        }
    }
}

/// Query string for `GET /rum-data`
#[derive(Debug, Default, Deserialize)]
pub struct RumDataQuery {
    /// Exact `pageUrl` to filter on
    pub url: Option<String>,
}

/// Query string for `GET /analyze`
#[derive(Debug, Default, Deserialize)]
pub struct AnalyzeQuery {
    pub url: Option<String>,
}

/// Body returned by `POST /rum`
#[derive(Debug, Serialize, Deserialize)]
pub struct AckResponse {
    pub status: String,
}

impl AckResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}
