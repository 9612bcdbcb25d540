//! Error types for synthetic analysis

use thiserror::Error;

/// Failure reported by a browser backend
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("Browser protocol error: {0}")]
    Protocol(String),

    #[error("Script evaluation failed: {0}")]
    Evaluation(String),

    #[error("Browser teardown failed: {0}")]
    Teardown(String),
}

impl From<chromiumoxide::error::CdpError> for SessionError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        SessionError::Protocol(err.to_string())
    }
}

/// Request-fatal analysis failure
///
/// Per-interaction failures never surface here; the simulator absorbs them.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("{0}")]
    Validation(String),

    #[error("Failed to acquire browser session: {0}")]
    SessionAcquisition(#[source] SessionError),

    #[error("Failed to instrument page: {0}")]
    Instrumentation(#[source] SessionError),

    #[error("Failed to load {url}: {source}")]
    Navigation {
        url: String,
        #[source]
        source: SessionError,
    },

    #[error("Timed out loading {url} after {timeout_ms}ms")]
    NavigationTimeout { url: String, timeout_ms: u64 },

    #[error("Analyzer is not accepting new work")]
    Unavailable,

    #[error("Analysis task did not complete: {0}")]
    Interrupted(String),
}

impl AnalysisError {
    /// Whether the caller supplied bad input (as opposed to an internal failure)
    pub fn is_client_error(&self) -> bool {
        matches!(self, AnalysisError::Validation(_))
    }
}
