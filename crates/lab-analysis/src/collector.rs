//! Long-task collection inside the page
//!
//! The collector registers an init script that runs before any page script.
//! It buffers every `longtask` performance entry into
//! `window.__labLongTasks` so tasks that happen during load are kept too.
//! After the interaction window closes, [`extract`] reads the buffer back.
//!
//! The same script cancels default navigation for link clicks in the capture
//! phase. Page handlers still run, but the browser stays on the analysed
//! document so the buffer is not lost to a cross-document navigation.
//!
//! # Example
//!
//! ```ignore
//! use lab_analysis::collector;
//!
//! collector::install_instrumentation(&session).await?;
//! session.goto("https://example.com").await?;
//! // ... interact ...
//! let samples = collector::extract(&session).await?;
//! ```

use serde_json::Value;
use tracing::{debug, instrument, trace};

use crate::error::{AnalysisError, SessionError};
use crate::metrics::LongTaskSample;
use crate::session::BrowserSession;

/// Name of the in-page buffer
pub const BUFFER_NAME: &str = "__labLongTasks";

/// Installed on every new document before page scripts run
pub const LONG_TASK_SCRIPT: &str = r#"
(() => {
    if (window.__labLongTasks) return;
    window.__labLongTasks = [];

    try {
        const observer = new PerformanceObserver((list) => {
            for (const entry of list.getEntries()) {
                window.__labLongTasks.push(entry.duration);
            }
        });
        observer.observe({ type: 'longtask', buffered: true });
    } catch (e) {
        // Long Tasks API unavailable; the buffer stays empty
    }

    document.addEventListener('click', (event) => {
        const target = event.target;
        const link = target && target.closest ? target.closest('a[href]') : null;
        if (link) event.preventDefault();
    }, true);
})();
"#;

/// Reads the buffer without clearing it
const DRAIN_EXPRESSION: &str = "(window.__labLongTasks || []).slice()";

/// Install the long-task observer; must happen before navigation
#[instrument(skip(session))]
pub async fn install_instrumentation<S: BrowserSession>(session: &S) -> Result<(), AnalysisError> {
    session
        .add_init_script(LONG_TASK_SCRIPT)
        .await
        .map_err(AnalysisError::Instrumentation)?;
    debug!("Long-task observer armed");
    Ok(())
}

/// Read every long task buffered so far, in observation order
#[instrument(skip(session))]
pub async fn extract<S: BrowserSession>(session: &S) -> Result<Vec<LongTaskSample>, AnalysisError> {
    let value = session
        .evaluate(DRAIN_EXPRESSION)
        .await
        .map_err(AnalysisError::Instrumentation)?;

    let samples = parse_samples(value).map_err(AnalysisError::Instrumentation)?;
    trace!(count = samples.len(), "Drained long tasks");
    Ok(samples)
}

/// Convert the evaluated buffer into samples
///
/// A missing buffer reads as no tasks. Anything other than an array of
/// non-negative numbers is an instrumentation fault.
pub fn parse_samples(value: Value) -> Result<Vec<LongTaskSample>, SessionError> {
    let entries = match value {
        Value::Null => return Ok(Vec::new()),
        Value::Array(entries) => entries,
        other => {
            return Err(SessionError::Evaluation(format!(
                "{} is not an array: {}",
                BUFFER_NAME, other
            )))
        }
    };

    entries
        .into_iter()
        .map(|entry| match entry.as_f64() {
            Some(duration) if duration.is_finite() && duration >= 0.0 => {
                Ok(LongTaskSample::new(duration))
            }
            _ => Err(SessionError::Evaluation(format!(
                "Invalid long-task duration in {}: {}",
                BUFFER_NAME, entry
            ))),
        })
        .collect()
}
