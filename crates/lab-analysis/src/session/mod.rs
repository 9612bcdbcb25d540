//! Exclusive browser sessions
//!
//! Every analysis acquires its own [`BrowserSession`] from a
//! [`SessionLauncher`], drives it through a fixed sequence of steps and
//! releases it on every exit path. Sessions are never pooled or shared.
//!
//! The traits keep the orchestration independent of the automation backend:
//! [`chromium::ChromiumLauncher`] drives a real headless Chrome, while tests
//! plug in scripted fakes.

pub mod chromium;

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::config::DeviceProfile;
use crate::error::{AnalysisError, SessionError};

pub use chromium::{ChromiumLauncher, ChromiumSession};

/// Starts browser sessions configured for a device profile
#[async_trait]
pub trait SessionLauncher: Send + Sync + 'static {
    type Session: BrowserSession + 'static;

    /// Launch an isolated browser with viewport, user agent, network and CPU
    /// emulation already applied
    async fn acquire(&self, profile: &DeviceProfile) -> Result<Self::Session, SessionError>;
}

/// One page inside one isolated browser instance
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// Handle to a DOM element found on the page
    type Element: Send + Sync;

    /// Register a script that runs before any page script on every new document
    async fn add_init_script(&self, source: &str) -> Result<(), SessionError>;

    /// Navigate and wait for the `load` event
    async fn goto(&self, url: &str) -> Result<(), SessionError>;

    /// Elements matching `selector` that currently occupy visible space
    async fn visible_elements(&self, selector: &str) -> Result<Vec<Self::Element>, SessionError>;

    async fn click(&self, element: &Self::Element) -> Result<(), SessionError>;

    /// Focus the element and type `text` key by key
    async fn type_text(&self, element: &Self::Element, text: &str) -> Result<(), SessionError>;

    /// Evaluate an expression in the page and return its JSON value
    async fn evaluate(&self, expression: &str) -> Result<serde_json::Value, SessionError>;

    /// Close the browser and release every handle
    async fn close(self) -> Result<(), SessionError>;
}

/// Load `url` within `timeout`
///
/// Timeouts and load failures are both fatal for the request; there is no retry.
#[instrument(skip(session), fields(timeout_ms = timeout.as_millis() as u64))]
pub async fn navigate<S: BrowserSession>(
    session: &S,
    url: &str,
    timeout: Duration,
) -> Result<(), AnalysisError> {
    debug!("Navigating to: {}", url);
    match tokio::time::timeout(timeout, session.goto(url)).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(source)) => Err(AnalysisError::Navigation {
            url: url.to_string(),
            source,
        }),
        Err(_) => Err(AnalysisError::NavigationTimeout {
            url: url.to_string(),
            timeout_ms: timeout.as_millis() as u64,
        }),
    }
}

/// Close a session, logging (never propagating) teardown failures
pub async fn release<S: BrowserSession>(session: S) {
    match session.close().await {
        Ok(()) => debug!("Browser session released"),
        Err(e) => warn!("Failed to release browser session: {}", e),
    }
}
