//! Analysis orchestration
//!
//! [`Analyzer::analyze`] runs the fixed pipeline for one URL:
//!
//! ```text
//! validate ─► acquire ─► install instrumentation ─► navigate ─► simulate ─► extract
//!                │                                                            │
//!                └──────────────────── release (always) ◄────────────────────┘
//!                                            │
//!                                         derive ─► AnalysisReport
//! ```
//!
//! Each analysis owns an exclusive browser session. A semaphore bounds how
//! many run at once; callers beyond the bound wait for a permit.
//!
//! # Example
//!
//! ```no_run
//! use lab_analysis::{AnalysisConfig, Analyzer};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let analyzer = Analyzer::chromium(&AnalysisConfig::default());
//! let report = analyzer.analyze("https://example.com").await?;
//! for metric in &report.metrics {
//!     println!("{}: {} ({})", metric.name, metric.value, metric.status);
//! }
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn, Instrument};
use url::Url;

use crate::collector;
use crate::config::{AnalysisConfig, DeviceProfile};
use crate::error::AnalysisError;
use crate::metrics::{derive, LongTaskSample};
use crate::report::AnalysisReport;
use crate::session::{self, ChromiumLauncher, SessionLauncher};
use crate::simulator::InteractionSimulator;

/// Runs synthetic analyses against a session backend
pub struct Analyzer<L: SessionLauncher> {
    launcher: Arc<L>,
    profile: DeviceProfile,
    navigation_timeout: Duration,
    simulator: InteractionSimulator,
    permits: Arc<Semaphore>,
}

impl Analyzer<ChromiumLauncher> {
    /// Analyzer backed by headless Chrome
    pub fn chromium(config: &AnalysisConfig) -> Self {
        Self::new(ChromiumLauncher::new(config.browser.clone()), config)
    }
}

impl<L: SessionLauncher> Analyzer<L> {
    pub fn new(launcher: L, config: &AnalysisConfig) -> Self {
        Self {
            launcher: Arc::new(launcher),
            profile: config.device.profile(),
            navigation_timeout: config.analysis.navigation_timeout(),
            simulator: InteractionSimulator::from_settings(&config.analysis),
            permits: Arc::new(Semaphore::new(config.analysis.max_concurrent.max(1))),
        }
    }

    /// Replace the interaction simulator (budget, probe text, seed)
    pub fn with_simulator(mut self, simulator: InteractionSimulator) -> Self {
        self.simulator = simulator;
        self
    }

    pub fn profile(&self) -> &DeviceProfile {
        &self.profile
    }

    /// Number of analyses that could start right now without waiting
    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }

    /// Stop accepting new analyses; in-flight ones finish normally
    pub fn shutdown(&self) {
        self.permits.close();
    }

    /// Analyse one URL and return its lab metrics
    ///
    /// The session runs in its own task. Dropping the returned future stops
    /// the wait, but the session is still driven to the end and released,
    /// and the concurrency permit is held until then.
    ///
    /// # Errors
    ///
    /// - [`AnalysisError::Validation`] for an empty, relative or non-http(s)
    ///   URL. No browser is launched.
    /// - [`AnalysisError::SessionAcquisition`] if the browser cannot start.
    /// - [`AnalysisError::Instrumentation`], [`AnalysisError::Navigation`] or
    ///   [`AnalysisError::NavigationTimeout`] after the session has been
    ///   released.
    #[instrument(skip(self), fields(device = %self.profile.name))]
    pub async fn analyze(&self, target_url: &str) -> Result<AnalysisReport, AnalysisError> {
        let url = validate_target_url(target_url)?;

        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| AnalysisError::Unavailable)?;

        let run = Run {
            launcher: self.launcher.clone(),
            profile: self.profile.clone(),
            navigation_timeout: self.navigation_timeout,
            simulator: self.simulator.clone(),
        };
        let task_url = url.clone();
        let task = tokio::spawn(
            async move {
                let result = run.execute(&task_url).await;
                drop(permit);
                result
            }
            .in_current_span(),
        );

        let samples = task
            .await
            .map_err(|e| AnalysisError::Interrupted(e.to_string()))??;

        Ok(AnalysisReport::new(
            url,
            self.profile.description(),
            derive(&samples),
        ))
    }
}

/// Everything one analysis task needs, detached from the [`Analyzer`]
struct Run<L> {
    launcher: Arc<L>,
    profile: DeviceProfile,
    navigation_timeout: Duration,
    simulator: InteractionSimulator,
}

impl<L: SessionLauncher> Run<L> {
    /// Acquire, drive and always release one session
    async fn execute(&self, url: &str) -> Result<Vec<LongTaskSample>, AnalysisError> {
        let start = Instant::now();
        info!("Starting analysis of {}", url);

        let session = self
            .launcher
            .acquire(&self.profile)
            .await
            .map_err(AnalysisError::SessionAcquisition)?;

        let result = self.drive(&session, url).await;
        session::release(session).await;

        match &result {
            Ok(samples) => info!(
                long_tasks = samples.len(),
                duration_ms = start.elapsed().as_millis() as u64,
                "Analysis of {} complete",
                url
            ),
            Err(e) => warn!("Analysis of {} failed: {}", url, e),
        }
        result
    }

    /// Instrument, load, interact and extract, in that order
    async fn drive(
        &self,
        session: &L::Session,
        url: &str,
    ) -> Result<Vec<LongTaskSample>, AnalysisError> {
        collector::install_instrumentation(session).await?;
        session::navigate(session, url, self.navigation_timeout).await?;

        let outcome = self.simulator.simulate(session).await;
        debug!(?outcome, "Simulation outcome");

        collector::extract(session).await
    }
}

/// Trim and check that `raw` is an absolute http(s) URL
///
/// Returns the trimmed input unchanged so the report echoes what was asked.
pub fn validate_target_url(raw: &str) -> Result<String, AnalysisError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AnalysisError::Validation("URL is required".to_string()));
    }

    let parsed = Url::parse(trimmed)
        .map_err(|e| AnalysisError::Validation(format!("Invalid URL '{}': {}", trimmed, e)))?;

    match parsed.scheme() {
        "http" | "https" => Ok(trimmed.to_string()),
        other => Err(AnalysisError::Validation(format!(
            "Unsupported URL scheme '{}': only http and https can be analysed",
            other
        ))),
    }
}
