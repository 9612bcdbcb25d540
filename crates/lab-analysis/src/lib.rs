//! Synthetic interaction-latency analysis
//!
//! This crate loads a page in an isolated headless Chrome under a constrained
//! device profile, drives synthetic clicks, typing and scrolling for a fixed
//! budget, and turns the long tasks observed along the way into lab metrics.
//!
//! # Features
//!
//! - **Device emulation**: viewport, user agent, network and CPU throttling
//! - **Long-task collection**: buffered `PerformanceObserver` armed before load
//! - **Interaction simulation**: best-effort, seedable, time-bounded
//! - **Lab metrics**: INP (lab), TBT, JS blocking time, long-task count
//! - **Output formats**: JSON and console reports
//!
//! # Example
//!
//! ```no_run
//! use lab_analysis::{AnalysisConfig, Analyzer, reporter::{OutputFormat, Reporter}};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = AnalysisConfig::from_file("analysis.toml")?;
//! let analyzer = Analyzer::chromium(&config);
//!
//! let report = analyzer.analyze("https://example.com").await?;
//! Reporter::new(OutputFormat::Console).report(&report)?;
//! # Ok(())
//! # }
//! ```

pub mod analyzer;
pub mod collector;
pub mod config;
pub mod error;
pub mod metrics;
pub mod report;
pub mod reporter;
pub mod session;
pub mod simulator;
pub mod throttling;

pub use analyzer::Analyzer;
pub use config::{AnalysisConfig, DeviceProfile};
pub use error::{AnalysisError, SessionError};
pub use metrics::{derive, LongTaskSample, Metric, MetricName, MetricStatus};
pub use report::AnalysisReport;
pub use session::{BrowserSession, ChromiumLauncher, SessionLauncher};
pub use simulator::{InteractionSimulator, SimulationOutcome};
