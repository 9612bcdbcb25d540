//! Configuration for synthetic page analysis
//!
//! Analyses are configured with an optional TOML file. Every section has
//! defaults, so an empty file (or no file at all) yields a constrained-mobile
//! profile with a 5 second interaction budget.
//!
//! ```toml
//! [analysis]
//! interaction_budget_ms = 5000
//! navigation_timeout_ms = 60000
//! probe_text = "test"
//! max_concurrent = 2
//!
//! [device]
//! preset = "mobile"
//! cpu_slowdown = 6.0
//!
//! [browser]
//! headless = true
//! args = ["--lang=en-US"]
//! ```

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level analysis configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Timing and simulation parameters
    #[serde(default)]
    pub analysis: AnalysisSettings,
    /// Emulated device
    #[serde(default)]
    pub device: DeviceConfig,
    /// Browser launch options
    #[serde(default)]
    pub browser: BrowserSettings,
}

impl AnalysisConfig {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the TOML is malformed,
    /// or a value is out of range.
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string
    ///
    /// ```
    /// use lab_analysis::config::{AnalysisConfig, DevicePreset};
    ///
    /// # fn example() -> anyhow::Result<()> {
    /// let config = AnalysisConfig::from_str(r#"
    ///     [device]
    ///     preset = "desktop"
    /// "#)?;
    /// assert_eq!(config.device.preset, DevicePreset::Desktop);
    /// # Ok(())
    /// # }
    /// ```
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(s).context("Failed to parse TOML configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges that serde cannot express
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.analysis.interaction_budget_ms == 0 {
            anyhow::bail!("analysis.interaction_budget_ms must be greater than 0");
        }
        if self.analysis.navigation_timeout_ms == 0 {
            anyhow::bail!("analysis.navigation_timeout_ms must be greater than 0");
        }
        if self.analysis.max_concurrent == 0 {
            anyhow::bail!("analysis.max_concurrent must be at least 1");
        }
        let profile = self.device.profile();
        if !(profile.cpu_slowdown >= 1.0) {
            anyhow::bail!(
                "device.cpu_slowdown must be >= 1.0 (got {})",
                profile.cpu_slowdown
            );
        }
        if profile.viewport.width == 0 || profile.viewport.height == 0 {
            anyhow::bail!("device viewport must be non-empty");
        }
        Ok(())
    }
}

/// Timing and simulation parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSettings {
    /// Wall-clock budget for the interaction loop (default: 5000)
    #[serde(default = "default_interaction_budget_ms")]
    pub interaction_budget_ms: u64,
    /// Upper bound on page load (default: 60000)
    #[serde(default = "default_navigation_timeout_ms")]
    pub navigation_timeout_ms: u64,
    /// Text typed into every text input (default: "test")
    #[serde(default = "default_probe_text")]
    pub probe_text: String,
    /// Maximum number of analyses running at once (default: 2)
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
    /// Fixed RNG seed for reproducible interaction timing
    #[serde(default)]
    pub seed: Option<u64>,
}

impl AnalysisSettings {
    pub fn interaction_budget(&self) -> Duration {
        Duration::from_millis(self.interaction_budget_ms)
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            interaction_budget_ms: default_interaction_budget_ms(),
            navigation_timeout_ms: default_navigation_timeout_ms(),
            probe_text: default_probe_text(),
            max_concurrent: default_max_concurrent(),
            seed: None,
        }
    }
}

fn default_interaction_budget_ms() -> u64 {
    5_000
}

fn default_navigation_timeout_ms() -> u64 {
    60_000
}

fn default_probe_text() -> String {
    "test".to_string()
}

fn default_max_concurrent() -> usize {
    2
}

/// Browser launch options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserSettings {
    /// Explicit Chrome/Chromium binary; auto-detected when unset
    #[serde(default)]
    pub chrome_executable: Option<PathBuf>,
    /// Run without a visible window (default: true)
    #[serde(default = "default_headless")]
    pub headless: bool,
    /// Extra command-line switches passed to the browser
    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            chrome_executable: None,
            headless: true,
            args: Vec::new(),
        }
    }
}

fn default_headless() -> bool {
    true
}

/// Named device presets
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DevicePreset {
    /// Mid-tier phone on a slow 4G link with a 4x slower CPU
    #[default]
    Mobile,
    /// Desktop Chrome on regular 4G without CPU throttling
    Desktop,
}

/// Device section of the config: a preset plus optional overrides
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceConfig {
    #[serde(default)]
    pub preset: DevicePreset,
    pub name: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub user_agent: Option<String>,
    pub network: Option<NetworkProfile>,
    pub cpu_slowdown: Option<f64>,
}

impl DeviceConfig {
    /// Resolve the preset and apply overrides
    pub fn profile(&self) -> DeviceProfile {
        let mut profile = match self.preset {
            DevicePreset::Mobile => DeviceProfile::mobile(),
            DevicePreset::Desktop => DeviceProfile::desktop(),
        };
        if let Some(name) = &self.name {
            profile.name = name.clone();
        }
        if let Some(width) = self.width {
            profile.viewport.width = width;
        }
        if let Some(height) = self.height {
            profile.viewport.height = height;
        }
        if let Some(user_agent) = &self.user_agent {
            profile.user_agent = user_agent.clone();
        }
        if let Some(network) = self.network {
            profile.network = network;
        }
        if let Some(cpu_slowdown) = self.cpu_slowdown {
            profile.cpu_slowdown = cpu_slowdown;
        }
        profile
    }
}

/// Emulated viewport
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub device_scale_factor: f64,
    pub mobile: bool,
}

/// A fixed device configuration shared by every analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceProfile {
    /// Short device name, e.g. "Moto G Power"
    pub name: String,
    pub viewport: Viewport,
    pub user_agent: String,
    pub network: NetworkProfile,
    /// CPU slowdown multiplier (1.0 = no slowdown, 4.0 = 4x slower)
    pub cpu_slowdown: f64,
}

impl DeviceProfile {
    /// Constrained mobile device
    pub fn mobile() -> Self {
        Self {
            name: "Moto G Power".to_string(),
            viewport: Viewport {
                width: 412,
                height: 823,
                device_scale_factor: 1.75,
                mobile: true,
            },
            user_agent: "Mozilla/5.0 (Linux; Android 11; moto g power (2022)) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/119.0.0.0 Mobile Safari/537.36"
                .to_string(),
            network: NetworkProfile::Slow4G,
            cpu_slowdown: 4.0,
        }
    }

    /// Unthrottled-CPU desktop
    pub fn desktop() -> Self {
        Self {
            name: "Desktop".to_string(),
            viewport: Viewport {
                width: 1920,
                height: 1080,
                device_scale_factor: 1.0,
                mobile: false,
            },
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36"
                .to_string(),
            network: NetworkProfile::Regular4G,
            cpu_slowdown: 1.0,
        }
    }

    /// Human-readable descriptor used in reports
    ///
    /// ```
    /// use lab_analysis::config::DeviceProfile;
    ///
    /// assert_eq!(
    ///     DeviceProfile::desktop().description(),
    ///     "Desktop (Chrome, 4G, 1920x1080)"
    /// );
    /// ```
    pub fn description(&self) -> String {
        let cpu = if self.cpu_slowdown > 1.0 {
            format!("{}x CPU, ", self.cpu_slowdown)
        } else {
            String::new()
        };
        format!(
            "{} (Chrome, {}, {}{}x{})",
            self.name,
            self.network.label(),
            cpu,
            self.viewport.width,
            self.viewport.height
        )
    }
}

/// Network throttling profiles
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub enum NetworkProfile {
    /// Fast 3G network (1.6 Mbps down, 750 Kbps up, 562.5ms RTT)
    Fast3G,
    /// Slow 4G network (1.6 Mbps down, 750 Kbps up, 150ms RTT)
    Slow4G,
    /// Regular 4G network (4 Mbps down, 3 Mbps up, 20ms RTT)
    Regular4G,
    /// Offline mode (no network)
    Offline,
    /// No throttling
    #[default]
    None,
    /// Explicit latency and throughput caps
    Custom {
        latency_ms: u64,
        download_bps: u64,
        upload_bps: u64,
    },
}

impl NetworkProfile {
    /// Get the download speed in bytes per second
    pub fn download_bps(&self) -> Option<u64> {
        match self {
            NetworkProfile::Fast3G | NetworkProfile::Slow4G => Some(1_600_000 / 8),
            NetworkProfile::Regular4G => Some(4_000_000 / 8),
            NetworkProfile::Offline => Some(0),
            NetworkProfile::None => None,
            NetworkProfile::Custom { download_bps, .. } => Some(*download_bps),
        }
    }

    /// Get the upload speed in bytes per second
    pub fn upload_bps(&self) -> Option<u64> {
        match self {
            NetworkProfile::Fast3G | NetworkProfile::Slow4G => Some(750_000 / 8),
            NetworkProfile::Regular4G => Some(3_000_000 / 8),
            NetworkProfile::Offline => Some(0),
            NetworkProfile::None => None,
            NetworkProfile::Custom { upload_bps, .. } => Some(*upload_bps),
        }
    }

    /// Get the round-trip time in milliseconds
    pub fn rtt_ms(&self) -> Option<u64> {
        match self {
            NetworkProfile::Fast3G => Some(562),
            NetworkProfile::Slow4G => Some(150),
            NetworkProfile::Regular4G => Some(20),
            NetworkProfile::Offline => Some(0),
            NetworkProfile::None => None,
            NetworkProfile::Custom { latency_ms, .. } => Some(*latency_ms),
        }
    }

    /// Short label used in device descriptors
    pub fn label(&self) -> &'static str {
        match self {
            NetworkProfile::Fast3G => "Fast 3G",
            NetworkProfile::Slow4G => "Slow 4G",
            NetworkProfile::Regular4G => "4G",
            NetworkProfile::Offline => "Offline",
            NetworkProfile::None => "No throttling",
            NetworkProfile::Custom { .. } => "Custom network",
        }
    }
}
