//! Server configuration from the environment
//!
//! | Variable          | Default                                    |
//! |-------------------|--------------------------------------------|
//! | `PORT`            | 3000                                       |
//! | `DATABASE_URL`    | SQLite file under the platform data dir    |
//! | `STATIC_DIR`      | unset (no frontend served)                 |
//! | `ANALYSIS_CONFIG` | unset (built-in analysis defaults)         |
//!
//! A `.env` file in the working directory is loaded first when present.

use anyhow::{Context, Result};
use lab_analysis::AnalysisConfig;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub database_url: String,
    pub static_dir: Option<PathBuf>,
    pub analysis_config: Option<PathBuf>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let port = match lookup("PORT") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("PORT must be a port number, got '{}'", raw))?,
            None => 3000,
        };

        let database_url = match lookup("DATABASE_URL") {
            Some(url) => url,
            None => default_database_url()?,
        };

        Ok(Self {
            port,
            database_url,
            static_dir: lookup("STATIC_DIR").map(PathBuf::from),
            analysis_config: lookup("ANALYSIS_CONFIG").map(PathBuf::from),
        })
    }

    /// Analysis settings from `ANALYSIS_CONFIG`, or the defaults
    pub fn load_analysis_config(&self) -> Result<AnalysisConfig> {
        match &self.analysis_config {
            Some(path) => AnalysisConfig::from_file(path),
            None => Ok(AnalysisConfig::default()),
        }
    }
}

fn default_database_url() -> Result<String> {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rum-server");
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create data dir {}", data_dir.display()))?;
    Ok(format!("sqlite:{}/rum.db?mode=rwc", data_dir.display()))
}

/// Get platform-specific data directory
mod dirs {
    use std::path::PathBuf;

    pub fn data_dir() -> Option<PathBuf> {
        #[cfg(target_os = "macos")]
        {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join("Library/Application Support"))
        }
        #[cfg(target_os = "linux")]
        {
            std::env::var("XDG_DATA_HOME")
                .ok()
                .map(PathBuf::from)
                .or_else(|| {
                    std::env::var("HOME")
                        .ok()
                        .map(|h| PathBuf::from(h).join(".local/share"))
                })
        }
        #[cfg(target_os = "windows")]
        {
            std::env::var("APPDATA").ok().map(PathBuf::from)
        }
        #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
        {
            None
        }
    }
}
