//! Run a single synthetic analysis from the command line

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use lab_analysis::config::{AnalysisConfig, DevicePreset};
use lab_analysis::reporter::{OutputFormat, Reporter};
use lab_analysis::Analyzer;

#[derive(Parser, Debug)]
#[command(name = "lab-analyze")]
#[command(version, about = "Measure lab INP, TBT and long tasks for a URL in headless Chrome")]
struct Args {
    /// Absolute http(s) URL to analyse
    url: String,

    /// TOML configuration file
    #[arg(short, long, env = "ANALYSIS_CONFIG")]
    config: Option<PathBuf>,

    /// Override the device preset: mobile or desktop
    #[arg(long)]
    device: Option<String>,

    /// Output format: json, json-pretty or console
    #[arg(short, long, default_value = "console")]
    format: OutputFormat,

    /// Write the report to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Fixed RNG seed for the interaction loop
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Logs go to stderr so stdout carries only the report
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lab_analysis=info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = match &args.config {
        Some(path) => AnalysisConfig::from_file(path)?,
        None => AnalysisConfig::default(),
    };

    if let Some(device) = &args.device {
        config.device.preset = match device.to_ascii_lowercase().as_str() {
            "mobile" => DevicePreset::Mobile,
            "desktop" => DevicePreset::Desktop,
            other => anyhow::bail!("Unknown device preset '{}' (expected mobile or desktop)", other),
        };
    }
    if args.seed.is_some() {
        config.analysis.seed = args.seed;
    }

    let analyzer = Analyzer::chromium(&config);
    tracing::info!("Device: {}", analyzer.profile().description());

    let report = analyzer
        .analyze(&args.url)
        .await
        .with_context(|| format!("Analysis of {} failed", args.url))?;

    let reporter = Reporter::new(args.format);
    match &args.output {
        Some(path) => {
            reporter.write_to_file(&report, path)?;
            tracing::info!("Report written to {}", path.display());
        }
        None => reporter.report(&report)?,
    }

    Ok(())
}
