use std::io::Read;

use anyhow::{Context, Result};
use clap::Parser;
use georisk_models::config::EngineConfig;
use georisk_models::holding::Holding;
use georisk_models::impact::RiskTolerance;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "georisk", about = "Geopolitical Risk Analysis Engine")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/georisk.toml")]
    config: String,

    /// Read a Holding JSON from a file instead of stdin
    #[arg(short, long)]
    input: Option<String>,

    /// Risk tolerance used when synthesizing action probabilities
    #[arg(long, value_enum, default_value = "medium")]
    risk_tolerance: RiskToleranceArg,

    /// Override the configured lookback window, in days
    #[arg(long)]
    lookback_days: Option<u32>,

    /// Pretty-print the output JSON
    #[arg(long)]
    pretty: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum RiskToleranceArg {
    Low,
    Medium,
    High,
}

impl From<RiskToleranceArg> for RiskTolerance {
    fn from(value: RiskToleranceArg) -> Self {
        match value {
            RiskToleranceArg::Low => RiskTolerance::Low,
            RiskToleranceArg::Medium => RiskTolerance::Medium,
            RiskToleranceArg::High => RiskTolerance::High,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config_str = std::fs::read_to_string(&cli.config)
        .with_context(|| format!("Failed to read config: {}", cli.config))?;
    let config: EngineConfig =
        toml::from_str(&config_str).with_context(|| "Failed to parse config")?;

    let holding_json = if let Some(input_path) = &cli.input {
        std::fs::read_to_string(input_path)
            .with_context(|| format!("Failed to read input: {input_path}"))?
    } else {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read from stdin")?;
        buf
    };

    let holding: Holding = serde_json::from_str(&holding_json).context("Failed to parse Holding JSON")?;

    let pipeline = georisk::build_pipeline(&config).context("Failed to build pipeline")?;

    let result = georisk::evaluate(&pipeline, &holding, cli.risk_tolerance.into(), cli.lookback_days)
        .await
        .map_err(|e| anyhow::anyhow!("Pipeline evaluation failed: {e}"))?;

    let output = if cli.pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string(&result)?
    };
    println!("{output}");

    Ok(())
}
