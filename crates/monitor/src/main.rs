//! Drowsiness Monitor - Main Entry Point

use std::path::PathBuf;

use alerting::AlertManager;
use anyhow::{Context, Result};
use clap::Parser;
use dms::DmsModule;
use monitor::{init_logging, replay, MonitorSettings, ReplayOptions};
use tokio::io::BufReader;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "drowsiness-monitor", version, about = "Replay eye landmark recordings through the drowsiness monitor", long_about = None)]
struct Args {
    /// JSON-lines landmark recording ("-" reads stdin)
    #[arg(short, long, default_value = "-")]
    input: String,

    /// Configuration file (TOML, YAML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Pace ticks by their recorded timestamps
    #[arg(long)]
    realtime: bool,

    /// Print the summary as JSON on stdout
    #[arg(long)]
    json: bool,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.debug)?;

    info!("=== Drowsiness Monitor v{} ===", env!("CARGO_PKG_VERSION"));

    let settings = MonitorSettings::load(args.config.as_deref())?;
    let mut module = DmsModule::new(settings.dms.clone())?;
    let mut alerts = AlertManager::with_log_sink(settings.alert.clone());
    let options = ReplayOptions {
        realtime: args.realtime,
    };

    let summary = if args.input == "-" {
        info!("Reading frames from stdin");
        let reader = BufReader::new(tokio::io::stdin());
        replay(reader, &mut module, &mut alerts, &options).await?
    } else {
        info!("Reading frames from {}", args.input);
        let file = tokio::fs::File::open(&args.input)
            .await
            .with_context(|| format!("failed to open {}", args.input))?;
        replay(BufReader::new(file), &mut module, &mut alerts, &options).await?
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        summary.log();
    }

    Ok(())
}
