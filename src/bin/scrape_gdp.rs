use anyhow::{Context, Result};
use bth_emissions::{config, gdp, logging};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

/// Poll the statistics bureau for city GDP and write it to CSV.
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    /// YAML file overriding the built-in settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Where to write the CSV
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init();

    let mut cfg = config::load_gdp(args.config.as_deref())?;
    if let Some(output) = args.output {
        cfg.output = output;
    }
    let output = cfg.output.clone();
    let years = cfg.years.clone();

    let client = gdp::GdpClient::new(cfg)?;
    let records = client.scrape(&years);
    gdp::save_csv(&records, &output)
        .with_context(|| format!("saving {}", output.display()))?;

    info!(records = records.len(), "saved data to {}", output.display());
    Ok(())
}
