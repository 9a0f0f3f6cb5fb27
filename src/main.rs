use bth_emissions::{config, fetch, logging, run_pipeline};
use clap::Parser;
use std::{path::PathBuf, process::ExitCode};
use tracing::{error, info};

/// Download CEADs city CO2 emissions and keep the BTH cities for the last decade.
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    /// YAML file overriding the built-in settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Where to write the filtered CSV
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    logging::init();
    info!("startup");

    let result = config::load_emissions(args.config.as_deref()).and_then(|mut cfg| {
        if let Some(output) = args.output {
            cfg.output = output;
        }
        let client = fetch::build_client()?;
        run_pipeline(&client, &cfg)
    });

    match result {
        Ok(summary) => {
            info!(
                url = %summary.dataset_url,
                rows = summary.rows_written,
                "saved filtered data to {}",
                summary.output.display()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "run failed");
            ExitCode::from(e.exit_code())
        }
    }
}
