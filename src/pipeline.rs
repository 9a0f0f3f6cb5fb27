// src/pipeline.rs

use reqwest::blocking::Client;
use std::{path::PathBuf, time::Instant};
use tracing::{info, instrument};
use url::Url;

use crate::config::EmissionsConfig;
use crate::error::Result;
use crate::fetch::{urls, zips};
use crate::process::{self, filter, RegionFilter};

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub dataset_url: Url,
    pub rows_loaded: usize,
    pub rows_written: usize,
    pub output: PathBuf,
}

/// Locate, download, read, filter and write, once.
pub fn run_pipeline(client: &Client, cfg: &EmissionsConfig) -> Result<RunSummary> {
    run_pipeline_for_year(client, cfg, filter::current_year())
}

/// [`run_pipeline`] with the reference year fixed by the caller.
#[instrument(level = "info", skip(client, cfg), fields(output = %cfg.output.display()))]
pub fn run_pipeline_for_year(
    client: &Client,
    cfg: &EmissionsConfig,
    current_year: i32,
) -> Result<RunSummary> {
    let start = Instant::now();

    let dataset_url = urls::resolve_dataset_url(client, cfg)?;
    let bytes = zips::download_zip(client, &dataset_url, cfg.download_timeout())?;
    let table = process::load_zip_table(&bytes, cfg.entry_policy)?;
    drop(bytes);

    let selected = process::filter_table(&table, &RegionFilter::from_config(cfg), current_year);
    let rows_written = process::write_csv(&selected, &cfg.output)?;

    info!(rows_written, elapsed = ?start.elapsed(), "pipeline finished");
    Ok(RunSummary {
        dataset_url,
        rows_loaded: table.len(),
        rows_written,
        output: cfg.output.clone(),
    })
}
