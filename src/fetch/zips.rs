// src/fetch/zips.rs

use reqwest::blocking::Client;
use std::time::{Duration, Instant};
use tracing::{info, instrument};
use url::Url;

use super::get_checked;
use crate::error::{Error, Result};

/// Download the ZIP at `url` and return the whole body in memory.
#[instrument(level = "info", skip(client, timeout), fields(url = %url))]
pub fn download_zip(client: &Client, url: &Url, timeout: Duration) -> Result<Vec<u8>> {
    let start = Instant::now();
    let bytes = get_checked(client, url, timeout)
        .and_then(|resp| resp.bytes())
        .map_err(|source| Error::Transfer {
            url: url.to_string(),
            source,
        })?;
    info!(bytes = bytes.len(), elapsed = ?start.elapsed(), "downloaded");
    Ok(bytes.to_vec())
}
