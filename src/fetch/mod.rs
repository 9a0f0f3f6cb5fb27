// src/fetch/mod.rs

use reqwest::blocking::{Client, Response};
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};

/// Locating the current dataset link on the portal's index page.
pub mod urls;
/// Downloading a ZIP into memory.
pub mod zips;

/// Shared blocking client. Per-request timeouts are set by the callers.
pub fn build_client() -> Result<Client> {
    Client::builder()
        .build()
        .map_err(|source| Error::Transfer {
            url: "<client init>".to_string(),
            source,
        })
}

/// GET `url` and fail on any non-2xx status.
fn get_checked(client: &Client, url: &Url, timeout: Duration) -> reqwest::Result<Response> {
    debug!(%url, ?timeout, "GET");
    client
        .get(url.clone())
        .timeout(timeout)
        .send()?
        .error_for_status()
}
