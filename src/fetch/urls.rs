// src/fetch/urls.rs

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::blocking::Client;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{info, instrument, warn};
use url::Url;

use super::get_checked;
use crate::config::EmissionsConfig;
use crate::error::{Error, Result};

static ANCHOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("anchor selector should parse"));
static BASE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("base[href]").expect("base selector should parse"));
static ZIP_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\.zip$").expect("zip regex"));

/// First anchor (document order) whose resolved path contains `marker` and
/// ends in `.zip`. Relative hrefs resolve against `<base href>` when the
/// page has one, else against `page_url`.
pub fn find_dataset_link(html: &str, page_url: &Url, marker: &str) -> Option<Url> {
    let doc = Html::parse_document(html);
    let base = doc
        .select(&BASE)
        .filter_map(|e| e.value().attr("href"))
        .find_map(|href| page_url.join(href.trim()).ok())
        .unwrap_or_else(|| page_url.clone());

    doc.select(&ANCHOR)
        .filter_map(|e| e.value().attr("href"))
        .filter_map(|href| base.join(href.trim()).ok())
        .find(|u| u.path().contains(marker) && ZIP_SUFFIX.is_match(u.path()))
}

/// Fetch the index page and scan it for the dataset link.
#[instrument(level = "info", skip(client, timeout))]
pub fn locate_dataset(
    client: &Client,
    index_url: &str,
    marker: &str,
    timeout: Duration,
) -> Result<Url> {
    let not_found = |reason: String| Error::NotFound {
        page: index_url.to_string(),
        reason,
    };

    let page = Url::parse(index_url).map_err(|e| not_found(e.to_string()))?;
    let resp = get_checked(client, &page, timeout).map_err(|e| not_found(e.to_string()))?;
    // redirects move the base for relative links
    let final_url = resp.url().clone();
    let html = resp.text().map_err(|e| not_found(e.to_string()))?;

    find_dataset_link(&html, &final_url, marker)
        .ok_or_else(|| not_found(format!("no `.zip` link containing `{}`", marker)))
}

/// Locate the dataset, or fall back to the configured last-known URL.
pub fn resolve_dataset_url(client: &Client, cfg: &EmissionsConfig) -> Result<Url> {
    match locate_dataset(client, &cfg.index_url, &cfg.link_marker, cfg.index_timeout()) {
        Ok(url) => {
            info!(%url, "located dataset");
            Ok(url)
        }
        Err(e) => {
            warn!(error = %e, fallback = %cfg.fallback_url, "dataset lookup failed, using fallback");
            Url::parse(&cfg.fallback_url)
                .map_err(|e| Error::Config(format!("fallback_url `{}`: {}", cfg.fallback_url, e)))
        }
    }
}
