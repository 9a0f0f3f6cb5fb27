// src/process/mod.rs

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::io::{Cursor, Read, Seek};
use tracing::{debug, instrument, warn};
use zip::ZipArchive;

use crate::error::{Error, Result};

pub mod filter;
pub mod table;
pub mod write;

pub use filter::{filter_recent, filter_table, RegionFilter};
pub use table::{Column, ColumnKind, EmissionRecord, EmissionTable, Value};
pub use write::write_csv;

static CSV_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\.csv$").expect("csv regex"));

/// Which `.csv` entry to read when an archive holds several.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntryPolicy {
    /// Lexicographically smallest entry name.
    #[default]
    Alphabetical,
    /// First entry in the central directory. The order is whatever the
    /// archive producer wrote, so it can differ between releases.
    ArchiveOrder,
}

fn is_csv_entry(name: &str) -> bool {
    CSV_SUFFIX.is_match(name) && !name.starts_with("__MACOSX/")
}

/// Name of the `.csv` entry `policy` picks.
pub fn select_csv_entry<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    policy: EntryPolicy,
) -> Result<String> {
    let mut candidates = Vec::new();
    for i in 0..archive.len() {
        let entry = archive.by_index(i)?;
        if entry.is_file() && is_csv_entry(entry.name()) {
            candidates.push(entry.name().to_string());
        }
    }

    let count = candidates.len();
    let chosen = match policy {
        EntryPolicy::ArchiveOrder => candidates.into_iter().next(),
        EntryPolicy::Alphabetical => candidates.into_iter().min(),
    }
    .ok_or_else(|| Error::ArchiveFormat("no .csv entry in archive".to_string()))?;

    if count > 1 {
        warn!(candidates = count, chosen = %chosen, ?policy, "archive holds several CSV files");
    }
    Ok(chosen)
}

/// Open `bytes` as a ZIP and parse the selected CSV entry into a table.
#[instrument(level = "info", skip(bytes), fields(bytes = bytes.len()))]
pub fn load_zip_table(bytes: &[u8], policy: EntryPolicy) -> Result<EmissionTable> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let name = select_csv_entry(&mut archive, policy)?;

    let mut entry = archive.by_name(&name)?;
    let mut buf = Vec::with_capacity(entry.size() as usize);
    entry
        .read_to_end(&mut buf)
        .map_err(|e| Error::ArchiveFormat(format!("reading {}: {}", name, e)))?;
    debug!(entry = %name, size = buf.len(), "extracted CSV");

    let decoded = String::from_utf8_lossy(&buf);
    let text: &str = &decoded;
    EmissionTable::from_csv(text.strip_prefix('\u{feff}').unwrap_or(text))
}
