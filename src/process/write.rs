// src/process/write.rs

use std::{fs, io, path::Path};
use tracing::{info, instrument};

use super::table::EmissionTable;
use crate::error::{Error, Result};

/// Header plus one line per record, no index column.
pub fn write_table<W: io::Write>(table: &EmissionTable, out: W) -> csv::Result<()> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(table.header())?;
    for record in table.records() {
        wtr.write_record(table.row_fields(record))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write `table` to `path`, replacing any existing file.
#[instrument(level = "info", skip(table), fields(path = %path.display(), rows = table.len()))]
pub fn write_csv(table: &EmissionTable, path: &Path) -> Result<usize> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    let file = fs::File::create(path).map_err(|e| Error::io(path, e))?;
    write_table(table, io::BufWriter::new(file)).map_err(|e| Error::io(path, e))?;
    info!("saved filtered data");
    Ok(table.len())
}
